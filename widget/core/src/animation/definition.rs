//! Declarative animation definitions as loaded from TOML
//!
//! ```toml
//! default_status = "idle"
//!
//! [shorthands.eyes]
//! normal = "o"
//! looking_l = { glyph = "o", position = [2, 1, 4] }
//!
//! [presets]
//! rest = { eyes = "normal", mouth = "neutral" }
//!
//! [sequences]
//! blink = [{ eyes = "closed" }, "rest"]
//!
//! [status.idle]
//! border = "-"
//! frames = ["rest", { sequence = "blink", repeat = 2 }]
//! ```
//!
//! A frame entry is one of:
//! - a bare string naming a preset
//! - `{ sequence = "name", repeat = n }`, spliced in place
//! - an inline slot map, optionally based on a preset

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level animation definition file
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationDefinition {
    /// Status used for unknown status names
    #[serde(default = "default_status")]
    pub default_status: String,

    /// Global shorthand tables
    #[serde(default)]
    pub shorthands: ShorthandTables,

    /// Global presets
    #[serde(default)]
    pub presets: BTreeMap<String, SlotMap>,

    /// Global sequences
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<FrameEntry>>,

    /// Per-status definitions
    #[serde(default)]
    pub status: BTreeMap<String, StatusDefinition>,
}

fn default_status() -> String {
    "idle".to_string()
}

/// Shorthand name to glyph tables, one per slot
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShorthandTables {
    /// Eye glyphs, optionally with placement
    #[serde(default)]
    pub eyes: BTreeMap<String, EyeShorthand>,
    /// Mouth glyphs
    #[serde(default)]
    pub mouth: BTreeMap<String, String>,
    /// Horizontal border glyphs
    #[serde(default)]
    pub border: BTreeMap<String, String>,
    /// Vertical edge glyphs
    #[serde(default)]
    pub edge: BTreeMap<String, String>,
    /// Corner sets as four characters: top-left, top-right, bottom-left, bottom-right
    #[serde(default)]
    pub corners: BTreeMap<String, String>,
    /// Nine-character substrate rows
    #[serde(default)]
    pub substrate: BTreeMap<String, String>,
}

/// An eye shorthand: a bare glyph or a glyph with (left, gap, right) padding
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EyeShorthand {
    /// Glyph at the centred position
    Glyph(String),
    /// Glyph with explicit placement
    Placed {
        /// Eye glyph
        glyph: String,
        /// Padding left of, between and right of the two eyes
        position: [u8; 3],
    },
}

/// Partial assignment of face slots
///
/// Values resolve through the shorthand tables, falling back to the literal
/// glyph when the value has the right length for its slot.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotMap {
    /// Preset to start from (inline frames only)
    pub preset: Option<String>,
    /// Eyes slot
    pub eyes: Option<String>,
    /// Mouth slot
    pub mouth: Option<String>,
    /// Border slot
    pub border: Option<String>,
    /// Vertical edge slot
    pub edge: Option<String>,
    /// Corners slot
    pub corners: Option<String>,
    /// Substrate slot
    pub substrate: Option<String>,
}

/// Reference to a named sequence
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceRef {
    /// Sequence name
    pub sequence: String,
    /// How many times to splice it
    #[serde(default = "one")]
    pub repeat: u32,
}

fn one() -> u32 {
    1
}

/// One entry in a frame list
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FrameEntry {
    /// Bare preset name
    Preset(String),
    /// Sequence splice
    Sequence(SequenceRef),
    /// Inline slot map
    Inline(SlotMap),
}

/// Animation for one status
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusDefinition {
    /// Ordered frame list
    #[serde(default)]
    pub frames: Vec<FrameEntry>,

    /// Default eyes for every frame of this status
    pub eyes: Option<String>,
    /// Default mouth for every frame of this status
    pub mouth: Option<String>,
    /// Default border for every frame of this status
    pub border: Option<String>,
    /// Default vertical edge for every frame of this status
    pub edge: Option<String>,
    /// Default corners for every frame of this status
    pub corners: Option<String>,
    /// Default substrate for every frame of this status
    pub substrate: Option<String>,

    /// Status-local shorthands, consulted before the global tables
    #[serde(default)]
    pub shorthands: ShorthandTables,
    /// Status-local presets, consulted before the global presets
    #[serde(default)]
    pub presets: BTreeMap<String, SlotMap>,
    /// Status-local sequences, consulted before the global sequences
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<FrameEntry>>,
}

impl StatusDefinition {
    /// Status-level slot defaults as a slot map
    #[must_use]
    pub fn defaults(&self) -> SlotMap {
        SlotMap {
            preset: None,
            eyes: self.eyes.clone(),
            mouth: self.mouth.clone(),
            border: self.border.clone(),
            edge: self.edge.clone(),
            corners: self.corners.clone(),
            substrate: self.substrate.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Parsing Tests
    // =========================================================================

    #[test]
    fn test_frame_entry_variants() {
        let toml_content = r#"
[status.idle]
frames = [
    "rest",
    { sequence = "blink", repeat = 3 },
    { sequence = "blink" },
    { preset = "rest", eyes = "O" },
    { mouth = "u" },
]
"#;
        let def: AnimationDefinition = toml::from_str(toml_content).unwrap();
        let frames = &def.status["idle"].frames;
        assert_eq!(frames.len(), 5);
        assert!(matches!(&frames[0], FrameEntry::Preset(p) if p == "rest"));
        assert!(matches!(&frames[1], FrameEntry::Sequence(s) if s.sequence == "blink" && s.repeat == 3));
        assert!(matches!(&frames[2], FrameEntry::Sequence(s) if s.repeat == 1));
        assert!(matches!(&frames[3], FrameEntry::Inline(m) if m.preset.as_deref() == Some("rest")));
        assert!(matches!(&frames[4], FrameEntry::Inline(m) if m.mouth.as_deref() == Some("u")));
    }

    #[test]
    fn test_default_status_defaults_to_idle() {
        let def: AnimationDefinition = toml::from_str("").unwrap();
        assert_eq!(def.default_status, "idle");
        assert!(def.status.is_empty());
    }

    #[test]
    fn test_eye_shorthand_forms() {
        let toml_content = r#"
[shorthands.eyes]
normal = "o"
looking_l = { glyph = "o", position = [2, 1, 4] }
"#;
        let def: AnimationDefinition = toml::from_str(toml_content).unwrap();
        assert!(matches!(&def.shorthands.eyes["normal"], EyeShorthand::Glyph(g) if g == "o"));
        assert!(matches!(
            &def.shorthands.eyes["looking_l"],
            EyeShorthand::Placed { position: [2, 1, 4], .. }
        ));
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let toml_content = r#"
[status.idle]
frames = [{ nose = "v" }]
"#;
        assert!(toml::from_str::<AnimationDefinition>(toml_content).is_err());
    }

    #[test]
    fn test_status_defaults() {
        let toml_content = r#"
[status.thinking]
border = "~"
substrate = " * . * . "
"#;
        let def: AnimationDefinition = toml::from_str(toml_content).unwrap();
        let defaults = def.status["thinking"].defaults();
        assert_eq!(defaults.border.as_deref(), Some("~"));
        assert_eq!(defaults.substrate.as_deref(), Some(" * . * . "));
        assert!(defaults.eyes.is_none());
    }
}
