//! Frame list expansion
//!
//! Walks a status's frame list depth-first, left to right. Sequence
//! references are spliced in place, preset names become slot maps and every
//! slot value is resolved through the shorthand tables.
//!
//! # Slot Layering
//!
//! Each frame starts from the built-in face and applies, in order:
//!
//! ```text
//! built-in default -> status defaults -> preset -> inline slots
//! ```
//!
//! A value that is not a shorthand is used literally when it has the right
//! length for its slot (one character, four for corners, nine for
//! substrate). Anything else is a configuration error.

use std::collections::BTreeMap;

use super::definition::{
    AnimationDefinition, EyeShorthand, FrameEntry, SequenceRef, ShorthandTables, SlotMap,
    StatusDefinition,
};
use super::frame::{EyePosition, RenderedFrame, INTERIOR_WIDTH};
use crate::error::AnimationError;

/// Largest `repeat` accepted on a sequence reference
pub const MAX_REPEAT: u32 = 1_000;

/// Largest number of frames one status may expand to
///
/// Nested repeats multiply, so the per-reference limit alone does not bound
/// the total.
pub const MAX_FRAMES: usize = 10_000;

/// Expands one status's frame list
pub(crate) struct Expander<'a> {
    definition: &'a AnimationDefinition,
    status_name: &'a str,
    status: &'a StatusDefinition,
    /// Sequence names currently being expanded, outermost first
    stack: Vec<&'a str>,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(
        definition: &'a AnimationDefinition,
        status_name: &'a str,
        status: &'a StatusDefinition,
    ) -> Self {
        Self {
            definition,
            status_name,
            status,
            stack: Vec::new(),
        }
    }

    /// Expand the status's own frame list
    pub(crate) fn expand(mut self) -> Result<Vec<RenderedFrame>, AnimationError> {
        let mut out = Vec::new();
        let status = self.status;
        self.expand_entries(&status.frames, &mut out)?;
        if out.is_empty() {
            return Err(AnimationError::EmptyAnimation(self.status_name.to_string()));
        }
        Ok(out)
    }

    /// Expand an arbitrary entry list in this status's context
    pub(crate) fn expand_list(
        mut self,
        entries: &'a [FrameEntry],
    ) -> Result<Vec<RenderedFrame>, AnimationError> {
        let mut out = Vec::new();
        self.expand_entries(entries, &mut out)?;
        Ok(out)
    }

    fn expand_entries(
        &mut self,
        entries: &'a [FrameEntry],
        out: &mut Vec<RenderedFrame>,
    ) -> Result<(), AnimationError> {
        for entry in entries {
            if out.len() >= MAX_FRAMES {
                return Err(AnimationError::AnimationTooLong {
                    status: self.status_name.to_string(),
                    max: MAX_FRAMES,
                });
            }
            match entry {
                FrameEntry::Preset(name) => {
                    let preset = self.preset(name)?;
                    out.push(self.resolve(Some(preset), &SlotMap::default())?);
                }
                FrameEntry::Sequence(reference) => self.expand_sequence(reference, out)?,
                FrameEntry::Inline(slots) => {
                    let preset = match &slots.preset {
                        Some(name) => Some(self.preset(name)?),
                        None => None,
                    };
                    out.push(self.resolve(preset, slots)?);
                }
            }
        }
        Ok(())
    }

    fn expand_sequence(
        &mut self,
        reference: &'a SequenceRef,
        out: &mut Vec<RenderedFrame>,
    ) -> Result<(), AnimationError> {
        let name = reference.sequence.as_str();

        if self.stack.contains(&name) {
            let mut chain: Vec<String> = self.stack.iter().map(ToString::to_string).collect();
            chain.push(name.to_string());
            return Err(AnimationError::CyclicSequence {
                status: self.status_name.to_string(),
                chain,
            });
        }
        if reference.repeat == 0 {
            return Err(AnimationError::ZeroRepeat {
                status: self.status_name.to_string(),
                name: name.to_string(),
            });
        }
        if reference.repeat > MAX_REPEAT {
            return Err(AnimationError::RepeatTooLarge {
                status: self.status_name.to_string(),
                name: name.to_string(),
                repeat: reference.repeat,
                max: MAX_REPEAT,
            });
        }

        let entries = self
            .status
            .sequences
            .get(name)
            .or_else(|| self.definition.sequences.get(name))
            .ok_or_else(|| AnimationError::UnknownSequence {
                status: self.status_name.to_string(),
                name: name.to_string(),
            })?;

        self.stack.push(name);
        for _ in 0..reference.repeat {
            self.expand_entries(entries, out)?;
        }
        self.stack.pop();
        Ok(())
    }

    fn preset(&self, name: &str) -> Result<&'a SlotMap, AnimationError> {
        let preset = self
            .status
            .presets
            .get(name)
            .or_else(|| self.definition.presets.get(name))
            .ok_or_else(|| AnimationError::UnknownPreset {
                status: self.status_name.to_string(),
                name: name.to_string(),
            })?;
        if preset.preset.is_some() {
            return Err(AnimationError::NestedPreset(name.to_string()));
        }
        Ok(preset)
    }

    /// Resolve one frame from its preset and inline slots
    fn resolve(
        &self,
        preset: Option<&SlotMap>,
        inline: &SlotMap,
    ) -> Result<RenderedFrame, AnimationError> {
        let mut frame = RenderedFrame::default();
        self.apply(&mut frame, &self.status.defaults())?;
        if let Some(preset) = preset {
            self.apply(&mut frame, preset)?;
        }
        self.apply(&mut frame, inline)?;
        Ok(frame)
    }

    fn apply(&self, frame: &mut RenderedFrame, slots: &SlotMap) -> Result<(), AnimationError> {
        if let Some(value) = &slots.eyes {
            let (glyph, position) = self.resolve_eyes(value)?;
            frame.eyes = glyph;
            frame.eye_position = position;
        }
        if let Some(value) = &slots.mouth {
            frame.mouth = self.resolve_glyph::<1>("mouth", value, |t| &t.mouth)?[0];
        }
        if let Some(value) = &slots.border {
            frame.border = self.resolve_glyph::<1>("border", value, |t| &t.border)?[0];
        }
        if let Some(value) = &slots.edge {
            frame.edge = self.resolve_glyph::<1>("edge", value, |t| &t.edge)?[0];
        }
        if let Some(value) = &slots.corners {
            frame.corners = self.resolve_glyph::<4>("corners", value, |t| &t.corners)?;
        }
        if let Some(value) = &slots.substrate {
            frame.substrate =
                self.resolve_glyph::<INTERIOR_WIDTH>("substrate", value, |t| &t.substrate)?;
        }
        Ok(())
    }

    fn resolve_eyes(&self, value: &str) -> Result<(char, EyePosition), AnimationError> {
        let shorthand = self
            .status
            .shorthands
            .eyes
            .get(value)
            .or_else(|| self.definition.shorthands.eyes.get(value));

        match shorthand {
            Some(shorthand) => eye_shorthand(value, shorthand),
            None => exact_chars::<1>(value)
                .map(|[c]| (c, EyePosition::CENTERED))
                .ok_or_else(|| self.unknown("eyes", value)),
        }
    }

    fn resolve_glyph<const N: usize>(
        &self,
        slot: &'static str,
        value: &str,
        table: impl Fn(&ShorthandTables) -> &BTreeMap<String, String>,
    ) -> Result<[char; N], AnimationError> {
        let shorthand = table(&self.status.shorthands)
            .get(value)
            .or_else(|| table(&self.definition.shorthands).get(value));

        match shorthand {
            Some(glyphs) => exact_chars::<N>(glyphs).ok_or_else(|| {
                AnimationError::InvalidShorthand {
                    slot,
                    name: value.to_string(),
                    reason: format!("expected {N} characters, got {glyphs:?}"),
                }
            }),
            None => exact_chars::<N>(value).ok_or_else(|| self.unknown(slot, value)),
        }
    }

    fn unknown(&self, slot: &'static str, value: &str) -> AnimationError {
        AnimationError::UnknownShorthand {
            status: self.status_name.to_string(),
            slot,
            value: value.to_string(),
        }
    }
}

fn eye_shorthand(
    name: &str,
    shorthand: &EyeShorthand,
) -> Result<(char, EyePosition), AnimationError> {
    let (glyph, position) = match shorthand {
        EyeShorthand::Glyph(glyph) => (glyph, EyePosition::CENTERED),
        EyeShorthand::Placed { glyph, position } => {
            let [left, gap, right] = *position;
            (glyph, EyePosition::new(left, gap, right))
        }
    };

    let invalid = |reason: String| AnimationError::InvalidShorthand {
        slot: "eyes",
        name: name.to_string(),
        reason,
    };
    if !position.fits() {
        return Err(invalid(format!(
            "position {:?} does not fill {INTERIOR_WIDTH} cells",
            [position.left, position.gap, position.right]
        )));
    }
    let [c] = exact_chars::<1>(glyph)
        .ok_or_else(|| invalid(format!("expected 1 character, got {glyph:?}")))?;
    Ok((c, position))
}

/// Check every shorthand in a table set has the right shape for its slot
pub(crate) fn validate_shorthands(tables: &ShorthandTables) -> Result<(), AnimationError> {
    for (name, shorthand) in &tables.eyes {
        eye_shorthand(name, shorthand)?;
    }
    check_table::<1>("mouth", &tables.mouth)?;
    check_table::<1>("border", &tables.border)?;
    check_table::<1>("edge", &tables.edge)?;
    check_table::<4>("corners", &tables.corners)?;
    check_table::<INTERIOR_WIDTH>("substrate", &tables.substrate)
}

fn check_table<const N: usize>(
    slot: &'static str,
    table: &BTreeMap<String, String>,
) -> Result<(), AnimationError> {
    for (name, glyphs) in table {
        if exact_chars::<N>(glyphs).is_none() {
            return Err(AnimationError::InvalidShorthand {
                slot,
                name: name.clone(),
                reason: format!("expected {N} characters, got {glyphs:?}"),
            });
        }
    }
    Ok(())
}

/// Split a string into exactly `N` characters
fn exact_chars<const N: usize>(s: &str) -> Option<[char; N]> {
    let mut out = [' '; N];
    let mut chars = s.chars();
    for slot in &mut out {
        *slot = chars.next()?;
    }
    chars.next().is_none().then_some(out)
}
