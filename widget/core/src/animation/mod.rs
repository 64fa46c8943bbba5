//! Animation Library
//!
//! Declarative per-status face animations, expanded once and memoized.
//!
//! # Architecture
//!
//! ```text
//!   defaults.toml / user file
//!            │
//!            ▼
//!   AnimationDefinition ──load()──► every status expanded once to validate
//!            │
//!            ▼
//!   frames_for(status)
//!     ├─ read lock: cached? ──► Arc<[RenderedFrame]>
//!     └─ write lock: re-check, expand, insert
//! ```
//!
//! Definitions are fully validated when the library is built. Unknown
//! sequences, presets or shorthands, cycles and empty statuses are
//! reported before any frame is rendered. The cache is filled lazily per
//! status, so the first lookup for a status pays for its expansion and later
//! lookups are a map read.
//!
//! Unknown statuses resolve to the definition's default status.

mod definition;
mod expand;
mod frame;

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

pub use definition::{
    AnimationDefinition, EyeShorthand, FrameEntry, SequenceRef, ShorthandTables, SlotMap,
    StatusDefinition,
};
pub use expand::{MAX_FRAMES, MAX_REPEAT};
pub use frame::{EyePosition, RenderedFrame, FACE_HEIGHT, FACE_WIDTH, INTERIOR_WIDTH};

use crate::error::AnimationError;
use expand::{validate_shorthands, Expander};

/// Animation definitions shipped with the crate
pub const BUILTIN_ANIMATIONS: &str = include_str!("defaults.toml");

/// Snapshot of the expansion cache
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of statuses with a cached expansion
    pub cached_states: usize,
    /// Total frames across all cached statuses
    pub total_frames: usize,
    /// Number of expansions performed since the library was built
    pub builds: usize,
    /// Frame count per cached status
    pub states: Vec<(String, usize)>,
}

/// Per-status animation frames with a build-once cache
pub struct AnimationLibrary {
    definition: AnimationDefinition,
    cache: RwLock<HashMap<String, Arc<[RenderedFrame]>>>,
    builds: AtomicUsize,
}

impl std::fmt::Debug for AnimationLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationLibrary")
            .field("default_status", &self.definition.default_status)
            .field("statuses", &self.definition.status.len())
            .field("cached", &self.cache.read().len())
            .finish_non_exhaustive()
    }
}

impl AnimationLibrary {
    /// Build a library from a parsed definition
    ///
    /// # Errors
    ///
    /// Returns an error if the default status is missing, a shorthand has
    /// the wrong shape for its slot, or any status or sequence fails to
    /// expand.
    pub fn load(definition: AnimationDefinition) -> Result<Self, AnimationError> {
        let default = definition
            .status
            .get(&definition.default_status)
            .ok_or_else(|| AnimationError::MissingDefaultStatus(definition.default_status.clone()))?;

        validate_shorthands(&definition.shorthands)?;
        for status in definition.status.values() {
            validate_shorthands(&status.shorthands)?;
        }

        for (name, status) in &definition.status {
            Expander::new(&definition, name, status).expand()?;
        }

        // Global presets and sequences not reached from any status are still
        // checked, in the default status's context.
        let default_name = definition.default_status.as_str();
        for preset in definition.presets.keys() {
            let entry = [FrameEntry::Preset(preset.clone())];
            Expander::new(&definition, default_name, default).expand_list(&entry)?;
        }
        for sequence in definition.sequences.keys() {
            let entry = [FrameEntry::Sequence(SequenceRef {
                sequence: sequence.clone(),
                repeat: 1,
            })];
            Expander::new(&definition, default_name, default).expand_list(&entry)?;
        }

        tracing::debug!(
            statuses = definition.status.len(),
            presets = definition.presets.len(),
            sequences = definition.sequences.len(),
            "Animation definitions validated"
        );

        Ok(Self {
            definition,
            cache: RwLock::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        })
    }

    /// Parse and build a library from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the definition is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, AnimationError> {
        Self::load(toml::from_str(content)?)
    }

    /// Read, parse and build a library from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn from_path(path: &Path) -> Result<Self, AnimationError> {
        let content = std::fs::read_to_string(path).map_err(|e| AnimationError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let library = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded animation definitions");
        Ok(library)
    }

    /// The built-in animation set
    ///
    /// # Errors
    ///
    /// Only fails if the bundled definitions are broken.
    pub fn builtin() -> Result<Self, AnimationError> {
        Self::from_toml_str(BUILTIN_ANIMATIONS)
    }

    /// Status used when an unknown status is requested
    #[must_use]
    pub fn default_status(&self) -> &str {
        &self.definition.default_status
    }

    /// Whether a status has its own definition
    #[must_use]
    pub fn contains(&self, status: &str) -> bool {
        self.definition.status.contains_key(status)
    }

    /// Defined status names in sorted order
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.definition.status.keys().map(String::as_str)
    }

    /// Name the cache uses for a requested status
    #[must_use]
    pub fn resolve_status<'s>(&'s self, status: &'s str) -> &'s str {
        if self.contains(status) {
            status
        } else {
            self.default_status()
        }
    }

    /// Expanded frames for a status
    ///
    /// The first call for a status expands and caches it; later calls
    /// return the cached list. Unknown statuses return the default status's
    /// frames. Never fails.
    #[must_use]
    pub fn frames_for(&self, status: &str) -> Arc<[RenderedFrame]> {
        let key = self.resolve_status(status);

        if let Some(frames) = self.cache.read().get(key) {
            return Arc::clone(frames);
        }

        let mut cache = self.cache.write();
        if let Some(frames) = cache.get(key) {
            return Arc::clone(frames);
        }

        let frames = self.build(key);
        cache.insert(key.to_string(), Arc::clone(&frames));
        frames
    }

    fn build(&self, key: &str) -> Arc<[RenderedFrame]> {
        self.builds.fetch_add(1, Ordering::Relaxed);

        let expanded = self
            .definition
            .status
            .get(key)
            .ok_or_else(|| AnimationError::MissingDefaultStatus(key.to_string()))
            .and_then(|status| Expander::new(&self.definition, key, status).expand());

        match expanded {
            Ok(frames) => {
                tracing::debug!(status = key, frames = frames.len(), "Expanded animation");
                Arc::from(frames)
            }
            Err(e) => {
                // Validated in load(); only reachable if that invariant breaks.
                tracing::error!(status = key, error = %e, "Animation expansion failed");
                Arc::from(vec![RenderedFrame::default()])
            }
        }
    }

    /// Number of expansions performed so far
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Expand every defined status now
    ///
    /// Returns the number of statuses cached.
    pub fn prewarm(&self) -> usize {
        for status in self.definition.status.keys() {
            let _ = self.frames_for(status);
        }
        let cached = self.cache.read().len();
        tracing::debug!(cached, "Animation cache prewarmed");
        cached
    }

    /// Drop every cached expansion
    ///
    /// Later lookups expand again. Returns the number of statuses dropped.
    pub fn invalidate(&self) -> usize {
        let mut cache = self.cache.write();
        let dropped = cache.len();
        cache.clear();
        tracing::debug!(dropped, "Animation cache invalidated");
        dropped
    }

    /// Current cache contents
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read();
        let mut states: Vec<(String, usize)> =
            cache.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        states.sort();
        CacheStats {
            cached_states: cache.len(),
            total_frames: states.iter().map(|(_, n)| n).sum(),
            builds: self.build_count(),
            states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SMALL: &str = r#"
[presets]
rest = { eyes = "o", mouth = "~" }

[status.idle]
frames = ["rest", { eyes = "-" }]

[status.thinking]
border = "~"
frames = [{ eyes = "O" }]
"#;

    // =========================================================================
    // Cache Tests
    // =========================================================================

    #[test]
    fn test_frames_for_is_memoized() {
        let library = AnimationLibrary::from_toml_str(SMALL).unwrap();
        assert_eq!(library.build_count(), 0);

        let first = library.frames_for("idle");
        assert_eq!(library.build_count(), 1);

        let second = library.frames_for("idle");
        assert_eq!(library.build_count(), 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_status_falls_back_to_default() {
        let library = AnimationLibrary::from_toml_str(SMALL).unwrap();
        assert_eq!(library.frames_for("dancing"), library.frames_for("idle"));
        // Both lookups share the default's cache entry
        assert_eq!(library.build_count(), 1);
    }

    #[test]
    fn test_prewarm_and_stats() {
        let library = AnimationLibrary::from_toml_str(SMALL).unwrap();
        assert_eq!(library.prewarm(), 2);
        let stats = library.cache_stats();
        assert_eq!(stats.cached_states, 2);
        assert_eq!(stats.total_frames, 3);
        assert_eq!(stats.builds, 2);
        assert_eq!(
            stats.states,
            vec![("idle".to_string(), 2), ("thinking".to_string(), 1)]
        );
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let library = Arc::new(AnimationLibrary::from_toml_str(SMALL).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let library = Arc::clone(&library);
                std::thread::spawn(move || library.frames_for("thinking").len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(library.build_count(), 1);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let library = AnimationLibrary::from_toml_str(SMALL).unwrap();
        let before = library.frames_for("idle");
        library.frames_for("thinking");

        assert_eq!(library.invalidate(), 2);
        assert_eq!(library.cache_stats().cached_states, 0);

        let after = library.frames_for("idle");
        assert_eq!(library.build_count(), 3);
        assert_eq!(before, after);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    // =========================================================================
    // Load Validation Tests
    // =========================================================================

    #[test]
    fn test_missing_default_status() {
        let result = AnimationLibrary::from_toml_str("[status.thinking]\nframes = [{ eyes = \"O\" }]");
        assert!(matches!(result, Err(AnimationError::MissingDefaultStatus(s)) if s == "idle"));
    }

    #[test]
    fn test_error_in_non_default_status_fails_load() {
        let content = r#"
[status.idle]
frames = [{ eyes = "o" }]

[status.broken]
frames = [{ sequence = "nowhere" }]
"#;
        assert!(matches!(
            AnimationLibrary::from_toml_str(content),
            Err(AnimationError::UnknownSequence { status, .. }) if status == "broken"
        ));
    }

    #[test]
    fn test_unreferenced_broken_sequence_fails_load() {
        let content = r#"
[sequences]
orphan = ["missing_preset"]

[status.idle]
frames = [{ eyes = "o" }]
"#;
        assert!(matches!(
            AnimationLibrary::from_toml_str(content),
            Err(AnimationError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_runaway_repeats_fail_load() {
        let content = r#"
[sequences]
a = [{ mouth = "x" }]
b = [{ sequence = "a", repeat = 1000 }]
c = [{ sequence = "b", repeat = 1000 }]

[status.idle]
frames = [{ sequence = "c", repeat = 5 }]
"#;
        assert!(matches!(
            AnimationLibrary::from_toml_str(content),
            Err(AnimationError::AnimationTooLong { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            AnimationLibrary::from_toml_str("[status.idle\n"),
            Err(AnimationError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = AnimationLibrary::from_path(Path::new("/nonexistent/animations.toml"));
        assert!(matches!(result, Err(AnimationError::ReadError { .. })));
    }

    // =========================================================================
    // Built-in Definition Tests
    // =========================================================================

    #[test]
    fn test_builtin_loads() {
        let library = AnimationLibrary::builtin().unwrap();
        assert_eq!(library.default_status(), "idle");
        for status in [
            "idle", "thinking", "reading", "writing", "executing", "awaiting", "resting",
            "offline", "reviewing",
        ] {
            assert!(library.contains(status), "missing status {status}");
            assert!(!library.frames_for(status).is_empty());
        }
    }

    #[test]
    fn test_builtin_thinking_looks_around() {
        let library = AnimationLibrary::builtin().unwrap();
        let frames = library.frames_for("thinking");
        assert_eq!(frames[0].eye_position, EyePosition::new(2, 1, 4));
        assert_eq!(frames[0].border, '~');
        assert_eq!(frames[2].eye_position, EyePosition::new(4, 1, 2));
    }
}
