//! Animation File Reloading
//!
//! When the configuration names a custom animation file, the daemon checks
//! its mtime once per tick. A changed file is parsed into a fresh
//! [`AnimationLibrary`] and swapped into the renderer. A file that fails to
//! load is reported and the running library stays in place, so a
//! half-saved edit never takes the face down.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{info, warn};

use widget_core::AnimationLibrary;

/// Polls an animation definition file for changes
#[derive(Debug)]
pub struct AnimationWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl AnimationWatcher {
    /// Watch `path`, taking its current mtime as already loaded
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = modified(&path);
        Self {
            path,
            last_modified,
        }
    }

    /// Path being watched
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Treat the next poll as a change regardless of mtime granularity
    #[cfg(test)]
    pub(crate) fn force_reload(&mut self) {
        self.last_modified = None;
    }

    /// Load the file again if it changed since the last poll
    ///
    /// Returns the new library on a successful reload. A missing file, an
    /// unchanged mtime or an invalid definition yield `None`.
    pub fn poll(&mut self) -> Option<Arc<AnimationLibrary>> {
        let modified = modified(&self.path)?;
        if self.last_modified == Some(modified) {
            return None;
        }
        self.last_modified = Some(modified);

        match AnimationLibrary::from_path(&self.path) {
            Ok(library) => {
                let frames = library.prewarm();
                info!(path = ?self.path, frames, "Reloaded animation definitions");
                Some(Arc::new(library))
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Keeping previous animations");
                None
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ORIGINAL: &str = "[status.idle]\nframes = [{ eyes = \"o\" }]\n";
    const EDITED: &str = "[status.idle]\nframes = [{ eyes = \"@\" }, { eyes = \"-\" }]\n";

    #[test]
    fn test_unchanged_file_is_not_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animations.toml");
        fs::write(&path, ORIGINAL).unwrap();

        let mut watcher = AnimationWatcher::new(&path);
        assert!(watcher.poll().is_none());
        assert_eq!(watcher.path(), path);
    }

    #[test]
    fn test_changed_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animations.toml");
        fs::write(&path, ORIGINAL).unwrap();
        let mut watcher = AnimationWatcher::new(&path);

        fs::write(&path, EDITED).unwrap();
        watcher.force_reload();

        let library = watcher.poll().unwrap();
        assert_eq!(library.frames_for("idle").len(), 2);
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_invalid_edit_keeps_previous_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animations.toml");
        fs::write(&path, ORIGINAL).unwrap();
        let mut watcher = AnimationWatcher::new(&path);

        fs::write(&path, "[status.idle]\nframes = [{ sequence = \"nowhere\" }]\n").unwrap();
        watcher.force_reload();

        assert!(watcher.poll().is_none());
        // The failed mtime is remembered, so the bad file is not retried every tick
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = AnimationWatcher::new(dir.path().join("gone.toml"));
        assert!(watcher.poll().is_none());
    }
}
