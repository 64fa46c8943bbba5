//! Input State File
//!
//! The assistant side of the system writes a small JSON document describing
//! what the widget should show. The daemon polls it once per tick and pushes
//! any change into the renderer.
//!
//! ```json
//! {
//!   "status": "thinking",
//!   "context_percent": 42.5,
//!   "weather": "light rain",
//!   "wind_speed": 12.0,
//!   "verb": "pondering"
//! }
//! ```
//!
//! Every field is optional. A missing file keeps the widget idle; a file
//! that fails to parse keeps the last good state so a half-written update
//! never blanks the face.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use widget_core::FrameRenderer;

/// Errors reading the state file
#[derive(Debug, Error)]
pub enum StateError {
    /// The file exists but could not be read
    #[error("Failed to read state file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The file is not valid state JSON
    #[error("Failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What the widget should currently display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetState {
    /// Assistant status, e.g. `idle`, `thinking`, `running`
    pub status: String,

    /// Context window usage, 0-100
    pub context_percent: f32,

    /// Free-text weather description; clear when absent
    pub weather: Option<String>,

    /// Wind speed in the weather source's units; 15 or more turns clear
    /// and cloudy skies windy, and snow drifts harder up to 30
    pub wind_speed: f32,

    /// Caption shown under the bar
    pub verb: Option<String>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            status: "idle".to_string(),
            context_percent: 0.0,
            weather: None,
            wind_speed: 0.0,
            verb: None,
        }
    }
}

impl WidgetState {
    /// Parse a state document
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Parse`] if `content` is not a JSON object of
    /// the expected shape.
    pub fn from_json(content: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Push every field into `renderer`
    pub fn apply(&self, renderer: &mut FrameRenderer) {
        renderer.set_status(&self.status);
        renderer.set_context_percent(self.context_percent);
        renderer.set_verb(self.verb.as_deref());

        let description = self.weather.as_deref().unwrap_or("clear");
        match renderer.set_weather_conditions(description, self.wind_speed) {
            Ok(weather) => debug!(%weather, description, "Weather applied"),
            Err(e) => warn!(error = %e, description, "Failed to apply weather, keeping previous"),
        }
    }
}

/// Polls the state file, re-reading only when its mtime changes
#[derive(Debug)]
pub struct StateWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    current: WidgetState,
}

impl StateWatcher {
    /// Watch `path`; nothing is read until the first [`poll`](Self::poll)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
            current: WidgetState::default(),
        }
    }

    /// Path being watched
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last successfully read state
    #[must_use]
    pub fn current(&self) -> &WidgetState {
        &self.current
    }

    /// Check the file and return the new state if it changed
    ///
    /// A missing file yields `None`. Read and parse failures are logged and
    /// also yield `None`; the previous state stays current.
    pub fn poll(&mut self) -> Option<&WidgetState> {
        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return None;
        };
        let modified = metadata.modified().ok();
        if modified.is_some() && modified == self.last_modified {
            return None;
        }
        self.last_modified = modified;

        match self.read() {
            Ok(state) if state == self.current => None,
            Ok(state) => {
                debug!(status = %state.status, "State file changed");
                self.current = state;
                Some(&self.current)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable state file");
                None
            }
        }
    }

    fn read(&self) -> Result<WidgetState, StateError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| StateError::Read {
            path: self.path.clone(),
            source,
        })?;
        WidgetState::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use widget_core::layers::DEFAULT_INTENSITY;
    use widget_core::{AnimationLibrary, WeatherType, WidgetConfig};

    fn renderer() -> FrameRenderer {
        let library = Arc::new(AnimationLibrary::builtin().unwrap());
        FrameRenderer::new(&WidgetConfig::default(), library)
            .unwrap()
            .with_seed(1)
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_parse_full_state() {
        let state = WidgetState::from_json(
            r#"{"status":"thinking","context_percent":42.5,"weather":"heavy snow","verb":"Musing"}"#,
        )
        .unwrap();

        assert_eq!(state.status, "thinking");
        assert!((state.context_percent - 42.5).abs() < f32::EPSILON);
        assert_eq!(state.weather.as_deref(), Some("heavy snow"));
        assert_eq!(state.verb.as_deref(), Some("Musing"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let state = WidgetState::from_json("{}").unwrap();
        assert_eq!(state, WidgetState::default());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            WidgetState::from_json("{not json"),
            Err(StateError::Parse(_))
        ));
    }

    // =========================================================================
    // Applying
    // =========================================================================

    #[test]
    fn test_apply_updates_renderer() {
        let mut renderer = renderer();
        let state = WidgetState {
            status: "error".to_string(),
            context_percent: 75.0,
            weather: Some("light rain".to_string()),
            wind_speed: 0.0,
            verb: None,
        };

        state.apply(&mut renderer);

        assert_eq!(renderer.status(), "error");
        assert_eq!(renderer.weather(), Some(WeatherType::Rain(0.3)));
    }

    #[test]
    fn test_apply_passes_wind_through() {
        let mut renderer = renderer();
        let state = WidgetState::from_json(r#"{"weather":"sunny","wind_speed":20}"#).unwrap();

        state.apply(&mut renderer);

        assert_eq!(renderer.weather(), Some(WeatherType::Windy(DEFAULT_INTENSITY)));
        assert!((renderer.wind_speed() - 20.0).abs() < f32::EPSILON);

        // Calm again: the same sky is just clear
        let calm = WidgetState::from_json(r#"{"weather":"sunny"}"#).unwrap();
        calm.apply(&mut renderer);
        assert_eq!(renderer.weather(), Some(WeatherType::Clear));
        assert!(renderer.wind_speed().abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_without_weather_clears() {
        let mut renderer = renderer();
        renderer.set_weather(WeatherType::Fog).unwrap();

        WidgetState::default().apply(&mut renderer);

        assert_eq!(renderer.weather(), Some(WeatherType::Clear));
    }

    // =========================================================================
    // Watching
    // =========================================================================

    #[test]
    fn test_poll_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = StateWatcher::new(dir.path().join("state.json"));

        assert!(watcher.poll().is_none());
        assert_eq!(watcher.current(), &WidgetState::default());
    }

    #[test]
    fn test_poll_reads_then_settles() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"status":"thinking"}"#).unwrap();
        let mut watcher = StateWatcher::new(file.path());

        assert_eq!(watcher.poll().map(|s| s.status.clone()), Some("thinking".to_string()));
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_poll_keeps_last_good_state_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"status":"running"}"#).unwrap();
        let mut watcher = StateWatcher::new(&path);
        assert!(watcher.poll().is_some());

        std::fs::write(&path, "{\"status\":").unwrap();
        // Force a re-read regardless of mtime granularity
        watcher.last_modified = None;

        assert!(watcher.poll().is_none());
        assert_eq!(watcher.current().status, "running");
    }
}
