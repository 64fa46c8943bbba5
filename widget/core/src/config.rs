//! TOML Configuration File Support
//!
//! Configuration for the widget renderer lives in a TOML file at
//! `~/.config/companion-widget/widget.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/companion-widget/widget.toml`
//!   (typically `~/.config/companion-widget/widget.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [display]
//! grid_width = 29
//! grid_height = 12
//! fps = 5
//! face_ticks_per_frame = 2
//! avatar_y_offset = -1
//!
//! [theme]
//! base = "crt-green"
//! overrides = { thinking = [1.0, 0.5, 0.0] }
//!
//! [weather]
//! snow_max = 30
//! speed_multiplier = 1.5
//!
//! [animations]
//! path = "~/.config/companion-widget/animations.toml"
//! ```
//!
//! A leading `~` in `animations.path` or `WIDGET_ANIMATIONS` is expanded to
//! the home directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{FACE_HEIGHT, FACE_WIDTH};
use crate::color::{Rgb, Theme, ThemeName};
use crate::layers::WeatherTuning;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Display section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Canvas width in cells
    pub grid_width: Option<usize>,

    /// Canvas height in cells
    pub grid_height: Option<usize>,

    /// Render ticks per second
    pub fps: Option<u32>,

    /// Render ticks per face animation frame
    pub face_ticks_per_frame: Option<u32>,

    /// Horizontal nudge applied to the face
    pub avatar_x_offset: Option<i32>,

    /// Vertical nudge applied to the face
    pub avatar_y_offset: Option<i32>,

    /// Horizontal nudge applied to the context bar
    pub bar_x_offset: Option<i32>,

    /// Vertical nudge applied to the context bar
    pub bar_y_offset: Option<i32>,
}

/// Theme section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeToml {
    /// Base theme name
    pub base: Option<String>,

    /// Per-status RGB overrides, channels in 0.0-1.0
    pub overrides: HashMap<String, [f32; 3]>,
}

/// Animations section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationsToml {
    /// Custom animation definition file
    pub path: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetToml {
    /// Display configuration section
    pub display: DisplayToml,

    /// Theme configuration section
    pub theme: ThemeToml,

    /// Weather tuning section; missing keys keep their defaults
    pub weather: Option<WeatherTuning>,

    /// Animation definition section
    pub animations: AnimationsToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Canvas and layout settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Canvas width in cells
    pub grid_width: usize,
    /// Canvas height in cells
    pub grid_height: usize,
    /// Render ticks per second
    pub fps: u32,
    /// Render ticks per face animation frame
    pub face_ticks_per_frame: u32,
    /// Face offset from its centred position
    pub avatar_offset: (i32, i32),
    /// Context bar offset from its centred position
    pub bar_offset: (i32, i32),
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            grid_width: 29,
            grid_height: 12,
            fps: 5,
            face_ticks_per_frame: 1,
            avatar_offset: (0, 0),
            bar_offset: (0, 0),
        }
    }
}

/// Centralized configuration for the widget renderer
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct WidgetConfig {
    /// Canvas and layout settings
    pub display: DisplayConfig,

    /// Base theme
    pub theme_name: ThemeName,

    /// Per-status RGB overrides
    pub theme_overrides: HashMap<String, Rgb>,

    /// Weather particle tuning
    pub weather: WeatherTuning,

    /// Custom animation definition file; built-ins when `None`
    pub animations_path: Option<PathBuf>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            theme_name: ThemeName::default(),
            theme_overrides: HashMap::new(),
            weather: WeatherTuning::default(),
            animations_path: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl WidgetConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Build the theme with overrides applied
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme_overrides
            .iter()
            .fold(Theme::new(self.theme_name), |theme, (status, rgb)| {
                theme.with_override(status.clone(), *rgb)
            })
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the grid cannot hold the
    /// face, the frame rate is outside 1-60, the face cadence is zero, or
    /// the weather tuning is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.display;
        if d.grid_width < FACE_WIDTH || d.grid_height < FACE_HEIGHT {
            return Err(ConfigError::ValidationError(format!(
                "grid {}x{} is smaller than the {FACE_WIDTH}x{FACE_HEIGHT} face",
                d.grid_width, d.grid_height
            )));
        }
        if !(1..=60).contains(&d.fps) {
            return Err(ConfigError::ValidationError(format!(
                "fps must be within 1-60, got {}",
                d.fps
            )));
        }
        if d.face_ticks_per_frame == 0 {
            return Err(ConfigError::ValidationError(
                "face_ticks_per_frame must be at least 1".to_string(),
            ));
        }
        self.weather.validate().map_err(ConfigError::ValidationError)
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/companion-widget/widget.toml` or
/// `~/.config/companion-widget/widget.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("companion-widget").join("widget.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values fail validation. A missing config file is not an error.
pub fn load_config() -> Result<WidgetConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the merged values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<WidgetConfig, ConfigError> {
    let mut config = WidgetConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: WidgetToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut WidgetConfig, toml: &WidgetToml) -> Result<(), ConfigError> {
    // Display settings
    let display = &toml.display;
    if let Some(width) = display.grid_width {
        config.display.grid_width = width;
    }
    if let Some(height) = display.grid_height {
        config.display.grid_height = height;
    }
    if let Some(fps) = display.fps {
        config.display.fps = fps;
    }
    if let Some(ticks) = display.face_ticks_per_frame {
        config.display.face_ticks_per_frame = ticks;
    }
    config.display.avatar_offset = (
        display.avatar_x_offset.unwrap_or(config.display.avatar_offset.0),
        display.avatar_y_offset.unwrap_or(config.display.avatar_offset.1),
    );
    config.display.bar_offset = (
        display.bar_x_offset.unwrap_or(config.display.bar_offset.0),
        display.bar_y_offset.unwrap_or(config.display.bar_offset.1),
    );

    // Theme settings
    if let Some(ref base) = toml.theme.base {
        config.theme_name = base.parse().map_err(ConfigError::ValidationError)?;
    }
    for (status, channels) in &toml.theme.overrides {
        config
            .theme_overrides
            .insert(status.clone(), Rgb::from_unit(*channels));
    }

    // Weather settings
    if let Some(ref weather) = toml.weather {
        config.weather = weather.clone();
    }

    // Animation settings
    if let Some(ref path) = toml.animations.path {
        config.animations_path = Some(expand_home(path));
    }

    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut WidgetConfig) {
    if let Ok(width) = std::env::var("WIDGET_GRID_WIDTH") {
        if let Ok(w) = width.parse::<usize>() {
            config.display.grid_width = w;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(height) = std::env::var("WIDGET_GRID_HEIGHT") {
        if let Ok(h) = height.parse::<usize>() {
            config.display.grid_height = h;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(fps) = std::env::var("WIDGET_FPS") {
        if let Ok(f) = fps.parse::<u32>() {
            config.display.fps = f;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(theme) = std::env::var("WIDGET_THEME") {
        match theme.parse::<ThemeName>() {
            Ok(name) => {
                config.theme_name = name;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring WIDGET_THEME"),
        }
    }
    if let Ok(path) = std::env::var("WIDGET_ANIMATIONS") {
        config.animations_path = Some(expand_home(Path::new(&path)));
        config.source = ConfigSource::Env;
    }
}

/// Replace a leading `~` component with the home directory
///
/// `~user` forms are left alone, as is everything when no home directory
/// is known.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides,
/// then call [`WidgetConfig::validate`] again.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Grid width override
    pub grid_width: Option<usize>,

    /// Grid height override
    pub grid_height: Option<usize>,

    /// Frame rate override
    pub fps: Option<u32>,

    /// Theme override
    pub theme: Option<ThemeName>,

    /// Animation definition file override
    pub animations_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set grid width override
    #[must_use]
    pub fn with_grid_width(mut self, width: usize) -> Self {
        self.grid_width = Some(width);
        self
    }

    /// Set grid height override
    #[must_use]
    pub fn with_grid_height(mut self, height: usize) -> Self {
        self.grid_height = Some(height);
        self
    }

    /// Set frame rate override
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set theme override
    #[must_use]
    pub fn with_theme(mut self, theme: ThemeName) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Set animation file override
    #[must_use]
    pub fn with_animations_path(mut self, path: PathBuf) -> Self {
        self.animations_path = Some(path);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut WidgetConfig) {
        if self.grid_width.is_some()
            || self.grid_height.is_some()
            || self.fps.is_some()
            || self.theme.is_some()
            || self.animations_path.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(width) = self.grid_width {
            config.display.grid_width = width;
        }
        if let Some(height) = self.grid_height {
            config.display.grid_height = height;
        }
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        if let Some(theme) = self.theme {
            config.theme_name = theme;
        }
        if let Some(ref path) = self.animations_path {
            config.animations_path = Some(path.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
