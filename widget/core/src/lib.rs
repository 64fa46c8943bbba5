//! Widget Core - Frame Rendering for the Companion Widget
//!
//! This crate turns assistant state into small character-cell frames: an
//! animated face, weather particles drifting behind it, a context usage bar
//! and an optional caption. It has no I/O beyond reading config and
//! animation files, and no async runtime; a driver calls it once per tick.
//!
//! # Architecture
//!
//! ```text
//!   driver inputs: status, weather description, context %, verb
//! ┌───────────────────────────┼──────────────────────────────────────┐
//! │                     FrameRenderer                                │
//! │  ┌────────────────────────┴────────────────────────────────────┐ │
//! │  │                      Compositor                              │ │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐ │ │
//! │  │  │ Weather  │  │   Face   │  │   Bar    │  │    Verb      │ │ │
//! │  │  │  z = 0   │  │  z = 1   │  │  z = 2   │  │    z = 3     │ │ │
//! │  │  └────┬─────┘  └────┬─────┘  └──────────┘  └──────────────┘ │ │
//! │  └───────┼─────────────┼───────────────────────────────────────┘ │
//! │    SpriteSpawner   AnimationLibrary (lazy, memoized per status)  │
//! │    SpriteInstance                                                │
//! └───────────────────────────┼──────────────────────────────────────┘
//!                             │ Grid
//!                        WireEncoder ──► WireFrame (rows, cell_colors, theme_color)
//! ```
//!
//! # Key Types
//!
//! - [`Grid`]: Bounds-checked character buffer with composite and subtract
//! - [`AnimationLibrary`]: Declarative face animations, expanded lazily
//! - [`Sprite`], [`SpriteInstance`], [`SpriteSpawner`]: Particle machinery
//! - [`Layer`]: The closed set of renderable layers
//! - [`Compositor`]: Z-ordered layer flattening
//! - [`WireEncoder`] / [`WireFrame`]: Transmission format
//! - [`ColorTable`]: The shared 256-colour palette
//! - [`FrameRenderer`]: Everything above wired into the standard widget
//!
//! # Module Overview
//!
//! - [`animation`]: Animation definitions, expansion and the frame cache
//! - [`color`]: Palette, RGB values and status themes
//! - [`compositor`]: Layer ordering and compositing
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`error`]: Error types for animations, sprites and rendering
//! - [`grid`]: The character-cell buffer
//! - [`layers`]: Face, weather, context bar and text layers
//! - [`renderer`]: The standard widget layout
//! - [`sprite`]: Sprites, instances, spawners and built-in shapes
//! - [`wire`]: Frame encoding

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod grid;
pub mod layers;
pub mod renderer;
pub mod sprite;
pub mod wire;

// Animation exports
pub use animation::{AnimationLibrary, CacheStats, EyePosition, RenderedFrame};

// Colour exports
pub use color::{ColorTable, Rgb, Theme, ThemeName};

// Compositor exports
pub use compositor::{fixed_origin, Compositor, LayerId, OriginFn};

// Error exports
pub use error::{AnimationError, RenderError, SpriteError};

// Grid exports
pub use grid::{Cell, Grid, THEME_COLOR};

// Layer exports
pub use layers::{
    ContextBarLayer, FaceLayer, Layer, TextLayer, WeatherParticleLayer, WeatherTuning,
    WeatherType,
};

// Renderer exports
pub use renderer::{FrameRenderer, Layout};

// Sprite exports
pub use sprite::{
    Lifetime, LifetimeRange, ShapeCatalog, SpawnRange, SpawnerConfig, Sprite, SpriteInstance,
    SpriteSpawner,
};

// Wire exports
pub use wire::{ColorSpan, WireEncoder, WireFrame};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, WidgetConfig,
};
