//! Error types for the rendering engine
//!
//! Errors fall into two groups:
//!
//! - **Configuration errors** ([`AnimationError`], [`SpriteError`]) are raised
//!   while building libraries, sprites and spawners. They are surfaced at
//!   startup so a broken animation file never reaches the render loop.
//! - **Render errors** ([`RenderError`]) are transient, per-layer failures. The
//!   compositor logs them and skips the failing layer for one tick.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or expanding animation definitions
#[derive(Debug, Error)]
pub enum AnimationError {
    /// Failed to read an animation definition file
    #[error("Failed to read animation file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse the TOML definition
    #[error("Failed to parse animation definition: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The designated default status has no definition
    #[error("Default status '{0}' is not defined")]
    MissingDefaultStatus(String),

    /// A frame entry references a sequence that does not exist
    #[error("Status '{status}': unknown sequence '{name}'")]
    UnknownSequence {
        /// Status being expanded
        status: String,
        /// The missing sequence name
        name: String,
    },

    /// A frame entry references a preset that does not exist
    #[error("Status '{status}': unknown preset '{name}'")]
    UnknownPreset {
        /// Status being expanded
        status: String,
        /// The missing preset name
        name: String,
    },

    /// A preset tried to inherit from another preset
    #[error("Preset '{0}' cannot reference another preset")]
    NestedPreset(String),

    /// A slot value is neither a known shorthand nor a valid literal
    #[error("Status '{status}': '{value}' is not a {slot} shorthand or literal")]
    UnknownShorthand {
        /// Status being expanded
        status: String,
        /// Slot the value was used for
        slot: &'static str,
        /// The unresolved value
        value: String,
    },

    /// A shorthand table entry has the wrong shape for its slot
    #[error("Shorthand '{name}' for {slot}: {reason}")]
    InvalidShorthand {
        /// Slot the table belongs to
        slot: &'static str,
        /// Shorthand name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Sequence references form a cycle
    #[error("Status '{status}': cyclic sequence reference {}", .chain.join(" -> "))]
    CyclicSequence {
        /// Status being expanded
        status: String,
        /// Sequence names from the outermost reference to the repeated one
        chain: Vec<String>,
    },

    /// A sequence reference asked for zero repetitions
    #[error("Status '{status}': sequence '{name}' has repeat = 0")]
    ZeroRepeat {
        /// Status being expanded
        status: String,
        /// Sequence name
        name: String,
    },

    /// A sequence reference asked for more repetitions than allowed
    #[error("Status '{status}': sequence '{name}' has repeat = {repeat}, the limit is {max}")]
    RepeatTooLarge {
        /// Status being expanded
        status: String,
        /// Sequence name
        name: String,
        /// Requested repetitions
        repeat: u32,
        /// Largest accepted repeat
        max: u32,
    },

    /// A status expanded to more frames than allowed
    #[error("Status '{status}' expands to more than {max} frames")]
    AnimationTooLong {
        /// Status being expanded
        status: String,
        /// Largest accepted frame count
        max: usize,
    },

    /// A status expanded to no frames at all
    #[error("Status '{0}' expands to an empty frame list")]
    EmptyAnimation(String),
}

/// Errors raised while building sprites and spawners
#[derive(Debug, Error, PartialEq)]
pub enum SpriteError {
    /// A sprite was given no frames
    #[error("Sprite has no frames")]
    NoFrames,

    /// A frame's text art is empty
    #[error("Sprite frame {0} is empty")]
    EmptyFrame(usize),

    /// Frames of one sprite disagree on dimensions
    #[error("Sprite frame {index} is {actual:?}, expected {expected:?}")]
    FrameSizeMismatch {
        /// Index of the offending frame
        index: usize,
        /// Dimensions of frame 0 as (width, height)
        expected: (usize, usize),
        /// Dimensions of the offending frame
        actual: (usize, usize),
    },

    /// A spawner was given no sprite variants
    #[error("Spawner has no sprite variants")]
    NoVariants,

    /// A spawner range is empty, inverted or not finite
    #[error("Spawner range '{name}' is invalid: [{min}, {max}]")]
    InvalidRange {
        /// Which range
        name: &'static str,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Spawn rate is outside [0, 1]
    #[error("Spawn rate {0} is outside [0, 1]")]
    InvalidSpawnRate(f32),
}

/// Transient failures of a single layer's render pass
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Text contains characters that cannot be placed on the grid
    #[error("Text layer content contains control character {0:?}")]
    InvalidText(char),

    /// The animation library produced no frame for the status
    #[error("No animation frame available for status '{0}'")]
    NoFrame(String),
}
