//! Sprites, live instances and spawners
//!
//! # Design
//!
//! ```text
//!   Sprite (immutable, shared via Arc)
//!     frames: [Grid; n], all the same size
//!     anchor: logical origin inside the frame
//!        ▲
//!        │ Arc
//!   SpriteInstance (mutable, owned by a layer)
//!     position, velocity, frame phase, lifetime
//!        ▲
//!        │ spawn()
//!   SpriteSpawner (immutable config)
//!     variants, spawn rate, cap, ranges
//! ```
//!
//! Sprites are parsed once at startup. Instances carry all per-particle state
//! so a single sprite can back any number of live particles.

mod catalog;
mod instance;
mod spawner;

pub use catalog::{ShapeCatalog, SHAPES};
pub use instance::{Lifetime, SpriteInstance};
pub use spawner::{LifetimeRange, SpawnRange, SpawnerConfig, SpriteSpawner};

use crate::error::SpriteError;
use crate::grid::{Grid, THEME_COLOR};

/// Immutable multi-frame stamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    frames: Vec<Grid>,
    anchor: (i32, i32),
}

impl Sprite {
    /// Create a sprite from pre-built frames
    ///
    /// # Errors
    ///
    /// Returns an error if there are no frames, a frame is empty, or the
    /// frames disagree on dimensions.
    pub fn new(frames: Vec<Grid>, anchor: (i32, i32)) -> Result<Self, SpriteError> {
        let first = frames.first().ok_or(SpriteError::NoFrames)?;
        let expected = first.size();

        for (index, frame) in frames.iter().enumerate() {
            let (w, h) = frame.size();
            if w == 0 || h == 0 {
                return Err(SpriteError::EmptyFrame(index));
            }
            if frame.size() != expected {
                return Err(SpriteError::FrameSizeMismatch {
                    index,
                    expected,
                    actual: frame.size(),
                });
            }
        }

        Ok(Self { frames, anchor })
    }

    /// Parse a sprite from text-art frames
    ///
    /// Each frame is split on newlines and padded to its longest line. The
    /// `transparent` character becomes an unset cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the frames are empty or differ in size. Frames are
    /// never cropped or padded to match each other.
    pub fn from_text_art(
        frames: &[&str],
        transparent: char,
        anchor: (i32, i32),
    ) -> Result<Self, SpriteError> {
        let grids = frames
            .iter()
            .map(|text| Grid::from_text(text, transparent, THEME_COLOR))
            .collect();
        Self::new(grids, anchor)
    }

    /// Single-frame sprite with space as the transparency marker
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is empty.
    pub fn from_text(text: &str) -> Result<Self, SpriteError> {
        Self::from_text_art(&[text], ' ', (0, 0))
    }

    /// Frame at `index`, wrapping past the last frame
    #[must_use]
    pub fn frame(&self, index: usize) -> &Grid {
        &self.frames[index % self.frames.len()]
    }

    /// Number of frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame dimensions as (width, height)
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        self.frames[0].size()
    }

    /// Anchor offset from the top-left corner
    #[must_use]
    pub fn anchor(&self) -> (i32, i32) {
        self.anchor
    }
}
