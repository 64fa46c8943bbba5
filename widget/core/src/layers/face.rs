//! Face layer
//!
//! Holds the current status and a frame counter. The counter is advanced by
//! the driver at its own cadence, so face animation speed does not depend on
//! how often frames are rendered.

use std::sync::Arc;

use crate::animation::{AnimationLibrary, FACE_HEIGHT, FACE_WIDTH};
use crate::error::RenderError;
use crate::grid::Grid;

/// Renders the current status's animation frame
#[derive(Debug)]
pub struct FaceLayer {
    library: Arc<AnimationLibrary>,
    status: String,
    counter: usize,
}

impl FaceLayer {
    /// Start on the library's default status
    #[must_use]
    pub fn new(library: Arc<AnimationLibrary>) -> Self {
        let status = library.default_status().to_string();
        Self {
            library,
            status,
            counter: 0,
        }
    }

    /// Swap in a reloaded library; the status is kept and the counter restarts
    pub fn set_library(&mut self, library: Arc<AnimationLibrary>) {
        self.library = library;
        self.counter = 0;
    }

    /// Face size in cells
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (FACE_WIDTH, FACE_HEIGHT)
    }

    /// Switch status; the frame counter restarts on a change
    pub fn set_status(&mut self, status: &str) {
        if status != self.status {
            tracing::debug!(from = %self.status, to = status, "Face status changed");
            self.status = status.to_string();
            self.counter = 0;
        }
    }

    /// Current status as requested (may be unknown to the library)
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Advance to the next animation frame
    pub fn advance(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }

    /// Monotonic frame counter
    #[must_use]
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Rasterize `frames_for(status)[counter mod n]`
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoFrame`] if the library yields no frames.
    pub fn render(&self) -> Result<Grid, RenderError> {
        let frames = self.library.frames_for(&self.status);
        if frames.is_empty() {
            return Err(RenderError::NoFrame(self.status.clone()));
        }
        Ok(frames[self.counter % frames.len()].rasterize())
    }
}
