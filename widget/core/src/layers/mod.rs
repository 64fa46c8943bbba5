//! Renderable layers
//!
//! The layer set is closed and small, so it is a tagged enum rather than a
//! trait object. Each variant reports a preferred size, whether it fills the
//! whole canvas, and whether it is opaque (cuts a hole beneath itself).
//!
//! | Layer        | Size            | Fill | Opaque |
//! |--------------|-----------------|------|--------|
//! | `Weather`    | canvas          | yes  | no     |
//! | `Face`       | 11 x 5          | no   | yes    |
//! | `ContextBar` | bar width x 1   | no   | yes    |
//! | `Text`       | text width x 1  | no   | no     |
//! | `Static`     | grid size       | no   | no     |

mod context_bar;
mod face;
mod text;
mod weather;

pub use context_bar::{ContextBarLayer, BAR_EMPTY, BAR_FILLED};
pub use face::FaceLayer;
pub use text::{TextLayer, TEXT_GRAY};
pub use weather::{
    WeatherParticleLayer, WeatherTuning, WeatherType, DEFAULT_INTENSITY, FULL_WIND_SPEED,
    OFFSCREEN_MARGIN, WINDY_THRESHOLD,
};

use crate::error::RenderError;
use crate::grid::Grid;

/// One contributor to a composited frame
#[derive(Debug)]
pub enum Layer {
    /// Animated face
    Face(FaceLayer),
    /// Weather particles
    Weather(WeatherParticleLayer),
    /// Context usage bar
    ContextBar(ContextBarLayer),
    /// A single line of text
    Text(TextLayer),
    /// A fixed grid
    Static(Grid),
}

impl Layer {
    /// Size the layer wants when it does not fill the canvas
    #[must_use]
    pub fn preferred_size(&self) -> (usize, usize) {
        match self {
            Self::Face(face) => face.size(),
            Self::Weather(weather) => weather.size(),
            Self::ContextBar(bar) => (bar.width(), 1),
            Self::Text(text) => (text.width(), 1),
            Self::Static(grid) => grid.size(),
        }
    }

    /// Whether the layer renders at full canvas size
    #[must_use]
    pub fn fills(&self) -> bool {
        matches!(self, Self::Weather(_))
    }

    /// Whether the layer cuts a hole in everything beneath it by default
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Face(_) | Self::ContextBar(_))
    }

    /// Render one tick at `size`
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the layer cannot produce a grid this
    /// tick; the compositor skips it.
    pub fn render(&mut self, size: (usize, usize)) -> Result<Grid, RenderError> {
        match self {
            Self::Face(face) => face.render(),
            Self::Weather(weather) => Ok(weather.render(size)),
            Self::ContextBar(bar) => Ok(bar.render()),
            Self::Text(text) => text.render(),
            Self::Static(grid) => Ok(grid.clone()),
        }
    }

    /// Short name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Face(_) => "face",
            Self::Weather(_) => "weather",
            Self::ContextBar(_) => "context_bar",
            Self::Text(_) => "text",
            Self::Static(_) => "static",
        }
    }
}

impl From<FaceLayer> for Layer {
    fn from(layer: FaceLayer) -> Self {
        Self::Face(layer)
    }
}

impl From<WeatherParticleLayer> for Layer {
    fn from(layer: WeatherParticleLayer) -> Self {
        Self::Weather(layer)
    }
}

impl From<ContextBarLayer> for Layer {
    fn from(layer: ContextBarLayer) -> Self {
        Self::ContextBar(layer)
    }
}

impl From<TextLayer> for Layer {
    fn from(layer: TextLayer) -> Self {
        Self::Text(layer)
    }
}

impl From<Grid> for Layer {
    fn from(grid: Grid) -> Self {
        Self::Static(grid)
    }
}
