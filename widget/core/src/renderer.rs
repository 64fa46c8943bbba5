//! Frame renderer
//!
//! Wires the four standard layers into a [`Compositor`] and turns driver
//! inputs (status, weather, context usage, verb) into [`WireFrame`]s.
//!
//! # Layout
//!
//! ```text
//!   ┌──────────── canvas W x H ────────────┐
//!   │  margin 15%                          │
//!   │           ╭─────────╮                │  face, 11 x 5, centred
//!   │           │  o   o  │                │
//!   │           │    ~    │                │
//!   │           │ .  .  . │                │
//!   │           ╰─────────╯                │
//!   │                                      │  gap, 10% of H (>= 1)
//!   │       ████████████░░░░░░░░░          │  bar, 65% of W
//!   │                                      │
//!   │            pondering...              │  verb, 2 rows below bar
//!   └──────────────────────────────────────┘
//! ```
//!
//! Positions are recomputed from the canvas size on every frame, so a
//! resize needs no re-registration of layers.
//!
//! | Layer   | z | Opaque |
//! |---------|---|--------|
//! | weather | 0 | no     |
//! | face    | 1 | yes    |
//! | bar     | 2 | yes    |
//! | verb    | 3 | no     |

use std::sync::Arc;

use crate::animation::{AnimationLibrary, FACE_HEIGHT, FACE_WIDTH};
use crate::color::Theme;
use crate::compositor::{Compositor, LayerId};
use crate::config::WidgetConfig;
use crate::error::SpriteError;
use crate::grid::to_i32;
use crate::layers::{
    ContextBarLayer, FaceLayer, Layer, TextLayer, WeatherParticleLayer, WeatherType,
};
use crate::sprite::ShapeCatalog;
use crate::wire::{WireEncoder, WireFrame};

const MARGIN_RATIO: f32 = 0.15;
const BAR_WIDTH_RATIO: f32 = 0.65;
const BAR_GAP_RATIO: f32 = 0.1;

/// Rows between the bar and the verb line
const VERB_GAP: i32 = 2;

/// Element positions for one canvas size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Face top-left corner
    pub avatar: (i32, i32),
    /// Bar left end
    pub bar: (i32, i32),
    /// Bar width in cells
    pub bar_width: usize,
}

impl Layout {
    /// Compute the centred layout for a `width` x `height` canvas
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn compute(width: usize, height: usize) -> Self {
        let (w, h) = (to_i32(width), to_i32(height));
        let face_w = to_i32(FACE_WIDTH);
        let face_h = to_i32(FACE_HEIGHT);

        let margin_x = (w as f32 * MARGIN_RATIO) as i32;
        let margin_y = (h as f32 * MARGIN_RATIO) as i32;
        let content_w = w - 2 * margin_x;
        let content_h = h - 2 * margin_y;

        let avatar_x = margin_x + (content_w - face_w).div_euclid(2);

        let bar_gap = ((h as f32 * BAR_GAP_RATIO) as i32).max(1);
        let block_h = face_h + bar_gap + 1;
        let avatar_y = margin_y + (content_h - block_h).div_euclid(2);
        let bar_y = avatar_y + face_h + bar_gap;

        let bar_width = ((w as f32 * BAR_WIDTH_RATIO) as i32)
            .min(content_w)
            .max(face_w);
        let bar_x = margin_x + (content_w - bar_width).div_euclid(2);

        Self {
            avatar: (avatar_x, avatar_y),
            bar: (bar_x, bar_y),
            bar_width: bar_width.max(0) as usize,
        }
    }

    /// Verb origin for text `text_width` cells wide, never left of column 0
    #[must_use]
    pub fn verb(&self, text_width: usize) -> (i32, i32) {
        let x = self.bar.0 + (to_i32(self.bar_width) - to_i32(text_width)).div_euclid(2);
        (x.max(0), self.bar.1 + VERB_GAP)
    }
}

#[derive(Clone, Copy, Debug)]
struct LayerIds {
    weather: LayerId,
    face: LayerId,
    bar: LayerId,
    verb: LayerId,
}

/// Compositor with the standard widget layers and a wire encoder
#[derive(Debug)]
pub struct FrameRenderer {
    compositor: Compositor,
    ids: LayerIds,
    library: Arc<AnimationLibrary>,
    theme: Theme,
    status: String,
    face_ticks_per_frame: u64,
    ticks: u64,
}

impl FrameRenderer {
    /// Build the renderer from configuration and a loaded animation library
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in shapes or the weather tuning
    /// produce an invalid sprite or spawner.
    pub fn new(config: &WidgetConfig, library: Arc<AnimationLibrary>) -> Result<Self, SpriteError> {
        let display = &config.display;
        let (width, height) = (display.grid_width, display.grid_height);
        let layout = Layout::compute(width, height);
        let catalog = Arc::new(ShapeCatalog::builtin()?);

        let mut compositor = Compositor::new(width, height);

        let weather = compositor.add_layer(
            WeatherParticleLayer::new(width, height, config.weather.clone(), catalog)?,
            0,
        );

        let face = compositor.add_layer(FaceLayer::new(Arc::clone(&library)), 1);
        let (ax, ay) = display.avatar_offset;
        compositor.set_origin(
            face,
            Arc::new(move |(cw, ch), _| {
                let (x, y) = Layout::compute(cw, ch).avatar;
                (x + ax, y + ay)
            }),
        );

        let bar = compositor.add_layer(ContextBarLayer::new(layout.bar_width), 2);
        let (bx, by) = display.bar_offset;
        compositor.set_origin(
            bar,
            Arc::new(move |(cw, ch), _| {
                let (x, y) = Layout::compute(cw, ch).bar;
                (x + bx, y + by)
            }),
        );

        let verb = compositor.add_layer(TextLayer::default(), 3);
        compositor.set_origin(
            verb,
            Arc::new(move |(cw, ch), (tw, _)| {
                let (x, y) = Layout::compute(cw, ch).verb(tw);
                (x + bx, y + by)
            }),
        );
        compositor.set_visible(verb, false);

        let status = library.default_status().to_string();
        tracing::debug!(width, height, theme = %config.theme_name, "Frame renderer ready");

        Ok(Self {
            compositor,
            ids: LayerIds {
                weather,
                face,
                bar,
                verb,
            },
            library,
            theme: config.theme(),
            status,
            face_ticks_per_frame: u64::from(display.face_ticks_per_frame.max(1)),
            ticks: 0,
        })
    }

    /// Reseed the weather generator for reproducible output
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Some(weather) = self.weather_mut() {
            weather.reseed(seed);
        }
        self
    }

    fn face_mut(&mut self) -> Option<&mut FaceLayer> {
        match self.compositor.layer_mut(self.ids.face) {
            Some(Layer::Face(face)) => Some(face),
            _ => None,
        }
    }

    fn weather_mut(&mut self) -> Option<&mut WeatherParticleLayer> {
        match self.compositor.layer_mut(self.ids.weather) {
            Some(Layer::Weather(weather)) => Some(weather),
            _ => None,
        }
    }

    fn bar_mut(&mut self) -> Option<&mut ContextBarLayer> {
        match self.compositor.layer_mut(self.ids.bar) {
            Some(Layer::ContextBar(bar)) => Some(bar),
            _ => None,
        }
    }

    fn verb_mut(&mut self) -> Option<&mut TextLayer> {
        match self.compositor.layer_mut(self.ids.verb) {
            Some(Layer::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Current status as last set
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The animation library backing the face
    #[must_use]
    pub fn library(&self) -> &Arc<AnimationLibrary> {
        &self.library
    }

    /// Replace the animation library, e.g. after its file changed
    ///
    /// The current status carries over to the new library.
    pub fn set_library(&mut self, library: Arc<AnimationLibrary>) {
        if let Some(face) = self.face_mut() {
            face.set_library(Arc::clone(&library));
        }
        tracing::debug!(default_status = library.default_status(), "Animation library replaced");
        self.library = library;
    }

    /// Active theme
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replace the theme
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Switch the face to `status`; unknown names render the default status
    pub fn set_status(&mut self, status: &str) {
        if let Some(face) = self.face_mut() {
            face.set_status(status);
        }
        status.clone_into(&mut self.status);
    }

    /// Switch weather
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning yields an invalid spawner for the new
    /// weather; the previous weather stays in effect.
    pub fn set_weather(&mut self, weather: WeatherType) -> Result<(), SpriteError> {
        match self.weather_mut() {
            Some(layer) => layer.set_weather(weather),
            None => Ok(()),
        }
    }

    /// Classify a free-text description and switch to it
    ///
    /// The current wind speed still applies.
    ///
    /// # Errors
    ///
    /// See [`FrameRenderer::set_weather`].
    pub fn set_weather_description(&mut self, description: &str) -> Result<WeatherType, SpriteError> {
        let wind_speed = self.wind_speed();
        self.set_weather_conditions(description, wind_speed)
    }

    /// Set wind speed, then classify `description` against it and switch
    ///
    /// # Errors
    ///
    /// Returns an error if either spawner rebuild fails; see
    /// [`FrameRenderer::set_weather`].
    pub fn set_weather_conditions(
        &mut self,
        description: &str,
        wind_speed: f32,
    ) -> Result<WeatherType, SpriteError> {
        let weather = WeatherType::classify_with_wind(description, wind_speed);
        if let Some(layer) = self.weather_mut() {
            layer.set_wind_speed(wind_speed)?;
            layer.set_weather(weather)?;
        }
        Ok(weather)
    }

    /// Current wind speed
    #[must_use]
    pub fn wind_speed(&self) -> f32 {
        match self.compositor.layer(self.ids.weather) {
            Some(Layer::Weather(weather)) => weather.wind_speed(),
            _ => 0.0,
        }
    }

    /// Current weather
    #[must_use]
    pub fn weather(&self) -> Option<WeatherType> {
        match self.compositor.layer(self.ids.weather) {
            Some(Layer::Weather(weather)) => Some(weather.weather()),
            _ => None,
        }
    }

    /// Set context usage, 0-100
    pub fn set_context_percent(&mut self, percent: f32) {
        if let Some(bar) = self.bar_mut() {
            bar.set_percent(percent);
        }
    }

    /// Show `verb` as a lowercase `verb...` caption, or hide it with `None`
    pub fn set_verb(&mut self, verb: Option<&str>) {
        let text = verb
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("{}...", v.trim().to_lowercase()));
        let visible = text.is_some();
        if let Some(layer) = self.verb_mut() {
            layer.set_text(text.unwrap_or_default());
        }
        self.compositor.set_visible(self.ids.verb, visible);
    }

    /// Count one render tick; the face advances every
    /// `face_ticks_per_frame` ticks
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % self.face_ticks_per_frame == 0 {
            if let Some(face) = self.face_mut() {
                face.advance();
            }
        }
    }

    /// Resize the canvas; the bar width follows the new layout
    pub fn resize(&mut self, width: usize, height: usize) {
        self.compositor.resize(width, height);
        let bar_width = Layout::compute(width, height).bar_width;
        if let Some(bar) = self.bar_mut() {
            bar.set_width(bar_width);
        }
    }

    /// Composite all layers and encode the result
    pub fn render(&mut self) -> WireFrame {
        let grid = self.compositor.render();
        WireEncoder::encode(&grid, self.theme.status_color(&self.status))
    }

    /// The underlying compositor, for extra layers
    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }
}
