//! Weather particle layer
//!
//! # Design
//!
//! ```text
//!   set_weather(Snow(0.6))
//!        │
//!        ▼
//!   spawners = [snow spawner]      old particles keep falling
//!        │
//!   render(size), once per tick
//!        │
//!        ├─► update every particle
//!        ├─► drop dead and far off-canvas particles
//!        ├─► each spawner: should_spawn(population) ─► spawn
//!        └─► stamp particles onto a fresh canvas-sized grid
//! ```
//!
//! Only the spawner list is swapped on a weather change, so a switch from
//! snow to rain lets the last flakes finish their fall while drops begin.
//! Clear weather installs an ambient cloud spawner that drifts multi-line
//! clouds in from the left of the upper sky; those clouds never age and
//! leave only by drifting off-canvas.
//!
//! # Wind
//!
//! Wind speed is a separate input. Snow leans with the wind: the mean
//! horizontal drift grows linearly up to [`FULL_WIND_SPEED`]. A clear or
//! cloudy sky at [`WINDY_THRESHOLD`] or above is shown as windy, with
//! streaks blowing in from the left edge.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::SpriteError;
use crate::grid::Grid;
use crate::sprite::{
    LifetimeRange, ShapeCatalog, SpawnRange, SpawnerConfig, Sprite, SpriteInstance, SpriteSpawner,
};

/// Intensity used when a description carries no qualifier
pub const DEFAULT_INTENSITY: f32 = 0.6;

/// Cells a particle may stray beyond the canvas before it is dropped
///
/// Wide enough that ambient clouds spawned two widths off the left edge
/// survive until they drift in.
pub const OFFSCREEN_MARGIN: f32 = 4.0;

/// Wind speed at which a clear or cloudy sky turns windy
pub const WINDY_THRESHOLD: f32 = 15.0;

/// Wind speed at which snow drift stops increasing
pub const FULL_WIND_SPEED: f32 = 30.0;

const SNOW_SHAPES: &[&str] = &["snow_star", "snow_plus", "snow_x", "snow_dot", "snow_o"];
const RAIN_SHAPES: &[&str] = &["rain_drop", "rain_drop", "rain_colon", "rain_tick", "rain_comma"];
const CLOUDY_SHAPES: &[&str] = &["cloud_small", "cloud_wisp", "cloud_puff", "fog_tilde"];
const FOG_SHAPES: &[&str] = &["fog_patch", "fog_bank", "fog_dot", "fog_tilde"];
const WINDY_SHAPES: &[&str] = &["wind_tilde", "wind_dash", "wind_tick", "wind_arrow", "wind_slash"];
const AMBIENT_SHAPES: &[&str] = &["cloud_small", "cloud_wisp", "cloud_puff"];

/// Fraction of the canvas height ambient clouds spawn in
const AMBIENT_ZONE: f32 = 0.35;

/// Current weather
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum WeatherType {
    /// No precipitation; ambient clouds only
    #[default]
    Clear,
    /// Snow with intensity in [0, 1]
    Snow(f32),
    /// Rain with intensity in [0, 1]
    Rain(f32),
    /// Overcast
    Cloudy,
    /// Fog
    Fog,
    /// Wind streaks with intensity in [0, 1]
    Windy(f32),
}

impl WeatherType {
    /// Classify a free-text description such as "Light Rain"
    ///
    /// `heavy` maps to intensity 1.0, `light` to 0.3, anything else to
    /// [`DEFAULT_INTENSITY`]. Thunderstorms count as rain. Unrecognised
    /// descriptions are clear.
    #[must_use]
    pub fn classify(description: &str) -> Self {
        Self::classify_with_wind(description, 0.0)
    }

    /// Classify a description together with a wind speed
    ///
    /// A clear or cloudy result becomes [`WeatherType::Windy`] when
    /// `wind_speed` is at least [`WINDY_THRESHOLD`]. Precipitation and fog
    /// are unaffected.
    #[must_use]
    pub fn classify_with_wind(description: &str, wind_speed: f32) -> Self {
        let text = description.to_lowercase();
        let intensity = if text.contains("heavy") {
            1.0
        } else if text.contains("light") {
            0.3
        } else {
            DEFAULT_INTENSITY
        };

        let weather = if text.contains("snow") {
            Self::Snow(intensity)
        } else if ["rain", "shower", "drizzle", "thunder"]
            .iter()
            .any(|k| text.contains(k))
        {
            Self::Rain(intensity)
        } else if text.contains("fog") {
            Self::Fog
        } else if text.contains("cloud") || text.contains("overcast") {
            Self::Cloudy
        } else {
            Self::Clear
        };

        match weather {
            Self::Clear | Self::Cloudy if wind_speed >= WINDY_THRESHOLD => Self::Windy(intensity),
            other => other,
        }
    }

    /// Intensity in [0, 1]; cloud and fog use [`DEFAULT_INTENSITY`]
    #[must_use]
    pub fn intensity(self) -> f32 {
        let raw = match self {
            Self::Clear => 0.0,
            Self::Snow(i) | Self::Rain(i) | Self::Windy(i) => i,
            Self::Cloudy | Self::Fog => DEFAULT_INTENSITY,
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Snow(_) => "snow",
            Self::Rain(_) => "rain",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::Windy(_) => "windy",
        }
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Population and motion knobs, loaded from the `[weather]` config section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherTuning {
    /// Snow cap at intensity 1.0
    pub snow_max: usize,
    /// Rain cap at intensity 1.0
    pub rain_max: usize,
    /// Cloud cap at intensity 1.0
    pub cloud_max: usize,
    /// Fog cap at intensity 1.0
    pub fog_max: usize,
    /// Wind streak cap at intensity 1.0
    pub wind_max: usize,
    /// Ambient clouds alive at once in clear weather
    pub ambient_cloud_max: usize,
    /// Ambient cloud spawn probability per tick
    pub ambient_spawn_rate: f32,
    /// Spawn probability per tick at intensity 1.0
    pub spawn_rate: f32,
    /// Scales every weather velocity except ambient drift
    pub speed_multiplier: f32,
    /// Palette code particles are drawn in
    pub particle_color: u8,
}

impl Default for WeatherTuning {
    fn default() -> Self {
        Self {
            snow_max: 25,
            rain_max: 25,
            cloud_max: 25,
            fog_max: 25,
            wind_max: 25,
            ambient_cloud_max: 3,
            ambient_spawn_rate: 0.03,
            spawn_rate: 0.5,
            speed_multiplier: 1.0,
            particle_color: 8,
        }
    }
}

impl WeatherTuning {
    /// Check rates and multipliers
    ///
    /// # Errors
    ///
    /// Returns a message naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), String> {
        for (name, rate) in [
            ("spawn_rate", self.spawn_rate),
            ("ambient_spawn_rate", self.ambient_spawn_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("weather.{name} must be within [0, 1], got {rate}"));
            }
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier < 0.0 {
            return Err(format!(
                "weather.speed_multiplier must be a non-negative number, got {}",
                self.speed_multiplier
            ));
        }
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn cap(base: usize, intensity: f32) -> usize {
        (base as f32 * intensity).round() as usize
    }
}

/// Full-canvas particle layer
#[derive(Debug)]
pub struct WeatherParticleLayer {
    width: usize,
    height: usize,
    weather: WeatherType,
    wind_speed: f32,
    tuning: WeatherTuning,
    catalog: Arc<ShapeCatalog>,
    spawners: Vec<SpriteSpawner>,
    particles: Vec<SpriteInstance>,
    rng: StdRng,
}

impl WeatherParticleLayer {
    /// Start in clear weather with an entropy-seeded generator
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning yields an invalid spawner.
    pub fn new(
        width: usize,
        height: usize,
        tuning: WeatherTuning,
        catalog: Arc<ShapeCatalog>,
    ) -> Result<Self, SpriteError> {
        let weather = WeatherType::Clear;
        let spawner = spawner_for(weather, 0.0, width, height, &tuning, &catalog)?;
        Ok(Self {
            width,
            height,
            weather,
            wind_speed: 0.0,
            tuning,
            catalog,
            spawners: vec![spawner],
            particles: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseed the generator for reproducible runs
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Replace the generator with one seeded from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Canvas size the spawners are configured for
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Current weather
    #[must_use]
    pub fn weather(&self) -> WeatherType {
        self.weather
    }

    /// Current wind speed
    #[must_use]
    pub fn wind_speed(&self) -> f32 {
        self.wind_speed
    }

    /// Live particles
    #[must_use]
    pub fn particles(&self) -> &[SpriteInstance] {
        &self.particles
    }

    /// Number of live particles
    #[must_use]
    pub fn population(&self) -> usize {
        self.particles.len()
    }

    /// Active spawners
    #[must_use]
    pub fn spawners(&self) -> &[SpriteSpawner] {
        &self.spawners
    }

    /// Switch weather, replacing the spawner list with one spawner
    ///
    /// Existing particles are kept and age out on their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the new spawner is invalid; the previous weather
    /// stays in effect.
    pub fn set_weather(&mut self, weather: WeatherType) -> Result<(), SpriteError> {
        if weather == self.weather {
            return Ok(());
        }
        let spawner = spawner_for(
            weather,
            self.wind_speed,
            self.width,
            self.height,
            &self.tuning,
            &self.catalog,
        )?;
        tracing::debug!(
            from = %self.weather,
            to = %weather,
            intensity = weather.intensity(),
            cap = spawner.max_instances(),
            "Weather changed"
        );
        self.weather = weather;
        self.spawners = vec![spawner];
        Ok(())
    }

    /// Change the wind speed; negative and NaN speeds read as calm
    ///
    /// The spawner is rebuilt so new particles pick up the drift. Particles
    /// already in flight keep their velocity.
    ///
    /// # Errors
    ///
    /// Returns an error if the rebuilt spawner is invalid; the previous wind
    /// speed stays in effect.
    pub fn set_wind_speed(&mut self, wind_speed: f32) -> Result<(), SpriteError> {
        let wind_speed = if wind_speed.is_nan() { 0.0 } else { wind_speed.max(0.0) };
        if (wind_speed - self.wind_speed).abs() < f32::EPSILON {
            return Ok(());
        }
        let spawner = spawner_for(
            self.weather,
            wind_speed,
            self.width,
            self.height,
            &self.tuning,
            &self.catalog,
        )?;
        tracing::debug!(from = self.wind_speed, to = wind_speed, "Wind changed");
        self.wind_speed = wind_speed;
        self.spawners = vec![spawner];
        Ok(())
    }

    /// Replace the spawner list with a caller-built spawner
    ///
    /// The spawner stays until the next weather change or resize.
    pub fn replace_spawner(&mut self, spawner: SpriteSpawner) {
        self.spawners = vec![spawner];
    }

    /// Drop every live particle
    pub fn clear_particles(&mut self) {
        self.particles.clear();
    }

    fn resize(&mut self, (width, height): (usize, usize)) {
        match spawner_for(
            self.weather,
            self.wind_speed,
            width,
            height,
            &self.tuning,
            &self.catalog,
        ) {
            Ok(spawner) => self.spawners = vec![spawner],
            Err(e) => tracing::warn!(error = %e, "Keeping previous spawner after resize"),
        }
        self.width = width;
        self.height = height;
    }

    /// Advance one tick and rasterize onto a `size` grid
    pub fn render(&mut self, size: (usize, usize)) -> Grid {
        if size != (self.width, self.height) {
            self.resize(size);
        }
        let (width, height) = size;

        for particle in &mut self.particles {
            particle.update();
        }
        self.particles
            .retain(|p| !p.is_dead() && !p.is_outside(width, height, OFFSCREEN_MARGIN));

        for spawner in &self.spawners {
            if spawner.should_spawn(self.particles.len(), &mut self.rng) {
                self.particles.push(spawner.spawn(&mut self.rng));
            }
        }

        let mut grid = Grid::new(width, height);
        for particle in &self.particles {
            let (frame, x, y) = particle.render();
            grid.stamp(frame, x, y, self.tuning.particle_color);
        }
        grid
    }
}

/// Build the spawner for one weather type on a `width` x `height` canvas
#[allow(clippy::cast_precision_loss)]
fn spawner_for(
    weather: WeatherType,
    wind_speed: f32,
    width: usize,
    height: usize,
    tuning: &WeatherTuning,
    catalog: &ShapeCatalog,
) -> Result<SpriteSpawner, SpriteError> {
    let w = width as f32;
    let h = height as f32;
    let speed = tuning.speed_multiplier;
    let intensity = weather.intensity();
    let rate = (tuning.spawn_rate * intensity).clamp(0.0, 1.0);

    let config = match weather {
        WeatherType::Clear => {
            let variants = catalog.variants(AMBIENT_SHAPES);
            let (widest, _) = extent(&variants);
            SpawnerConfig {
                variants,
                spawn_rate: tuning.ambient_spawn_rate,
                max_instances: tuning.ambient_cloud_max,
                x: SpawnRange::new(-2.0 * widest, -widest),
                y: SpawnRange::new(0.0, (h * AMBIENT_ZONE).floor()),
                vx: SpawnRange::new(0.08, 0.15),
                vy: SpawnRange::around_zero(0.02),
                animation_speed: SpawnRange::fixed(0.0),
                lifetime: LifetimeRange::Infinite,
            }
        }
        WeatherType::Snow(_) => {
            let variants = catalog.variants(SNOW_SHAPES);
            let (_, tallest) = extent(&variants);
            let wind = (wind_speed / FULL_WIND_SPEED).clamp(0.0, 1.0);
            let drift = wind * 0.15;
            let spread = 0.02 + wind * 0.03;
            SpawnerConfig {
                variants,
                spawn_rate: rate,
                max_instances: WeatherTuning::cap(tuning.snow_max, intensity),
                x: SpawnRange::new(0.0, w),
                y: SpawnRange::new(-tallest, 0.0),
                vx: SpawnRange::new(drift - spread, drift + spread).scaled(speed),
                vy: SpawnRange::new(0.15, 0.35).scaled(speed),
                animation_speed: SpawnRange::fixed(0.0),
                lifetime: LifetimeRange::Finite { min: 40, max: 100 },
            }
        }
        WeatherType::Rain(_) => {
            let variants = catalog.variants(RAIN_SHAPES);
            let (_, tallest) = extent(&variants);
            SpawnerConfig {
                variants,
                spawn_rate: rate,
                max_instances: WeatherTuning::cap(tuning.rain_max, intensity),
                x: SpawnRange::new(0.0, w),
                y: SpawnRange::new(-tallest, 0.0),
                vx: SpawnRange::around_zero(0.03).scaled(speed),
                vy: SpawnRange::new(0.5, 0.9).scaled(speed),
                animation_speed: SpawnRange::fixed(0.0),
                lifetime: LifetimeRange::Finite { min: 20, max: 50 },
            }
        }
        WeatherType::Windy(_) => SpawnerConfig {
            variants: catalog.variants(WINDY_SHAPES),
            spawn_rate: rate,
            max_instances: WeatherTuning::cap(tuning.wind_max, intensity),
            x: SpawnRange::new(-2.0, 0.0),
            y: SpawnRange::new(0.0, h),
            vx: SpawnRange::new(0.4, 0.8).scaled(speed),
            vy: SpawnRange::around_zero(0.1).scaled(speed),
            animation_speed: SpawnRange::fixed(0.0),
            lifetime: LifetimeRange::Finite { min: 30, max: 60 },
        },
        WeatherType::Cloudy | WeatherType::Fog => {
            let (shapes, base) = if weather == WeatherType::Cloudy {
                (CLOUDY_SHAPES, tuning.cloud_max)
            } else {
                (FOG_SHAPES, tuning.fog_max)
            };
            SpawnerConfig {
                variants: catalog.variants(shapes),
                spawn_rate: rate,
                max_instances: WeatherTuning::cap(base, intensity),
                x: SpawnRange::new(0.0, w),
                y: SpawnRange::new(0.0, h),
                vx: SpawnRange::around_zero(0.05).scaled(speed),
                vy: SpawnRange::around_zero(0.03).scaled(speed),
                animation_speed: SpawnRange::fixed(0.0),
                lifetime: LifetimeRange::Finite { min: 60, max: 150 },
            }
        }
    };
    SpriteSpawner::new(config)
}

/// Widest and tallest variant, in cells
#[allow(clippy::cast_precision_loss)]
fn extent(variants: &[Arc<Sprite>]) -> (f32, f32) {
    variants.iter().fold((0.0_f32, 0.0_f32), |(w, h), sprite| {
        let (sw, sh) = sprite.size();
        (w.max(sw as f32), h.max(sh as f32))
    })
}
