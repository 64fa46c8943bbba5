//! Probabilistic sprite spawners
//!
//! Each tick the owning layer asks [`SpriteSpawner::should_spawn`] with its
//! current population. The answer is a Bernoulli trial gated by the cap, so
//! the population climbs toward the cap without ever exceeding it.

use std::sync::Arc;

use rand::Rng;

use super::{Lifetime, Sprite, SpriteInstance};
use crate::error::SpriteError;

/// Closed float range `[min, max]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRange {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl SpawnRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range holding one value
    #[must_use]
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Symmetric range `[-spread, spread]`
    #[must_use]
    pub fn around_zero(spread: f32) -> Self {
        Self::new(-spread, spread)
    }

    /// Multiply both bounds by a non-negative factor
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    fn validate(self, name: &'static str) -> Result<Self, SpriteError> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(self)
        } else {
            Err(SpriteError::InvalidRange {
                name,
                min: f64::from(self.min),
                max: f64::from(self.max),
            })
        }
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Lifetime distribution for spawned instances
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifetimeRange {
    /// Uniform ticks in `[min, max]`
    Finite {
        /// Shortest lifetime
        min: u32,
        /// Longest lifetime
        max: u32,
    },
    /// Instances never age out
    Infinite,
}

/// Spawner configuration
#[derive(Clone, Debug)]
pub struct SpawnerConfig {
    /// Sprites picked uniformly at random
    pub variants: Vec<Arc<Sprite>>,
    /// Probability of spawning on a tick, in [0, 1]
    pub spawn_rate: f32,
    /// Population cap
    pub max_instances: usize,
    /// Initial x
    pub x: SpawnRange,
    /// Initial y
    pub y: SpawnRange,
    /// Horizontal velocity
    pub vx: SpawnRange,
    /// Vertical velocity
    pub vy: SpawnRange,
    /// Frames advanced per tick
    pub animation_speed: SpawnRange,
    /// Lifetime in ticks
    pub lifetime: LifetimeRange,
}

/// Validated spawner
#[derive(Clone, Debug)]
pub struct SpriteSpawner {
    config: SpawnerConfig,
}

impl SpriteSpawner {
    /// Validate a configuration
    ///
    /// # Errors
    ///
    /// Returns an error for an empty variant list, a spawn rate outside
    /// [0, 1], or any empty, inverted or non-finite range.
    pub fn new(config: SpawnerConfig) -> Result<Self, SpriteError> {
        if config.variants.is_empty() {
            return Err(SpriteError::NoVariants);
        }
        if !(0.0..=1.0).contains(&config.spawn_rate) {
            return Err(SpriteError::InvalidSpawnRate(config.spawn_rate));
        }
        config.x.validate("x")?;
        config.y.validate("y")?;
        config.vx.validate("vx")?;
        config.vy.validate("vy")?;
        config.animation_speed.validate("animation_speed")?;
        if let LifetimeRange::Finite { min, max } = config.lifetime {
            if min > max {
                return Err(SpriteError::InvalidRange {
                    name: "lifetime",
                    min: f64::from(min),
                    max: f64::from(max),
                });
            }
        }
        Ok(Self { config })
    }

    /// Population cap
    #[must_use]
    pub fn max_instances(&self) -> usize {
        self.config.max_instances
    }

    /// Spawn probability per tick
    #[must_use]
    pub fn spawn_rate(&self) -> f32 {
        self.config.spawn_rate
    }

    /// The configuration this spawner was built from
    #[must_use]
    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Bernoulli trial gated by the population cap
    ///
    /// No random draw is made when the cap is already reached.
    pub fn should_spawn<R: Rng + ?Sized>(&self, population: usize, rng: &mut R) -> bool {
        population < self.config.max_instances && rng.gen::<f32>() < self.config.spawn_rate
    }

    /// Build a new instance with every parameter drawn from its range
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> SpriteInstance {
        let variant = rng.gen_range(0..self.config.variants.len());
        let sprite = Arc::clone(&self.config.variants[variant]);

        let lifetime = match self.config.lifetime {
            LifetimeRange::Finite { min, max } => Lifetime::Finite(rng.gen_range(min..=max)),
            LifetimeRange::Infinite => Lifetime::Infinite,
        };

        SpriteInstance::new(sprite, self.config.x.sample(rng), self.config.y.sample(rng))
            .with_velocity(self.config.vx.sample(rng), self.config.vy.sample(rng))
            .with_animation_speed(self.config.animation_speed.sample(rng))
            .with_lifetime(lifetime)
    }
}
