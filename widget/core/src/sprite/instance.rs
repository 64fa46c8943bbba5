//! Live sprite instances

use std::sync::Arc;

use super::Sprite;
use crate::grid::Grid;

/// Remaining lifetime of an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// Ticks left before the instance dies
    Finite(u32),
    /// Never dies from aging
    Infinite,
}

/// A sprite in motion
#[derive(Clone, Debug)]
pub struct SpriteInstance {
    sprite: Arc<Sprite>,
    /// Horizontal position in cells
    pub x: f32,
    /// Vertical position in cells
    pub y: f32,
    /// Horizontal velocity in cells per tick
    pub vx: f32,
    /// Vertical velocity in cells per tick
    pub vy: f32,
    frame: usize,
    frame_phase: f32,
    animation_speed: f32,
    lifetime: Lifetime,
}

impl SpriteInstance {
    /// Place a stationary, non-animating, immortal instance
    #[must_use]
    pub fn new(sprite: Arc<Sprite>, x: f32, y: f32) -> Self {
        Self {
            sprite,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            frame: 0,
            frame_phase: 0.0,
            animation_speed: 0.0,
            lifetime: Lifetime::Infinite,
        }
    }

    /// Set velocity
    #[must_use]
    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    /// Set animation speed in frames per tick (fractions allowed)
    #[must_use]
    pub fn with_animation_speed(mut self, speed: f32) -> Self {
        self.animation_speed = speed;
        self
    }

    /// Set lifetime
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// The shared sprite
    #[must_use]
    pub fn sprite(&self) -> &Arc<Sprite> {
        &self.sprite
    }

    /// Current discrete frame index (not yet wrapped)
    #[must_use]
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Remaining lifetime
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Advance one tick: move, animate, age
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn update(&mut self) {
        self.x += self.vx;
        self.y += self.vy;

        if self.animation_speed > 0.0 {
            self.frame_phase += self.animation_speed;
            let whole = self.frame_phase.trunc();
            self.frame = self.frame.wrapping_add(whole as usize);
            self.frame_phase -= whole;
        }

        if let Lifetime::Finite(remaining) = &mut self.lifetime {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Dead once a finite lifetime reaches zero
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.lifetime == Lifetime::Finite(0)
    }

    /// Top-left render offset: position minus anchor, truncated
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn offset(&self) -> (i32, i32) {
        let (ax, ay) = self.sprite.anchor();
        ((self.x - ax as f32) as i32, (self.y - ay as f32) as i32)
    }

    /// Current frame and where to draw it
    #[must_use]
    pub fn render(&self) -> (&Grid, i32, i32) {
        let (x, y) = self.offset();
        (self.sprite.frame(self.frame), x, y)
    }

    /// True when the sprite's footprint is more than `margin` cells outside
    /// a `width` x `height` canvas
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_outside(&self, width: usize, height: usize, margin: f32) -> bool {
        let (ax, ay) = self.sprite.anchor();
        let (w, h) = self.sprite.size();
        let left = self.x - ax as f32;
        let top = self.y - ay as f32;

        left + (w as f32) < -margin
            || top + (h as f32) < -margin
            || left > width as f32 + margin
            || top > height as f32 + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> Arc<Sprite> {
        Arc::new(Sprite::from_text("*").unwrap())
    }

    // =========================================================================
    // Lifetime Tests
    // =========================================================================

    #[test]
    fn test_finite_lifetime_dies_after_exactly_n_updates() {
        for lifetime in [1_u32, 2, 7, 40] {
            let mut p = SpriteInstance::new(dot(), 0.0, 0.0).with_lifetime(Lifetime::Finite(lifetime));
            for _ in 0..lifetime - 1 {
                p.update();
                assert!(!p.is_dead());
            }
            p.update();
            assert!(p.is_dead());
        }
    }

    #[test]
    fn test_zero_lifetime_starts_dead() {
        let p = SpriteInstance::new(dot(), 0.0, 0.0).with_lifetime(Lifetime::Finite(0));
        assert!(p.is_dead());
    }

    #[test]
    fn test_infinite_lifetime_never_dies() {
        let mut p = SpriteInstance::new(dot(), 0.0, 0.0);
        for _ in 0..10_000 {
            p.update();
        }
        assert!(!p.is_dead());
        assert_eq!(p.lifetime(), Lifetime::Infinite);
    }

    // =========================================================================
    // Motion and Animation Tests
    // =========================================================================

    #[test]
    fn test_update_integrates_velocity() {
        let mut p = SpriteInstance::new(dot(), 1.0, 2.0).with_velocity(0.5, -0.25);
        p.update();
        p.update();
        assert!((p.x - 2.0).abs() < f32::EPSILON);
        assert!((p.y - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fractional_animation_speed() {
        let sprite = Arc::new(Sprite::from_text_art(&["a", "b", "c"], ' ', (0, 0)).unwrap());
        let mut p = SpriteInstance::new(sprite, 0.0, 0.0).with_animation_speed(0.5);
        p.update();
        assert_eq!(p.frame_index(), 0);
        p.update();
        assert_eq!(p.frame_index(), 1);
        for _ in 0..4 {
            p.update();
        }
        assert_eq!(p.frame_index(), 3);
        // Wraps back to the first frame
        assert_eq!(p.render().0.get(0, 0).map(|c| c.ch), Some('a'));
    }

    #[test]
    fn test_render_offset_subtracts_anchor() {
        let sprite = Arc::new(Sprite::from_text_art(&["~~~"], ' ', (1, 0)).unwrap());
        let p = SpriteInstance::new(sprite, 5.7, 2.2);
        let (_, x, y) = p.render();
        assert_eq!((x, y), (4, 2));
    }

    #[test]
    fn test_is_outside_with_margin() {
        let p = SpriteInstance::new(dot(), -3.0, 0.0);
        assert!(!p.is_outside(10, 10, 4.0));
        let p = SpriteInstance::new(dot(), -6.0, 0.0);
        assert!(p.is_outside(10, 10, 4.0));
        let p = SpriteInstance::new(dot(), 5.0, 14.5);
        assert!(p.is_outside(10, 10, 4.0));
        let p = SpriteInstance::new(dot(), 5.0, -6.0);
        assert!(p.is_outside(10, 10, 4.0));
        let p = SpriteInstance::new(dot(), 5.0, -4.5);
        assert!(!p.is_outside(10, 10, 4.0));
        let p = SpriteInstance::new(dot(), 5.0, 5.0);
        assert!(!p.is_outside(10, 10, 0.0));
    }
}
