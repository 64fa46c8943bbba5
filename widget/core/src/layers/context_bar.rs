//! Context usage bar

use crate::grid::Grid;

/// Palette code for filled cells (bright white)
pub const BAR_FILLED: u8 = 15;

/// Palette code for empty cells (gray)
pub const BAR_EMPTY: u8 = 8;

const FILLED_GLYPH: char = '█';
const EMPTY_GLYPH: char = '░';

/// One-row bar proportional to a 0-100 percentage
#[derive(Clone, Debug, PartialEq)]
pub struct ContextBarLayer {
    width: usize,
    percent: f32,
}

impl ContextBarLayer {
    /// Create an empty bar
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self { width, percent: 0.0 }
    }

    /// Bar width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Change the bar width
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Set the percentage, clamped to 0-100; NaN reads as 0
    pub fn set_percent(&mut self, percent: f32) {
        self.percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
    }

    /// Current percentage
    #[must_use]
    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Number of filled cells: `round(percent / 100 * width)`
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn filled(&self) -> usize {
        let filled = (self.percent / 100.0 * self.width as f32).round() as usize;
        filled.min(self.width)
    }

    /// Render filled blocks followed by light blocks
    #[must_use]
    pub fn render(&self) -> Grid {
        let filled = self.filled();
        let mut grid = Grid::new(self.width, 1);
        for x in 0..self.width {
            let cell = if x < filled {
                (FILLED_GLYPH, BAR_FILLED)
            } else {
                (EMPTY_GLYPH, BAR_EMPTY)
            };
            grid.put(crate::grid::to_i32(x), 0, cell.0, cell.1);
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filled_rounds() {
        let mut bar = ContextBarLayer::new(10);
        for (percent, expected) in [(0.0, 0), (4.0, 0), (5.0, 1), (44.0, 4), (45.0, 5), (100.0, 10)] {
            bar.set_percent(percent);
            assert_eq!(bar.filled(), expected, "percent {percent}");
        }
    }

    #[test]
    fn test_percent_clamped() {
        let mut bar = ContextBarLayer::new(8);
        bar.set_percent(250.0);
        assert_eq!(bar.filled(), 8);
        bar.set_percent(-10.0);
        assert_eq!(bar.filled(), 0);
        bar.set_percent(f32::NAN);
        assert_eq!(bar.filled(), 0);
    }

    #[test]
    fn test_render_glyphs_and_colors() {
        let mut bar = ContextBarLayer::new(4);
        bar.set_percent(50.0);
        let grid = bar.render();
        assert_eq!(grid.to_wire_rows(), vec!["██░░".to_string()]);
        assert_eq!(grid.get(0, 0).map(|c| c.color), Some(BAR_FILLED));
        assert_eq!(grid.get(3, 0).map(|c| c.color), Some(BAR_EMPTY));
    }

    #[test]
    fn test_zero_width() {
        let bar = ContextBarLayer::new(0);
        assert_eq!(bar.render().size(), (0, 1));
    }
}
