//! Single-line text layer

use crate::error::RenderError;
use crate::grid::Grid;

/// Light gray, the default for status captions
pub const TEXT_GRAY: u8 = 249;

/// One line of text in a fixed palette colour
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayer {
    text: String,
    color: u8,
}

impl TextLayer {
    /// Empty text layer in `color`
    #[must_use]
    pub fn new(color: u8) -> Self {
        Self {
            text: String::new(),
            color,
        }
    }

    /// Replace the text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Current text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Render the text on one row
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidText`] if the text holds a control
    /// character such as a newline.
    pub fn render(&self) -> Result<Grid, RenderError> {
        if let Some(c) = self.text.chars().find(|c| c.is_control()) {
            return Err(RenderError::InvalidText(c));
        }
        let mut grid = Grid::new(self.width(), 1);
        grid.put_str(0, 0, &self.text, self.color);
        Ok(grid)
    }
}

impl Default for TextLayer {
    fn default() -> Self {
        Self::new(TEXT_GRAY)
    }
}
