//! Wire format for composited frames
//!
//! One [`WireFrame`] is produced per tick:
//!
//! ```text
//! {
//!   "rows":        ["  ~  ", ...],        one string per grid row
//!   "cell_colors": [[0, 0, 8, 0, 0], ...], one palette code per cell
//!   "theme_color": [0.4, 0.8, 1.0]        RGB in [0, 1]
//! }
//! ```
//!
//! Code 0 tells the consumer to substitute `theme_color`; 1-255 index the
//! shared [`ColorTable`]. Unset cells encode as a space with code 0.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::color::{ColorTable, Rgb};
use crate::grid::{Grid, THEME_COLOR};

/// A frame ready for transmission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    /// Row strings, all the same length in characters
    pub rows: Vec<String>,
    /// Per-cell palette codes, same shape as `rows`
    pub cell_colors: Vec<Vec<u8>>,
    /// Theme colour substituted for code 0
    pub theme_color: [f32; 3],
}

/// A run of same-coloured characters within one row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorSpan {
    /// Palette code shared by the run
    pub color: u8,
    /// The run's characters
    pub text: String,
}

impl WireFrame {
    /// Grid width and height
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        let width = self.rows.first().map_or(0, |r| r.chars().count());
        (width, self.rows.len())
    }

    /// True when every row has exactly one colour per character
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.rows.len() == self.cell_colors.len()
            && self
                .rows
                .iter()
                .zip(&self.cell_colors)
                .all(|(row, colors)| row.chars().count() == colors.len())
    }

    /// Run-length group one row into same-colour spans
    #[must_use]
    pub fn spans(&self, row: usize) -> Vec<ColorSpan> {
        let (Some(text), Some(colors)) = (self.rows.get(row), self.cell_colors.get(row)) else {
            return Vec::new();
        };
        let mut spans: Vec<ColorSpan> = Vec::new();
        for (ch, &color) in text.chars().zip(colors) {
            match spans.last_mut() {
                Some(span) if span.color == color => span.text.push(ch),
                _ => spans.push(ColorSpan {
                    color,
                    text: ch.to_string(),
                }),
            }
        }
        spans
    }

    /// Render with 256-colour escapes for a terminal preview
    ///
    /// Code 0 is drawn in the theme colour as 24-bit RGB.
    #[must_use]
    pub fn to_ansi(&self) -> String {
        let theme = Rgb::from_unit(self.theme_color);
        let mut out = String::new();
        for row in 0..self.rows.len() {
            for span in self.spans(row) {
                if span.color == THEME_COLOR {
                    let _ = write!(out, "\x1b[38;2;{};{};{}m", theme.r, theme.g, theme.b);
                } else {
                    let _ = write!(out, "\x1b[38;5;{}m", span.color);
                }
                out.push_str(&span.text);
            }
            out.push_str("\x1b[0m\n");
        }
        out
    }

    /// Resolve one cell's colour to RGB
    #[must_use]
    pub fn cell_rgb(&self, x: usize, y: usize) -> Option<Rgb> {
        let code = *self.cell_colors.get(y)?.get(x)?;
        Some(ColorTable::resolve(code, Rgb::from_unit(self.theme_color)))
    }
}

/// Converts grids into [`WireFrame`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct WireEncoder;

impl WireEncoder {
    /// Encode `grid` with `theme` as the colour for code 0
    ///
    /// # Panics
    ///
    /// Panics if a row's character count differs from its colour count,
    /// which would mean the grid itself is malformed.
    #[must_use]
    pub fn encode(grid: &Grid, theme: Rgb) -> WireFrame {
        let mut rows = Vec::with_capacity(grid.height());
        let mut cell_colors = Vec::with_capacity(grid.height());

        for row in grid.rows() {
            let mut text = String::with_capacity(row.len());
            let mut colors = Vec::with_capacity(row.len());
            for cell in row {
                match cell {
                    Some(cell) => {
                        text.push(cell.ch);
                        colors.push(cell.color);
                    }
                    None => {
                        text.push(' ');
                        colors.push(THEME_COLOR);
                    }
                }
            }
            rows.push(text);
            cell_colors.push(colors);
        }

        let frame = WireFrame {
            rows,
            cell_colors,
            theme_color: theme.to_unit(),
        };
        assert!(frame.is_well_formed(), "row and colour arrays diverged");
        frame
    }
}
