//! Fully resolved animation frames and the face template
//!
//! ```text
//!  ╭---------╮   corners + border
//!  │   o o   │   edge, eyes at (left, gap, right) padding
//!  │    ~    │   mouth, centred
//!  │ .  .  . │   substrate, nine characters
//!  ╰---------╯
//! ```

use crate::grid::{Grid, THEME_COLOR};

/// Face width in cells
pub const FACE_WIDTH: usize = 11;

/// Face height in cells
pub const FACE_HEIGHT: usize = 5;

/// Interior width between the vertical edges
pub const INTERIOR_WIDTH: usize = FACE_WIDTH - 2;

/// Eye placement as padding (left, gap, right) inside the interior
///
/// The two eye glyphs take one cell each, so the three paddings must sum to
/// `INTERIOR_WIDTH - 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EyePosition {
    /// Cells before the left eye
    pub left: u8,
    /// Cells between the eyes
    pub gap: u8,
    /// Cells after the right eye
    pub right: u8,
}

impl EyePosition {
    /// Centred eyes
    pub const CENTERED: Self = Self::new(3, 1, 3);

    /// Create a placement
    #[must_use]
    pub const fn new(left: u8, gap: u8, right: u8) -> Self {
        Self { left, gap, right }
    }

    /// True when the paddings exactly fill the interior
    #[must_use]
    pub const fn fits(self) -> bool {
        self.left as usize + self.gap as usize + self.right as usize + 2 == INTERIOR_WIDTH
    }
}

impl Default for EyePosition {
    fn default() -> Self {
        Self::CENTERED
    }
}

/// One face frame with every slot resolved to concrete glyphs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderedFrame {
    /// Eye glyph
    pub eyes: char,
    /// Eye placement
    pub eye_position: EyePosition,
    /// Mouth glyph
    pub mouth: char,
    /// Horizontal border glyph
    pub border: char,
    /// Vertical edge glyph
    pub edge: char,
    /// Corners: top-left, top-right, bottom-left, bottom-right
    pub corners: [char; 4],
    /// Substrate row
    pub substrate: [char; INTERIOR_WIDTH],
}

impl Default for RenderedFrame {
    fn default() -> Self {
        Self {
            eyes: 'o',
            eye_position: EyePosition::CENTERED,
            mouth: '~',
            border: '-',
            edge: '│',
            corners: ['╭', '╮', '╰', '╯'],
            substrate: [' ', '.', ' ', ' ', '.', ' ', ' ', '.', ' '],
        }
    }
}

impl RenderedFrame {
    /// Lay the frame out as five lines of text art
    #[must_use]
    pub fn to_text_art(&self) -> String {
        let [tl, tr, bl, br] = self.corners;
        let border: String = std::iter::repeat(self.border).take(INTERIOR_WIDTH).collect();

        let mut eyes = [' '; INTERIOR_WIDTH];
        let left = usize::from(self.eye_position.left);
        let right_eye = left + 1 + usize::from(self.eye_position.gap);
        for slot in [left, right_eye] {
            if let Some(cell) = eyes.get_mut(slot) {
                *cell = self.eyes;
            }
        }

        let mut mouth = [' '; INTERIOR_WIDTH];
        mouth[INTERIOR_WIDTH / 2] = self.mouth;

        let row = |cells: &[char]| -> String {
            let mut line = String::with_capacity(FACE_WIDTH * 3);
            line.push(self.edge);
            line.extend(cells);
            line.push(self.edge);
            line
        };

        [
            format!("{tl}{border}{tr}"),
            row(&eyes),
            row(&mouth),
            row(&self.substrate),
            format!("{bl}{border}{br}"),
        ]
        .join("\n")
    }

    /// Rasterize the frame into a face-sized grid drawn in the theme colour
    ///
    /// Interior spaces stay as literal spaces so they read as transparent
    /// when composited; the face layer relies on subtract to keep its
    /// footprint clear.
    #[must_use]
    pub fn rasterize(&self) -> Grid {
        Grid::from_text(&self.to_text_art(), '\0', THEME_COLOR)
    }
}
