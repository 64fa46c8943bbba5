//! Character Grid
//!
//! A bounded 2D buffer of optional cells. Unset cells are transparent.
//!
//! # Design
//!
//! Every accessor takes signed coordinates and bounds-checks them. Writes that
//! land outside the grid are dropped and reads return `None`, so callers can
//! stamp sprites that straddle an edge without clipping them first.
//!
//! Two compositing primitives are provided:
//!
//! ```text
//! composite(src)            subtract(src)
//!  . . # .                   . . # .
//!  . [a b] .    a, b over    . [_ _] .   whole rectangle cleared,
//!  . [  c] .    dst, ' '     . [_ _] .   including under src's
//!  . . . .      skipped      . . . .     transparent cells
//! ```

/// Palette code meaning "use the current theme colour"
pub const THEME_COLOR: u8 = 0;

/// A single glyph with its palette code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The glyph
    pub ch: char,
    /// Palette code (0 = theme colour, 1-255 = palette index)
    pub color: u8,
}

impl Cell {
    /// Create a cell with an explicit palette code
    #[must_use]
    pub const fn new(ch: char, color: u8) -> Self {
        Self { ch, color }
    }

    /// Create a cell drawn in the theme colour
    #[must_use]
    pub const fn themed(ch: char) -> Self {
        Self::new(ch, THEME_COLOR)
    }

    /// Spaces are treated as transparent when compositing
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}

/// Bounded 2D buffer of optional cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
}

impl Grid {
    /// Create a grid with every cell unset
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Build a grid from text art
    ///
    /// Lines are split on `\n`; the width is the longest line and shorter
    /// lines are padded with unset cells. Every occurrence of `transparent`
    /// maps to an unset cell, everything else is stored verbatim with `color`.
    #[must_use]
    pub fn from_text(text: &str, transparent: char, color: u8) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, lines.len());

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                if ch != transparent {
                    grid.cells[y * width + x] = Some(Cell::new(ch, color));
                }
            }
        }
        grid
    }

    /// Grid width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as (width, height)
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Read a cell; out-of-bounds reads return `None`
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// Write a cell; out-of-bounds writes are dropped
    pub fn set(&mut self, x: i32, y: i32, cell: Option<Cell>) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Write a glyph with a palette code
    pub fn put(&mut self, x: i32, y: i32, ch: char, color: u8) {
        self.set(x, y, Some(Cell::new(ch, color)));
    }

    /// Write a string left to right starting at (x, y)
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, color: u8) {
        for (offset, ch) in (0_i32..).zip(text.chars()) {
            self.put(x + offset, y, ch, color);
        }
    }

    /// Unset every cell
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// True when no cell holds a visible glyph
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().flatten().all(Cell::is_blank)
    }

    /// Paint `src` onto this grid with its top-left corner at (x, y)
    ///
    /// Unset and space cells in `src` are transparent. Cells that fall
    /// outside this grid are clipped.
    pub fn composite(&mut self, src: &Grid, x: i32, y: i32) {
        self.composite_with(src, x, y, |cell| cell);
    }

    /// Like [`Grid::composite`] but every painted cell takes `color`
    pub fn stamp(&mut self, src: &Grid, x: i32, y: i32, color: u8) {
        self.composite_with(src, x, y, |cell| Cell::new(cell.ch, color));
    }

    fn composite_with(&mut self, src: &Grid, x: i32, y: i32, map: impl Fn(Cell) -> Cell) {
        for (sy, row) in (0_i32..).zip(src.cells.chunks(src.width.max(1))) {
            for (sx, cell) in (0_i32..).zip(row) {
                if let Some(cell) = cell.filter(|c| !c.is_blank()) {
                    self.set(x + sx, y + sy, Some(map(cell)));
                }
            }
        }
    }

    /// Clear every cell under `src`'s bounding rectangle placed at (x, y)
    ///
    /// The whole rectangle is cleared, including positions where `src`
    /// itself is transparent. An opaque layer with a sparse glyph pattern
    /// still blanks everything beneath its footprint.
    pub fn subtract(&mut self, src: &Grid, x: i32, y: i32) {
        let (w, h) = (to_i32(src.width), to_i32(src.height));
        for sy in 0..h {
            for sx in 0..w {
                self.set(x + sx, y + sy, None);
            }
        }
    }

    /// Iterate rows as slices of optional cells
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Cell>]> {
        (0..self.height).map(move |y| &self.cells[y * self.width..(y + 1) * self.width])
    }

    /// Render each row as a string, unset cells as spaces
    #[must_use]
    pub fn to_wire_rows(&self) -> Vec<String> {
        self.rows()
            .map(|row| row.iter().map(|c| c.map_or(' ', |c| c.ch)).collect())
            .collect()
    }
}

/// Saturating conversion for grid dimensions used as signed offsets
pub(crate) fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
