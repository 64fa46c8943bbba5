//! Colour Table and Themes
//!
//! Every cell carries a palette code. Code 0 means "theme colour" and is
//! substituted by the consumer; codes 1-255 index the fixed xterm-256
//! palette below.
//!
//! # Palette Layout
//!
//! ```text
//!   0..16    standard + bright ANSI colours
//!  16..232   6x6x6 colour cube, levels 0,95,135,175,215,255
//! 232..256   24-step gray ramp, 8 + 10*i
//! ```
//!
//! The table is built at compile time with const fns.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::THEME_COLOR;

/// RGB colour with 8-bit channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Create a colour from channels
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as floats in 0.0-1.0, the format display clients expect
    #[must_use]
    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Build from 0.0-1.0 float channels, clamping out-of-range values
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unit(channels: [f32; 3]) -> Self {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_u8(channels[0]), to_u8(channels[1]), to_u8(channels[2]))
    }
}

const STANDARD: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

#[allow(clippy::cast_possible_truncation)]
const fn build_palette() -> [Rgb; 256] {
    let mut table = [Rgb::new(0, 0, 0); 256];

    let mut i = 0;
    while i < 16 {
        table[i] = STANDARD[i];
        i += 1;
    }

    let mut n = 0;
    while n < 216 {
        let r = CUBE_LEVELS[n / 36];
        let g = CUBE_LEVELS[(n / 6) % 6];
        let b = CUBE_LEVELS[n % 6];
        table[16 + n] = Rgb::new(r, g, b);
        n += 1;
    }

    let mut k = 0;
    while k < 24 {
        let level = (8 + 10 * k) as u8;
        table[232 + k] = Rgb::new(level, level, level);
        k += 1;
    }

    table
}

/// The fixed 256-entry palette
pub const PALETTE: [Rgb; 256] = build_palette();

/// Palette lookups shared by the encoder and display consumers
pub struct ColorTable;

impl ColorTable {
    /// Raw palette entry for a code (code 0 is palette black)
    #[must_use]
    pub const fn rgb(code: u8) -> Rgb {
        PALETTE[code as usize]
    }

    /// Resolve a cell's palette code, substituting `theme` for code 0
    #[must_use]
    pub const fn resolve(code: u8, theme: Rgb) -> Rgb {
        if code == THEME_COLOR {
            theme
        } else {
            Self::rgb(code)
        }
    }
}

// =============================================================================
// Themes
// =============================================================================

/// Built-in colour themes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    /// Neutral grays with bright accents per status
    #[default]
    Modern,
    /// Amber phosphor terminal
    CrtAmber,
    /// Green phosphor terminal
    CrtGreen,
    /// Neon pinks and cyans
    Synthwave,
    /// Commodore 64 blues
    C64,
    /// Monochrome green rain
    Matrix,
}

impl ThemeName {
    /// All built-in themes
    pub const ALL: [ThemeName; 6] = [
        Self::Modern,
        Self::CrtAmber,
        Self::CrtGreen,
        Self::Synthwave,
        Self::C64,
        Self::Matrix,
    ];

    /// Canonical name as used in config files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::CrtAmber => "crt-amber",
            Self::CrtGreen => "crt-green",
            Self::Synthwave => "synthwave",
            Self::C64 => "c64",
            Self::Matrix => "matrix",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown theme '{s}'"))
    }
}

/// Per-status RGB table for one base theme plus user overrides
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    name: ThemeName,
    overrides: HashMap<String, Rgb>,
}

impl Theme {
    /// Create a theme with no overrides
    #[must_use]
    pub fn new(name: ThemeName) -> Self {
        Self {
            name,
            overrides: HashMap::new(),
        }
    }

    /// Replace the colour for one status
    #[must_use]
    pub fn with_override(mut self, status: impl Into<String>, rgb: Rgb) -> Self {
        self.overrides.insert(status.into(), rgb);
        self
    }

    /// Base theme name
    #[must_use]
    pub fn name(&self) -> ThemeName {
        self.name
    }

    /// Theme colour for a status; unknown statuses use the idle colour
    #[must_use]
    pub fn status_color(&self, status: &str) -> Rgb {
        if let Some(rgb) = self.overrides.get(status) {
            return *rgb;
        }
        base_color(self.name, status)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeName::default())
    }
}

fn base_color(theme: ThemeName, status: &str) -> Rgb {
    match theme {
        ThemeName::Modern => match status {
            "resting" => Rgb::new(102, 102, 115),
            "thinking" => Rgb::new(255, 222, 0),
            "running" | "executing" => Rgb::new(0, 255, 171),
            "awaiting" | "reading" | "writing" => Rgb::new(102, 128, 255),
            "reviewing" => Rgb::new(255, 0, 255),
            _ => Rgb::new(135, 135, 135),
        },
        ThemeName::CrtAmber => match status {
            "resting" | "offline" => Rgb::new(128, 76, 0),
            "thinking" | "reviewing" => Rgb::new(255, 204, 0),
            "running" | "executing" | "writing" => Rgb::new(255, 176, 0),
            _ => Rgb::new(204, 136, 0),
        },
        ThemeName::CrtGreen => match status {
            "resting" | "offline" => Rgb::new(0, 102, 34),
            "thinking" | "reviewing" => Rgb::new(170, 255, 170),
            "running" | "executing" | "writing" => Rgb::new(51, 255, 102),
            _ => Rgb::new(0, 204, 68),
        },
        ThemeName::Synthwave => match status {
            "resting" | "offline" => Rgb::new(97, 63, 140),
            "thinking" => Rgb::new(255, 214, 0),
            "running" | "executing" => Rgb::new(255, 41, 117),
            "awaiting" | "reading" | "writing" => Rgb::new(0, 240, 255),
            "reviewing" => Rgb::new(242, 34, 255),
            _ => Rgb::new(140, 30, 255),
        },
        ThemeName::C64 => match status {
            "resting" | "offline" => Rgb::new(80, 69, 155),
            "thinking" => Rgb::new(237, 241, 113),
            "running" | "executing" => Rgb::new(169, 255, 159),
            "reviewing" => Rgb::new(160, 87, 163),
            _ => Rgb::new(134, 122, 222),
        },
        ThemeName::Matrix => match status {
            "resting" | "offline" => Rgb::new(0, 59, 0),
            "thinking" | "reviewing" => Rgb::new(180, 255, 180),
            _ => Rgb::new(0, 255, 65),
        },
    }
}
