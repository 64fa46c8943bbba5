//! Built-in particle shapes
//!
//! Shapes are text art with space as the transparency marker. Multi-line
//! clouds and fog patches are drawn as one sprite so they drift as a unit.

use std::collections::HashMap;
use std::sync::Arc;

use super::Sprite;
use crate::error::SpriteError;

/// Shape name and text art
pub const SHAPES: &[(&str, &str)] = &[
    // Snow
    ("snow_star", "*"),
    ("snow_plus", "+"),
    ("snow_x", "x"),
    ("snow_dot", "."),
    ("snow_o", "o"),
    // Rain
    ("rain_drop", "|"),
    ("rain_colon", ":"),
    ("rain_tick", "'"),
    ("rain_comma", ","),
    // Fog and cloud singles
    ("fog_dot", "."),
    ("fog_tilde", "~"),
    ("fog_dash", "-"),
    // Wind streaks
    ("wind_tilde", "~"),
    ("wind_dash", "-"),
    ("wind_tick", "'"),
    ("wind_back", "`"),
    ("wind_arrow", ">"),
    ("wind_paren", ")"),
    ("wind_slash", "/"),
    // Clouds
    ("cloud_small", " ~ \n~~~"),
    ("cloud_medium", " ~~~ \n~~~~~\n ~~~ "),
    ("cloud_wisp", "~-~"),
    ("cloud_puff", " ~ \n~~~\n ~ "),
    // Fog patches
    ("fog_patch", ". .\n . "),
    ("fog_bank", "...\n. ."),
];

/// Parsed shapes keyed by name
#[derive(Clone, Debug)]
pub struct ShapeCatalog {
    sprites: HashMap<&'static str, Arc<Sprite>>,
}

impl ShapeCatalog {
    /// Parse every built-in shape
    ///
    /// # Errors
    ///
    /// Only fails if a built-in shape is malformed.
    pub fn builtin() -> Result<Self, SpriteError> {
        let sprites = SHAPES
            .iter()
            .map(|(name, art)| Ok((*name, Arc::new(Sprite::from_text(art)?))))
            .collect::<Result<_, SpriteError>>()?;
        Ok(Self { sprites })
    }

    /// Look up one shape
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Sprite>> {
        self.sprites.get(name).cloned()
    }

    /// Look up several shapes, skipping unknown names
    ///
    /// Names may repeat to weight the random pick.
    #[must_use]
    pub fn variants(&self, names: &[&str]) -> Vec<Arc<Sprite>> {
        names.iter().filter_map(|name| self.get(name)).collect()
    }

    /// Number of shapes
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// True when the catalog holds no shapes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses_every_shape() {
        let catalog = ShapeCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), SHAPES.len());
    }

    #[test]
    fn test_multiline_shapes() {
        let catalog = ShapeCatalog::builtin().unwrap();
        assert_eq!(catalog.get("cloud_medium").unwrap().size(), (5, 3));
        assert_eq!(catalog.get("cloud_small").unwrap().size(), (3, 2));
    }

    #[test]
    fn test_variants_keep_weighting_and_skip_unknown() {
        let catalog = ShapeCatalog::builtin().unwrap();
        let variants = catalog.variants(&["rain_drop", "rain_drop", "nope"]);
        assert_eq!(variants.len(), 2);
        assert!(Arc::ptr_eq(&variants[0], &variants[1]));
    }
}
