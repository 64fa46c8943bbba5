//! Layered Compositor
//!
//! Manages z-ordered layers and flattens them into one canvas-sized grid per
//! tick. Each layer carries an origin function, so positions are recomputed
//! from the canvas size and the layer's rendered size on every frame.
//!
//! # Compositing
//!
//! ```text
//!   canvas = empty W x H grid
//!   for layer in ascending (z, insertion order):
//!       grid   = layer.render(fill ? canvas : preferred size)
//!       origin = origin_fn(canvas size, grid size)
//!       if subtracts: clear grid's bounding box on canvas
//!       composite grid (spaces and unset cells are transparent)
//! ```
//!
//! A layer that fails to render is logged and skipped for that tick; the
//! rest of the frame is still produced.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::grid::Grid;
use crate::layers::Layer;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u32);

/// Computes a layer's top-left corner from `(canvas size, layer size)`
pub type OriginFn = Arc<dyn Fn((usize, usize), (usize, usize)) -> (i32, i32) + Send + Sync>;

/// Origin function that always returns `(x, y)`
#[must_use]
pub fn fixed_origin(x: i32, y: i32) -> OriginFn {
    Arc::new(move |_, _| (x, y))
}

struct Slot {
    layer: Layer,
    z_index: i32,
    origin: OriginFn,
    subtracts: bool,
    visible: bool,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("layer", &self.layer.kind())
            .field("z_index", &self.z_index)
            .field("subtracts", &self.subtracts)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// The compositor owns all layers and composites them together
#[derive(Debug)]
pub struct Compositor {
    /// All layers by ID
    slots: HashMap<LayerId, Slot>,
    /// Layer IDs sorted by (z-index, ID)
    render_order: Vec<LayerId>,
    /// Next layer ID to assign
    next_id: u32,
    width: usize,
    height: usize,
}

impl Compositor {
    /// Create a compositor for a `width` x `height` canvas
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            slots: HashMap::new(),
            render_order: Vec::new(),
            next_id: 0,
            width,
            height,
        }
    }

    /// Canvas size
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Resize the canvas; origins follow on the next render
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Add a layer at (0, 0) and return its ID
    ///
    /// Opaque layers (face, context bar) subtract by default.
    pub fn add_layer(&mut self, layer: impl Into<Layer>, z_index: i32) -> LayerId {
        let layer = layer.into();
        let id = LayerId(self.next_id);
        self.next_id += 1;

        let subtracts = layer.is_opaque();
        self.slots.insert(
            id,
            Slot {
                layer,
                z_index,
                origin: fixed_origin(0, 0),
                subtracts,
                visible: true,
            },
        );
        self.update_render_order();
        id
    }

    /// Remove a layer, returning it
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let slot = self.slots.remove(&id)?;
        self.update_render_order();
        Some(slot.layer)
    }

    /// Replace a layer's origin function
    pub fn set_origin(&mut self, id: LayerId, origin: OriginFn) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.origin = origin;
        }
    }

    /// Set whether a layer clears its bounding box before compositing
    pub fn set_subtracts(&mut self, id: LayerId, subtracts: bool) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.subtracts = subtracts;
        }
    }

    /// Set a layer's z-index
    pub fn set_z_index(&mut self, id: LayerId, z_index: i32) {
        if let Some(slot) = self.slots.get_mut(&id) {
            if slot.z_index != z_index {
                slot.z_index = z_index;
                self.update_render_order();
            }
        }
    }

    /// Set layer visibility
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.visible = visible;
        }
    }

    /// Shared access to a layer
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.slots.get(&id).map(|s| &s.layer)
    }

    /// Mutable access to a layer, for state updates between ticks
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.slots.get_mut(&id).map(|s| &mut s.layer)
    }

    /// Layer IDs back to front
    #[must_use]
    pub fn render_order(&self) -> &[LayerId] {
        &self.render_order
    }

    /// Render every visible layer back to front into a fresh canvas
    pub fn render(&mut self) -> Grid {
        let canvas_size = (self.width, self.height);
        let mut canvas = Grid::new(self.width, self.height);

        for id in &self.render_order {
            let Some(slot) = self.slots.get_mut(id) else {
                continue;
            };
            if !slot.visible {
                continue;
            }

            let size = if slot.layer.fills() {
                canvas_size
            } else {
                slot.layer.preferred_size()
            };

            match slot.layer.render(size) {
                Ok(grid) => {
                    let (x, y) = (slot.origin)(canvas_size, grid.size());
                    if slot.subtracts {
                        canvas.subtract(&grid, x, y);
                    }
                    canvas.composite(&grid, x, y);
                }
                Err(e) => {
                    tracing::warn!(layer = slot.layer.kind(), error = %e, "Skipping layer this tick");
                }
            }
        }

        canvas
    }

    /// Update render order based on z-indices, ties broken by ID
    fn update_render_order(&mut self) {
        self.render_order = self.slots.keys().copied().collect();
        let slots = &self.slots;
        self.render_order
            .sort_by_key(|id| (slots.get(id).map_or(0, |s| s.z_index), *id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::TextLayer;
    use pretty_assertions::assert_eq;

    fn solid(width: usize, height: usize, ch: char, color: u8) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 0..height {
            grid.put_str(0, crate::grid::to_i32(y), &ch.to_string().repeat(width), color);
        }
        grid
    }

    // =========================================================================
    // Ordering Tests
    // =========================================================================

    #[test]
    fn test_higher_z_draws_on_top() {
        let mut compositor = Compositor::new(3, 1);
        let top = compositor.add_layer(solid(3, 1, 'b', 2), 5);
        compositor.add_layer(solid(3, 1, 'a', 1), 0);
        assert_eq!(compositor.render().to_wire_rows(), vec!["bbb"]);

        compositor.set_z_index(top, -1);
        assert_eq!(compositor.render().to_wire_rows(), vec!["aaa"]);
    }

    #[test]
    fn test_equal_z_keeps_insertion_order() {
        let mut compositor = Compositor::new(1, 1);
        compositor.add_layer(solid(1, 1, 'a', 1), 0);
        compositor.add_layer(solid(1, 1, 'b', 1), 0);
        assert_eq!(compositor.render().to_wire_rows(), vec!["b"]);
    }

    #[test]
    fn test_hidden_layer_skipped() {
        let mut compositor = Compositor::new(2, 1);
        let id = compositor.add_layer(solid(2, 1, 'x', 1), 0);
        compositor.set_visible(id, false);
        assert!(compositor.render().is_blank());
    }

    // =========================================================================
    // Transparency And Subtraction Tests
    // =========================================================================

    #[test]
    fn test_spaces_are_transparent() {
        let mut compositor = Compositor::new(3, 1);
        compositor.add_layer(solid(3, 1, '#', 1), 0);
        compositor.add_layer(Grid::from_text("a c", '\0', 2), 1);
        assert_eq!(compositor.render().to_wire_rows(), vec!["a#c"]);
    }

    #[test]
    fn test_subtract_clears_footprint_before_composite() {
        let mut compositor = Compositor::new(5, 3);
        compositor.add_layer(solid(5, 3, '#', 1), 0);
        let top = compositor.add_layer(Grid::from_text("a c", '\0', 2), 1);
        compositor.set_origin(top, fixed_origin(1, 1));
        compositor.set_subtracts(top, true);
        assert_eq!(
            compositor.render().to_wire_rows(),
            vec!["#####", "#a c#", "#####"]
        );
    }

    #[test]
    fn test_origin_sees_canvas_and_layer_size() {
        let mut compositor = Compositor::new(7, 1);
        let id = compositor.add_layer(solid(3, 1, 'x', 1), 0);
        compositor.set_origin(
            id,
            Arc::new(|(cw, _), (lw, _)| (crate::grid::to_i32((cw - lw) / 2), 0)),
        );
        assert_eq!(compositor.render().to_wire_rows(), vec!["  xxx  "]);
    }

    #[test]
    fn test_layers_clip_at_canvas_edge() {
        let mut compositor = Compositor::new(3, 1);
        let id = compositor.add_layer(solid(3, 1, 'x', 1), 0);
        compositor.set_origin(id, fixed_origin(-2, 0));
        assert_eq!(compositor.render().to_wire_rows(), vec!["x  "]);
    }

    // =========================================================================
    // Failure Tests
    // =========================================================================

    #[test]
    fn test_failing_layer_skipped() {
        let mut compositor = Compositor::new(3, 1);
        compositor.add_layer(solid(3, 1, 'a', 1), 0);
        let mut bad = TextLayer::default();
        bad.set_text("b\tb");
        compositor.add_layer(bad, 1);
        assert_eq!(compositor.render().to_wire_rows(), vec!["aaa"]);
    }

    #[test]
    fn test_remove_layer() {
        let mut compositor = Compositor::new(1, 1);
        let id = compositor.add_layer(solid(1, 1, 'a', 1), 0);
        assert!(compositor.remove_layer(id).is_some());
        assert!(compositor.render_order().is_empty());
        assert!(compositor.layer(id).is_none());
    }
}
