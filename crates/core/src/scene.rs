//! The `Scene` trait every visual style implements.
//!
//! The trait is object-safe so the engine can hold a `Box<dyn Scene>` and
//! swap styles at runtime.

use serde_json::Value;

use crate::cursor::CursorState;
use crate::error::BackdropError;
use crate::surface::Surface;

/// Everything a scene sees for one rendered frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub cursor: CursorState<'a>,
    /// Viewport width in CSS pixels.
    pub width: f64,
    /// Viewport height in CSS pixels.
    pub height: f64,
    /// Seconds since the scene was last built.
    pub elapsed: f64,
}

impl Frame<'_> {
    /// Shorter viewport side, in CSS pixels.
    pub fn min_dim(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// A pluggable visual style.
///
/// The engine sizes a grid of `ceil(W / cell_size) + 2` by
/// `ceil(H / cell_size) + 2` cells, calls [`Scene::build`] whenever that grid
/// changes, and [`Scene::render`] once per frame after clearing the surface.
pub trait Scene {
    /// Registry name, e.g. `"topographic"`.
    fn name(&self) -> &'static str;

    /// Pixel size of one grid cell.
    fn cell_size(&self) -> f64;

    /// (Re)allocates per-grid state. Buffers from a previous size must not be
    /// read afterwards.
    fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError>;

    /// Draws one frame.
    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>);

    /// Whether the scene has nothing left to animate. Scenes animate
    /// continuously unless they override this.
    fn is_settled(&self) -> bool {
        false
    }

    /// Releases scene resources before the scene is replaced.
    fn dispose(&mut self) {}

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters, their types, ranges, and defaults.
    fn param_schema(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};
    use glam::DVec2;
    use serde_json::json;

    struct Dots {
        cols: usize,
        rows: usize,
    }

    impl Scene for Dots {
        fn name(&self) -> &'static str {
            "dots"
        }

        fn cell_size(&self) -> f64 {
            10.0
        }

        fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
            if cols == 0 || rows == 0 {
                return Err(BackdropError::InvalidDimensions);
            }
            self.cols = cols;
            self.rows = rows;
            Ok(())
        }

        fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
            let p = frame.cursor.smoothed_px(frame.width, frame.height);
            surface.fill_rect(p.x, p.y, 1.0, 1.0);
        }

        fn params(&self) -> Value {
            json!({"cols": self.cols, "rows": self.rows})
        }

        fn param_schema(&self) -> Value {
            json!({"cols": {"type": "integer", "description": "Grid columns"}})
        }
    }

    fn frame(trail: &[crate::cursor::TrailPeak]) -> Frame<'_> {
        Frame {
            cursor: CursorState {
                raw: DVec2::splat(0.5),
                smoothed: DVec2::new(0.25, 0.5),
                velocity: DVec2::ZERO,
                amp: 1.0,
                present: true,
                trail,
            },
            width: 200.0,
            height: 100.0,
            elapsed: 0.0,
        }
    }

    #[test]
    fn scene_trait_is_object_safe() {
        let mut scene: Box<dyn Scene> = Box::new(Dots { cols: 0, rows: 0 });
        scene.build(3, 4).unwrap();
        assert_eq!(scene.params()["rows"], 4);
        assert!(!scene.is_settled());
        scene.dispose();
    }

    #[test]
    fn render_draws_through_dyn_surface() {
        let mut scene = Dots { cols: 0, rows: 0 };
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(&[]));
        assert_eq!(surface.ops(), &[DrawOp::FillRect(50.0, 50.0, 1.0, 1.0)]);
    }

    #[test]
    fn build_propagates_errors() {
        let mut scene = Dots { cols: 0, rows: 0 };
        assert!(scene.build(0, 5).is_err());
    }

    #[test]
    fn frame_min_dim() {
        assert_eq!(frame(&[]).min_dim(), 100.0);
    }
}
