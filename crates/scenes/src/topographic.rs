//! Topographic contour map.
//!
//! Warped FBM terrain on a 2 px grid, bumped by the cursor and its trail,
//! drawn as 50 iso-lines with every fifth level emphasized as an index
//! contour. The field is not re-normalized after the cursor bumps, so a
//! strong bump pushes values past 1 and grows extra rings at the top of the
//! level range.

use backdrop_core::params::{param_bool, param_f64, param_f64_at_least, param_rgba, param_usize};
use backdrop_core::{
    draw_contours, BackdropError, ContourStyle, CursorInfluence, Frame, ProceduralField, Rgba,
    SaddlePolicy, Scene, Surface, WarpedFbmConfig,
};
use serde_json::{json, Value};

use crate::terrain::{
    influence_from_json, influence_params, influence_schema, merge_objects, terrain_from_json,
    terrain_params, terrain_schema,
};

/// Configuration for the topographic scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopographicParams {
    /// Pixel size of one grid cell.
    pub cell_size: f64,
    /// Number of evenly spaced iso-levels in (0, 1).
    pub num_levels: usize,
    /// Every n-th level is an index contour. 0 disables index contours.
    pub index_interval: usize,
    pub base_alpha: f64,
    pub index_alpha: f64,
    pub base_width: f64,
    pub index_width: f64,
    /// Resolve saddle cells with a center sample instead of drawing both
    /// diagonals.
    pub center_saddles: bool,
    pub color: Rgba,
    pub terrain: WarpedFbmConfig,
    pub influence: CursorInfluence,
}

impl Default for TopographicParams {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            num_levels: 50,
            index_interval: 5,
            base_alpha: 0.09,
            index_alpha: 0.22,
            base_width: 0.5,
            index_width: 1.0,
            center_saddles: false,
            color: Rgba::WHITE,
            terrain: WarpedFbmConfig::default(),
            influence: CursorInfluence::default(),
        }
    }
}

impl TopographicParams {
    /// Parse from JSON, falling back to defaults for missing fields.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            cell_size: param_f64_at_least(params, "cell_size", d.cell_size, 1.0),
            num_levels: param_usize(params, "num_levels", d.num_levels).max(1),
            index_interval: param_usize(params, "index_interval", d.index_interval),
            base_alpha: param_f64(params, "base_alpha", d.base_alpha),
            index_alpha: param_f64(params, "index_alpha", d.index_alpha),
            base_width: param_f64(params, "base_width", d.base_width),
            index_width: param_f64(params, "index_width", d.index_width),
            center_saddles: param_bool(params, "center_saddles", d.center_saddles),
            color: param_rgba(params, "color", d.color),
            terrain: terrain_from_json(params, d.terrain),
            influence: influence_from_json(params, d.influence),
        }
    }

    fn contour_style(&self) -> ContourStyle {
        ContourStyle {
            cell_size: self.cell_size,
            num_levels: self.num_levels,
            index_interval: self.index_interval,
            color: self.color,
            base_alpha: self.base_alpha,
            base_width: self.base_width,
            index_alpha: self.index_alpha,
            index_width: self.index_width,
            saddle: if self.center_saddles {
                SaddlePolicy::CenterSample
            } else {
                SaddlePolicy::BothDiagonals
            },
        }
    }
}

/// Contour-map scene over the shared warped-FBM pipeline.
#[derive(Debug, Clone)]
pub struct Topographic {
    params: TopographicParams,
    pipeline: ProceduralField,
}

impl Topographic {
    pub fn new(params: TopographicParams) -> Self {
        Self {
            pipeline: ProceduralField::new(params.terrain),
            params,
        }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(TopographicParams::from_json(params))
    }

    /// The field drawn by the last render.
    pub fn field(&self) -> &backdrop_core::ScalarField {
        self.pipeline.field()
    }
}

impl Default for Topographic {
    fn default() -> Self {
        Self::new(TopographicParams::default())
    }
}

impl Scene for Topographic {
    fn name(&self) -> &'static str {
        "topographic"
    }

    fn cell_size(&self) -> f64 {
        self.params.cell_size
    }

    fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
        self.pipeline.build(cols, rows)
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
        let p = &self.params;
        self.pipeline.sample(frame.elapsed);
        p.influence
            .deposit(self.pipeline.field_mut(), &frame.cursor, frame.min_dim(), p.cell_size);

        let field = self.pipeline.field();
        draw_contours(surface, field.data(), field.cols(), field.rows(), &p.contour_style());
    }

    fn params(&self) -> Value {
        let p = &self.params;
        merge_objects([
            json!({
                "cell_size": p.cell_size,
                "num_levels": p.num_levels,
                "index_interval": p.index_interval,
                "base_alpha": p.base_alpha,
                "index_alpha": p.index_alpha,
                "base_width": p.base_width,
                "index_width": p.index_width,
                "center_saddles": p.center_saddles,
                "color": p.color.to_hex(),
            }),
            terrain_params(&p.terrain),
            influence_params(&p.influence),
        ])
    }

    fn param_schema(&self) -> Value {
        let d = TopographicParams::default();
        merge_objects([
            json!({
                "cell_size": {
                    "type": "number",
                    "default": d.cell_size,
                    "min": 1.0,
                    "max": 16.0,
                    "description": "Pixel size of one grid cell"
                },
                "num_levels": {
                    "type": "integer",
                    "default": d.num_levels,
                    "min": 1,
                    "max": 200,
                    "description": "Number of iso-levels"
                },
                "index_interval": {
                    "type": "integer",
                    "default": d.index_interval,
                    "min": 0,
                    "max": 50,
                    "description": "Every n-th level is drawn as an index contour (0 disables)"
                },
                "base_alpha": {
                    "type": "number",
                    "default": d.base_alpha,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Opacity of ordinary contours"
                },
                "index_alpha": {
                    "type": "number",
                    "default": d.index_alpha,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Opacity of index contours"
                },
                "base_width": {
                    "type": "number",
                    "default": d.base_width,
                    "min": 0.1,
                    "max": 4.0,
                    "description": "Line width of ordinary contours"
                },
                "index_width": {
                    "type": "number",
                    "default": d.index_width,
                    "min": 0.1,
                    "max": 4.0,
                    "description": "Line width of index contours"
                },
                "center_saddles": {
                    "type": "boolean",
                    "default": d.center_saddles,
                    "description": "Resolve saddle cells with a center sample"
                },
                "color": {
                    "type": "string",
                    "default": d.color.to_hex(),
                    "description": "Line color as #rrggbb"
                }
            }),
            terrain_schema(&d.terrain),
            influence_schema(&d.influence),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::surface::DrawOp;
    use backdrop_core::{CursorState, RecordingSurface, TrailPeak};
    use glam::DVec2;

    fn frame(amp: f64, trail: &[TrailPeak], elapsed: f64) -> Frame<'_> {
        Frame {
            cursor: CursorState {
                raw: DVec2::splat(0.5),
                smoothed: DVec2::splat(0.5),
                velocity: DVec2::ZERO,
                amp,
                present: amp > 0.0,
                trail,
            },
            width: 160.0,
            height: 120.0,
            elapsed,
        }
    }

    fn built() -> Topographic {
        let mut scene = Topographic::default();
        scene.build(82, 62).unwrap();
        scene
    }

    // -- params --

    #[test]
    fn default_params() {
        let p = TopographicParams::default();
        assert_eq!(p.cell_size, 2.0);
        assert_eq!(p.num_levels, 50);
        assert_eq!(p.index_interval, 5);
        assert_eq!(p.terrain.seed, 42);
        assert_eq!(p.influence.cursor_amp, 0.42);
    }

    #[test]
    fn from_json_overrides_nested_groups() {
        let p = TopographicParams::from_json(&json!({
            "num_levels": 20,
            "seed": 9,
            "trail_sigma": 0.1,
            "center_saddles": true
        }));
        assert_eq!(p.num_levels, 20);
        assert_eq!(p.terrain.seed, 9);
        assert_eq!(p.influence.trail_sigma, 0.1);
        assert_eq!(p.contour_style().saddle, SaddlePolicy::CenterSample);
    }

    #[test]
    fn from_json_clamps_grid_parameters_to_minimums() {
        let p = TopographicParams::from_json(&json!({"cell_size": 1e-6, "num_levels": 0}));
        assert_eq!(p.cell_size, 1.0);
        assert_eq!(p.num_levels, 1);

        let p = TopographicParams::from_json(&json!({"cell_size": -3.0}));
        assert_eq!(p.cell_size, 1.0);
    }

    #[test]
    fn params_reload_to_same_values() {
        let scene = Topographic::from_json(&json!({"color": "#80ff00", "warp": 0.3}));
        let again = TopographicParams::from_json(&scene.params());
        assert_eq!(again, scene.params);
    }

    #[test]
    fn schema_describes_every_param() {
        let scene = Topographic::default();
        let schema = scene.param_schema();
        for key in scene.params().as_object().unwrap().keys() {
            let entry = schema.get(key).unwrap_or_else(|| panic!("missing {key}"));
            assert!(entry.get("type").is_some());
            assert!(entry.get("description").is_some());
        }
    }

    // -- rendering --

    #[test]
    fn render_strokes_two_passes() {
        let mut scene = built();
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(0.0, &[], 1.0));
        assert_eq!(surface.count(|op| matches!(op, DrawOp::Stroke)), 2);
        assert!(surface.count(|op| matches!(op, DrawOp::MoveTo(..))) > 0);
        assert!(surface
            .ops()
            .contains(&DrawOp::LineWidth(1.0)));
    }

    #[test]
    fn render_is_deterministic() {
        let mut a = built();
        let mut b = built();
        let mut sa = RecordingSurface::new();
        let mut sb = RecordingSurface::new();
        a.render(&mut sa, &frame(1.0, &[], 4.0));
        b.render(&mut sb, &frame(1.0, &[], 4.0));
        assert_eq!(sa.ops(), sb.ops());
    }

    #[test]
    fn cursor_bump_is_not_renormalized() {
        let mut plain = built();
        let mut bumped = built();
        let mut surface = RecordingSurface::new();
        plain.render(&mut surface, &frame(0.0, &[], 0.0));
        bumped.render(&mut surface, &frame(1.0, &[], 0.0));
        // cursor sits exactly on cell (41, 31)
        let k = 31 * 82 + 41;
        let lift = bumped.field().data()[k] - plain.field().data()[k];
        assert!((lift - 0.42).abs() < 1e-12);
    }

    #[test]
    fn trail_changes_the_drawing() {
        let trail = [TrailPeak {
            x: 0.2,
            y: 0.3,
            amp: 1.0,
        }];
        let mut a = built();
        let mut b = built();
        let mut sa = RecordingSurface::new();
        let mut sb = RecordingSurface::new();
        a.render(&mut sa, &frame(0.0, &[], 2.0));
        b.render(&mut sb, &frame(0.0, &trail, 2.0));
        assert_ne!(sa.ops(), sb.ops());
    }

    #[test]
    fn zero_index_interval_draws_one_pass() {
        let mut scene = Topographic::from_json(&json!({"index_interval": 0}));
        scene.build(40, 30).unwrap();
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(0.0, &[], 0.0));
        assert_eq!(surface.count(|op| matches!(op, DrawOp::Stroke)), 1);
    }

    #[test]
    fn build_rejects_empty_grid() {
        let mut scene = Topographic::default();
        assert!(scene.build(0, 3).is_err());
    }

    #[test]
    fn animates_forever() {
        assert!(!built().is_settled());
    }
}
