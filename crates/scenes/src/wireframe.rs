//! Perspective wireframe terrain.
//!
//! A fixed world-space grid of FBM heights scrolls toward the camera and is
//! projected through a pinhole camera. The cursor and each trail peak are
//! mapped back onto the ground plane and raise Gaussian hills there. Edges
//! are drawn by depth band, fading with distance and toward the side edges
//! of the viewport, with every fifth row emphasized as a scan line.

use backdrop_core::params::{param_f64, param_rgba, param_u32, param_usize};
use backdrop_core::pipeline::PRESENCE_CUTOFF;
use backdrop_core::{BackdropError, Fbm, Frame, GradientNoise, LineCap, Rgba, Scene, Surface};
use glam::DVec2;
use serde_json::{json, Value};

/// Edges whose final opacity falls below this are skipped.
const MIN_EDGE_ALPHA: f64 = 0.005;

/// Depth bands as `(min, max, alpha factor)`; `max` is exclusive.
const DEPTH_BANDS: [(f64, f64, f64); 4] = [
    (0.0, 0.25, 1.0),
    (0.25, 0.5, 0.65),
    (0.5, 0.75, 0.35),
    (0.75, 1.0, 0.15),
];

/// Configuration for the wireframe scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireframeParams {
    pub grid_cols: usize,
    pub grid_rows: usize,
    /// Focal length in pixels.
    pub focal_length: f64,
    pub camera_height: f64,
    /// Horizon position as a fraction of viewport height.
    pub vanish_ratio: f64,
    pub near_z: f64,
    pub far_z: f64,
    pub noise_freq: f64,
    pub height_scale: f64,
    /// World units per second the terrain scrolls toward the camera.
    pub scroll_speed: f64,
    pub seed: u32,
    pub octaves: u32,
    pub line_width: f64,
    /// Every n-th row is a scan line. 0 disables scan lines.
    pub scan_line_interval: usize,
    pub base_alpha: f64,
    pub scan_line_alpha: f64,
    /// Fraction of the viewport width over which edges fade out at each side.
    pub edge_fade: f64,
    pub cursor_strength: f64,
    pub cursor_sigma: f64,
    pub trail_strength: f64,
    pub trail_sigma: f64,
    pub color: Rgba,
}

impl Default for WireframeParams {
    fn default() -> Self {
        Self {
            grid_cols: 90,
            grid_rows: 70,
            focal_length: 600.0,
            camera_height: 3.5,
            vanish_ratio: 0.35,
            near_z: 2.0,
            far_z: 50.0,
            noise_freq: 0.35,
            height_scale: 2.2,
            scroll_speed: 0.3,
            seed: 73,
            octaves: 5,
            line_width: 0.5,
            scan_line_interval: 5,
            base_alpha: 0.5,
            scan_line_alpha: 0.5,
            edge_fade: 0.15,
            cursor_strength: 3.0,
            cursor_sigma: 2.5,
            trail_strength: 1.8,
            trail_sigma: 2.0,
            color: Rgba::WHITE,
        }
    }
}

impl WireframeParams {
    /// Parse from JSON, falling back to defaults for missing fields. Grid
    /// dimensions below 2 are raised to 2.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            grid_cols: param_usize(params, "grid_cols", d.grid_cols).max(2),
            grid_rows: param_usize(params, "grid_rows", d.grid_rows).max(2),
            focal_length: param_f64(params, "focal_length", d.focal_length),
            camera_height: param_f64(params, "camera_height", d.camera_height),
            vanish_ratio: param_f64(params, "vanish_ratio", d.vanish_ratio),
            near_z: param_f64(params, "near_z", d.near_z),
            far_z: param_f64(params, "far_z", d.far_z),
            noise_freq: param_f64(params, "noise_freq", d.noise_freq),
            height_scale: param_f64(params, "height_scale", d.height_scale),
            scroll_speed: param_f64(params, "scroll_speed", d.scroll_speed),
            seed: param_u32(params, "seed", d.seed),
            octaves: param_u32(params, "octaves", d.octaves),
            line_width: param_f64(params, "line_width", d.line_width),
            scan_line_interval: param_usize(params, "scan_line_interval", d.scan_line_interval),
            base_alpha: param_f64(params, "base_alpha", d.base_alpha),
            scan_line_alpha: param_f64(params, "scan_line_alpha", d.scan_line_alpha),
            edge_fade: param_f64(params, "edge_fade", d.edge_fade),
            cursor_strength: param_f64(params, "cursor_strength", d.cursor_strength),
            cursor_sigma: param_f64(params, "cursor_sigma", d.cursor_sigma),
            trail_strength: param_f64(params, "trail_strength", d.trail_strength),
            trail_sigma: param_f64(params, "trail_sigma", d.trail_sigma),
            color: param_rgba(params, "color", d.color),
        }
    }

    fn is_scan_row(&self, row: usize) -> bool {
        self.scan_line_interval != 0 && row % self.scan_line_interval == 0
    }
}

/// Pinhole camera for one frame.
#[derive(Debug, Clone, Copy)]
struct Camera {
    width: f64,
    height: f64,
    focal: f64,
    cam_height: f64,
    vanish_y: f64,
}

impl Camera {
    /// Ground-plane `(x, z)` under a normalized screen position.
    fn unproject(&self, n: DVec2) -> DVec2 {
        let z = self.cam_height * self.focal / (n.y * self.height - self.vanish_y).max(1.0);
        let x = (n.x - 0.5) * z * (self.width / self.focal);
        DVec2::new(x, z)
    }

    fn project(&self, x: f64, y: f64, z: f64) -> DVec2 {
        DVec2::new(
            x / z * self.focal + self.width / 2.0,
            (self.cam_height - y) / z * self.focal + self.vanish_y,
        )
    }
}

/// Horizontal fade factor for an x coordinate. Negative off-screen left.
fn edge_alpha(sx: f64, width: f64, fade: f64) -> f64 {
    let left = width * fade;
    let right = width * (1.0 - fade);
    if sx < left {
        sx / left
    } else if sx > right {
        (width - sx) / (width - right)
    } else {
        1.0
    }
}

/// Scrolling perspective terrain mesh.
#[derive(Debug, Clone)]
pub struct Wireframe {
    params: WireframeParams,
    fbm: Fbm<GradientNoise>,
    screen: Vec<DVec2>,
    depth: Vec<f64>,
    heights: Vec<f64>,
}

impl Wireframe {
    pub fn new(params: WireframeParams) -> Self {
        Self {
            fbm: Fbm::seeded(params.seed, params.octaves),
            params,
            screen: Vec::new(),
            depth: Vec::new(),
            heights: Vec::new(),
        }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(WireframeParams::from_json(params))
    }

    /// World heights of the last rendered mesh, row-major, nearest row first.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    fn vertex_count(&self) -> usize {
        self.params.grid_cols * self.params.grid_rows
    }

    fn build_mesh(&mut self, frame: &Frame<'_>) {
        let p = self.params;
        let cam = Camera {
            width: frame.width,
            height: frame.height,
            focal: p.focal_length,
            cam_height: p.camera_height,
            vanish_y: frame.height * p.vanish_ratio,
        };
        let scroll = frame.elapsed * p.scroll_speed;
        let x_span = (frame.width / p.focal_length) * p.far_z * 0.6;
        let cursor_world = cam.unproject(frame.cursor.smoothed);
        let cursor_active = frame.cursor.amp > PRESENCE_CUTOFF;
        let peaks: Vec<(DVec2, f64)> = frame
            .cursor
            .trail
            .iter()
            .map(|peak| (cam.unproject(DVec2::new(peak.x, peak.y)), peak.amp))
            .collect();

        let (cols, rows) = (p.grid_cols, p.grid_rows);
        for r in 0..rows {
            let wz = p.near_z + (r as f64 / (rows - 1) as f64) * (p.far_z - p.near_z);
            for c in 0..cols {
                let idx = r * cols + c;
                let wx = (c as f64 / (cols - 1) as f64 - 0.5) * x_span;
                let mut wy = self
                    .fbm
                    .sample(wx * p.noise_freq, (wz + scroll) * p.noise_freq)
                    * p.height_scale;

                if cursor_active {
                    wy += gaussian(wx, wz, cursor_world, p.cursor_sigma)
                        * p.cursor_strength
                        * frame.cursor.amp;
                }
                for &(at, amp) in &peaks {
                    wy += gaussian(wx, wz, at, p.trail_sigma) * p.trail_strength * amp;
                }

                self.heights[idx] = wy;
                self.screen[idx] = cam.project(wx, wy, wz);
                self.depth[idx] = (wz - p.near_z) / (p.far_z - p.near_z);
            }
        }
    }

    /// Strokes one edge if it falls in `band` and is visible enough.
    #[allow(clippy::too_many_arguments)]
    fn stroke_edge(
        &self,
        surface: &mut dyn Surface,
        i0: usize,
        i1: usize,
        band: (f64, f64),
        alpha: f64,
        width: f64,
    ) {
        let d = (self.depth[i0] + self.depth[i1]) * 0.5;
        if d < band.0 || d >= band.1 {
            return;
        }
        let (a, b) = (self.screen[i0], self.screen[i1]);
        let fade = self.params.edge_fade;
        let alpha = alpha * (1.0 - d) * edge_alpha(a.x, width, fade).min(edge_alpha(b.x, width, fade));
        if alpha < MIN_EDGE_ALPHA {
            return;
        }
        surface.set_stroke_color(self.params.color.with_alpha(alpha));
        surface.begin_path();
        surface.move_to(a.x, a.y);
        surface.line_to(b.x, b.y);
        surface.stroke();
    }

    fn draw_rows(&self, surface: &mut dyn Surface, band: (f64, f64), alpha: f64, scan: bool, width: f64) {
        let (cols, rows) = (self.params.grid_cols, self.params.grid_rows);
        for r in (0..rows).filter(|&r| self.params.is_scan_row(r) == scan) {
            for c in 0..cols - 1 {
                let i0 = r * cols + c;
                self.stroke_edge(surface, i0, i0 + 1, band, alpha, width);
            }
        }
    }

    fn draw_columns(&self, surface: &mut dyn Surface, band: (f64, f64), alpha: f64, width: f64) {
        let (cols, rows) = (self.params.grid_cols, self.params.grid_rows);
        for c in 0..cols {
            for r in 0..rows - 1 {
                let i0 = r * cols + c;
                self.stroke_edge(surface, i0, i0 + cols, band, alpha, width);
            }
        }
    }
}

fn gaussian(wx: f64, wz: f64, at: DVec2, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    let dx = (wx - at.x) / sigma;
    let dz = (wz - at.y) / sigma;
    (-0.5 * (dx * dx + dz * dz)).exp()
}

impl Default for Wireframe {
    fn default() -> Self {
        Self::new(WireframeParams::default())
    }
}

impl Scene for Wireframe {
    fn name(&self) -> &'static str {
        "wireframe"
    }

    /// The mesh has its own resolution; the engine grid only needs to exist.
    fn cell_size(&self) -> f64 {
        100.0
    }

    fn build(&mut self, _cols: usize, _rows: usize) -> Result<(), BackdropError> {
        let n = self.vertex_count();
        self.screen = vec![DVec2::ZERO; n];
        self.depth = vec![0.0; n];
        self.heights = vec![0.0; n];
        tracing::debug!(vertices = n, "wireframe mesh allocated");
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
        if self.screen.len() != self.vertex_count() {
            return;
        }
        self.build_mesh(frame);

        let p = self.params;
        surface.set_line_cap(LineCap::Round);
        surface.set_line_width(p.line_width);
        for &(min, max, factor) in &DEPTH_BANDS {
            let band = (min, max);
            self.draw_rows(surface, band, p.base_alpha * factor, false, frame.width);
            self.draw_rows(surface, band, p.scan_line_alpha, true, frame.width);
            self.draw_columns(surface, band, p.base_alpha * factor, frame.width);
        }
    }

    fn dispose(&mut self) {
        self.screen = Vec::new();
        self.depth = Vec::new();
        self.heights = Vec::new();
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "grid_cols": p.grid_cols,
            "grid_rows": p.grid_rows,
            "focal_length": p.focal_length,
            "camera_height": p.camera_height,
            "vanish_ratio": p.vanish_ratio,
            "near_z": p.near_z,
            "far_z": p.far_z,
            "noise_freq": p.noise_freq,
            "height_scale": p.height_scale,
            "scroll_speed": p.scroll_speed,
            "seed": p.seed,
            "octaves": p.octaves,
            "line_width": p.line_width,
            "scan_line_interval": p.scan_line_interval,
            "base_alpha": p.base_alpha,
            "scan_line_alpha": p.scan_line_alpha,
            "edge_fade": p.edge_fade,
            "cursor_strength": p.cursor_strength,
            "cursor_sigma": p.cursor_sigma,
            "trail_strength": p.trail_strength,
            "trail_sigma": p.trail_sigma,
            "color": p.color.to_hex(),
        })
    }

    fn param_schema(&self) -> Value {
        let d = WireframeParams::default();
        json!({
            "grid_cols": {
                "type": "integer",
                "default": d.grid_cols,
                "min": 2,
                "max": 400,
                "description": "Mesh vertices across"
            },
            "grid_rows": {
                "type": "integer",
                "default": d.grid_rows,
                "min": 2,
                "max": 400,
                "description": "Mesh vertices in depth"
            },
            "focal_length": {
                "type": "number",
                "default": d.focal_length,
                "min": 50.0,
                "max": 4000.0,
                "description": "Camera focal length in pixels"
            },
            "camera_height": {
                "type": "number",
                "default": d.camera_height,
                "min": 0.1,
                "max": 50.0,
                "description": "Camera height above the ground plane"
            },
            "vanish_ratio": {
                "type": "number",
                "default": d.vanish_ratio,
                "min": 0.0,
                "max": 1.0,
                "description": "Horizon position as a fraction of viewport height"
            },
            "near_z": {
                "type": "number",
                "default": d.near_z,
                "min": 0.1,
                "max": 100.0,
                "description": "Depth of the nearest mesh row"
            },
            "far_z": {
                "type": "number",
                "default": d.far_z,
                "min": 1.0,
                "max": 1000.0,
                "description": "Depth of the farthest mesh row"
            },
            "noise_freq": {
                "type": "number",
                "default": d.noise_freq,
                "min": 0.01,
                "max": 5.0,
                "description": "Terrain noise frequency per world unit"
            },
            "height_scale": {
                "type": "number",
                "default": d.height_scale,
                "min": 0.0,
                "max": 20.0,
                "description": "Terrain height amplitude"
            },
            "scroll_speed": {
                "type": "number",
                "default": d.scroll_speed,
                "min": 0.0,
                "max": 10.0,
                "description": "World units per second the terrain moves toward the camera"
            },
            "seed": {
                "type": "integer",
                "default": d.seed,
                "description": "Seed of the terrain noise"
            },
            "octaves": {
                "type": "integer",
                "default": d.octaves,
                "min": 1,
                "max": 8,
                "description": "FBM octaves of the terrain noise"
            },
            "line_width": {
                "type": "number",
                "default": d.line_width,
                "min": 0.1,
                "max": 4.0,
                "description": "Edge line width"
            },
            "scan_line_interval": {
                "type": "integer",
                "default": d.scan_line_interval,
                "min": 0,
                "max": 100,
                "description": "Every n-th row is a bright scan line (0 disables)"
            },
            "base_alpha": {
                "type": "number",
                "default": d.base_alpha,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of the nearest depth band"
            },
            "scan_line_alpha": {
                "type": "number",
                "default": d.scan_line_alpha,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of scan lines before depth fade"
            },
            "edge_fade": {
                "type": "number",
                "default": d.edge_fade,
                "min": 0.01,
                "max": 0.5,
                "description": "Width of the side fade as a fraction of the viewport"
            },
            "cursor_strength": {
                "type": "number",
                "default": d.cursor_strength,
                "min": 0.0,
                "max": 20.0,
                "description": "Height of the hill raised under the cursor"
            },
            "cursor_sigma": {
                "type": "number",
                "default": d.cursor_sigma,
                "min": 0.1,
                "max": 20.0,
                "description": "Cursor hill width in world units"
            },
            "trail_strength": {
                "type": "number",
                "default": d.trail_strength,
                "min": 0.0,
                "max": 20.0,
                "description": "Height of trail hills"
            },
            "trail_sigma": {
                "type": "number",
                "default": d.trail_sigma,
                "min": 0.1,
                "max": 20.0,
                "description": "Trail hill width in world units"
            },
            "color": {
                "type": "string",
                "default": d.color.to_hex(),
                "description": "Line color as #rrggbb"
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::surface::DrawOp;
    use backdrop_core::{CursorState, Paint, RecordingSurface, TrailPeak};

    fn frame(smoothed: DVec2, amp: f64, trail: &[TrailPeak]) -> Frame<'_> {
        Frame {
            cursor: CursorState {
                raw: smoothed,
                smoothed,
                velocity: DVec2::ZERO,
                amp,
                present: amp > 0.0,
                trail,
            },
            width: 1200.0,
            height: 800.0,
            elapsed: 1.5,
        }
    }

    fn built(params: &Value) -> Wireframe {
        let mut scene = Wireframe::from_json(params);
        scene.build(14, 10).unwrap();
        scene
    }

    fn stroke_alphas(surface: &RecordingSurface) -> Vec<f64> {
        surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokePaint(Paint::Solid(c)) => Some(c.a),
                _ => None,
            })
            .collect()
    }

    // -- helpers --

    #[test]
    fn edge_alpha_ramps_at_both_sides() {
        assert_eq!(edge_alpha(0.0, 1000.0, 0.15), 0.0);
        assert!((edge_alpha(75.0, 1000.0, 0.15) - 0.5).abs() < 1e-12);
        assert_eq!(edge_alpha(500.0, 1000.0, 0.15), 1.0);
        assert!((edge_alpha(925.0, 1000.0, 0.15) - 0.5).abs() < 1e-12);
        assert!(edge_alpha(-10.0, 1000.0, 0.15) < 0.0);
    }

    #[test]
    fn unproject_inverts_ground_projection() {
        let cam = Camera {
            width: 1200.0,
            height: 800.0,
            focal: 600.0,
            cam_height: 3.5,
            vanish_y: 280.0,
        };
        let ground = cam.unproject(DVec2::new(0.7, 0.8));
        let back = cam.project(ground.x, 0.0, ground.y);
        assert!((back.x - 0.7 * 1200.0).abs() < 1e-9);
        assert!((back.y - 0.8 * 800.0).abs() < 1e-9);
    }

    #[test]
    fn unproject_clamps_above_horizon() {
        let cam = Camera {
            width: 1200.0,
            height: 800.0,
            focal: 600.0,
            cam_height: 3.5,
            vanish_y: 280.0,
        };
        assert_eq!(cam.unproject(DVec2::new(0.5, 0.1)).y, 3.5 * 600.0);
    }

    // -- params --

    #[test]
    fn degenerate_grid_is_raised_to_two() {
        let p = WireframeParams::from_json(&json!({"grid_cols": 0, "grid_rows": 1}));
        assert_eq!((p.grid_cols, p.grid_rows), (2, 2));
    }

    #[test]
    fn params_reload_to_same_values() {
        let scene = Wireframe::from_json(&json!({"focal_length": 800.0, "seed": 3}));
        assert_eq!(WireframeParams::from_json(&scene.params()), scene.params);
        let schema = scene.param_schema();
        for key in scene.params().as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "missing {key}");
        }
    }

    // -- rendering --

    #[test]
    fn render_before_build_draws_nothing() {
        let mut scene = Wireframe::default();
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &[]));
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn every_edge_is_its_own_stroke() {
        let mut scene = built(&json!({}));
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &[]));
        let strokes = surface.count(|op| matches!(op, DrawOp::Stroke));
        assert!(strokes > 0);
        assert_eq!(strokes, surface.count(|op| matches!(op, DrawOp::BeginPath)));
        assert_eq!(strokes, surface.count(|op| matches!(op, DrawOp::MoveTo(..))));
        assert_eq!(surface.ops()[0], DrawOp::LineCap(LineCap::Round));
        assert_eq!(surface.ops()[1], DrawOp::LineWidth(0.5));
    }

    #[test]
    fn edge_alphas_respect_bounds() {
        let mut scene = built(&json!({}));
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &[]));
        for a in stroke_alphas(&surface) {
            assert!(a >= MIN_EDGE_ALPHA);
            assert!(a <= 0.5);
        }
    }

    #[test]
    fn cursor_raises_terrain_near_its_ground_point() {
        let mut calm = built(&json!({}));
        let mut lifted = built(&json!({}));
        let mut surface = RecordingSurface::new();
        calm.render(&mut surface, &frame(DVec2::new(0.5, 0.9), 0.0, &[]));
        lifted.render(&mut surface, &frame(DVec2::new(0.5, 0.9), 1.0, &[]));
        let diff: f64 = calm
            .heights()
            .iter()
            .zip(lifted.heights())
            .map(|(a, b)| b - a)
            .fold(0.0, f64::max);
        assert!(diff > 1.0);
        assert!(calm
            .heights()
            .iter()
            .zip(lifted.heights())
            .all(|(a, b)| b >= a));
    }

    #[test]
    fn trail_peaks_raise_terrain() {
        let trail = [TrailPeak {
            x: 0.3,
            y: 0.85,
            amp: 1.0,
        }];
        let mut calm = built(&json!({}));
        let mut lifted = built(&json!({}));
        let mut surface = RecordingSurface::new();
        calm.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &[]));
        lifted.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &trail));
        assert_ne!(calm.heights(), lifted.heights());
    }

    #[test]
    fn disabling_scan_lines_keeps_band_alphas_below_base() {
        let mut scene = built(&json!({"scan_line_interval": 0, "scan_line_alpha": 1.0}));
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, &frame(DVec2::splat(0.5), 0.0, &[]));
        assert!(stroke_alphas(&surface).iter().all(|&a| a <= 0.5));
    }

    #[test]
    fn dispose_releases_buffers() {
        let mut scene = built(&json!({}));
        scene.dispose();
        assert!(scene.heights().is_empty());
    }
}
