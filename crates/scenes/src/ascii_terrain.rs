//! ASCII terrain: the warped-FBM field rendered as a character density ramp.
//!
//! Each 10 px cell maps its normalized height to one of seven glyphs, nudged
//! up or down the ramp by a horizontally stretched wind layer. Near the
//! cursor a few cells flicker into interference glyphs. Glyphs are bucketed
//! by ramp index so each alpha band is set once per frame.

use backdrop_core::params::{param_f64, param_f64_at_least, param_rgba, param_u32};
use backdrop_core::pipeline::PRESENCE_CUTOFF;
use backdrop_core::{
    BackdropError, CursorInfluence, Fbm, Frame, GradientNoise, Lcg32, ProceduralField, Rgba,
    ScalarField, Scene, Surface, TextBaseline, WarpedFbmConfig,
};
use serde_json::{json, Value};

use crate::terrain::{
    influence_from_json, influence_params, influence_schema, merge_objects, terrain_from_json,
    terrain_params, terrain_schema,
};

/// Density ramp, light to heavy.
pub const RAMP: [char; 7] = [' ', '.', ':', '+', '*', '#', '@'];

/// Interference glyphs drawn near the cursor.
pub const GLITCH_CHARS: [char; 4] = ['|', '/', '\\', '-'];

const RAND_TABLE_LEN: usize = 1024;

/// Configuration for the ASCII terrain scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsciiTerrainParams {
    /// Pixel size of one character cell; also the font size.
    pub cell_size: f64,
    /// Opacity of the lightest ramp glyph.
    pub alpha_min: f64,
    /// Opacity of the heaviest ramp glyph.
    pub alpha_max: f64,
    pub breathe_speed: f64,
    pub breathe_amp: f64,
    pub wind_seed: u32,
    pub wind_octaves: u32,
    pub wind_scale: f64,
    pub wind_speed: f64,
    /// Largest ramp offset the wind layer applies.
    pub wind_strength: f64,
    /// Interference radius, in cells.
    pub interference_radius: f64,
    /// Interference probability at the cursor center.
    pub interference_chance: f64,
    pub interference_seed: u32,
    pub color: Rgba,
    pub terrain: WarpedFbmConfig,
    pub influence: CursorInfluence,
}

impl Default for AsciiTerrainParams {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            alpha_min: 0.08,
            alpha_max: 0.30,
            breathe_speed: 0.4,
            breathe_amp: 0.06,
            wind_seed: 317,
            wind_octaves: 3,
            wind_scale: 3.2,
            wind_speed: 0.035,
            wind_strength: 1.2,
            interference_radius: 15.0,
            interference_chance: 0.08,
            interference_seed: 9973,
            color: Rgba::WHITE,
            terrain: WarpedFbmConfig {
                seed: 73,
                octaves: 4,
                warp_seed: 211,
                warp_octaves: 2,
                scale: 2.6,
                warp: 0.40,
                drift_speed: 0.012,
                warp_drift_speed: 0.007,
                noise_step: 6,
            },
            influence: CursorInfluence {
                cursor_amp: 0.38,
                cursor_sigma: 0.08,
                trail_amp: 0.22,
                trail_sigma: 0.06,
            },
        }
    }
}

impl AsciiTerrainParams {
    /// Parse from JSON, falling back to defaults for missing fields.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            cell_size: param_f64_at_least(params, "cell_size", d.cell_size, 4.0),
            alpha_min: param_f64(params, "alpha_min", d.alpha_min),
            alpha_max: param_f64(params, "alpha_max", d.alpha_max),
            breathe_speed: param_f64(params, "breathe_speed", d.breathe_speed),
            breathe_amp: param_f64(params, "breathe_amp", d.breathe_amp),
            wind_seed: param_u32(params, "wind_seed", d.wind_seed),
            wind_octaves: param_u32(params, "wind_octaves", d.wind_octaves),
            wind_scale: param_f64(params, "wind_scale", d.wind_scale),
            wind_speed: param_f64(params, "wind_speed", d.wind_speed),
            wind_strength: param_f64(params, "wind_strength", d.wind_strength),
            interference_radius: param_f64(params, "interference_radius", d.interference_radius),
            interference_chance: param_f64(params, "interference_chance", d.interference_chance),
            interference_seed: param_u32(params, "interference_seed", d.interference_seed),
            color: param_rgba(params, "color", d.color),
            terrain: terrain_from_json(params, d.terrain),
            influence: influence_from_json(params, d.influence),
        }
    }

    /// Opacity of ramp band `band` before breathing.
    fn band_alpha(&self, band: usize) -> f64 {
        let t = band as f64 / (RAMP.len() - 1) as f64;
        self.alpha_min + t * (self.alpha_max - self.alpha_min)
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    ch: char,
    x: f64,
    y: f64,
}

/// Character-ramp scene over the shared warped-FBM pipeline.
#[derive(Debug, Clone)]
pub struct AsciiTerrain {
    params: AsciiTerrainParams,
    pipeline: ProceduralField,
    wind: Fbm<GradientNoise>,
    rand_table: Vec<f64>,
    bands: Vec<Vec<Glyph>>,
}

impl AsciiTerrain {
    pub fn new(params: AsciiTerrainParams) -> Self {
        let mut rng = Lcg32::new(params.interference_seed);
        let rand_table = (0..RAND_TABLE_LEN).map(|_| rng.next_f64()).collect();
        Self {
            pipeline: ProceduralField::new(params.terrain),
            wind: Fbm::seeded(params.wind_seed, params.wind_octaves),
            rand_table,
            bands: vec![Vec::new(); RAMP.len()],
            params,
        }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(AsciiTerrainParams::from_json(params))
    }

    /// The field drawn by the last render.
    pub fn field(&self) -> &ScalarField {
        self.pipeline.field()
    }

    /// Fills the alpha-band buckets for one frame.
    fn classify(&mut self, frame: &Frame<'_>) {
        let p = self.params;
        let field = self.pipeline.field();
        let (cols, rows) = (field.cols(), field.rows());
        let wind_drift = frame.elapsed * p.wind_speed;
        let top = RAMP.len() - 1;

        let cursor_col = frame.cursor.smoothed.x * cols as f64;
        let cursor_row = frame.cursor.smoothed.y * rows as f64;
        let cursor_active = frame.cursor.amp > PRESENCE_CUTOFF;

        for band in &mut self.bands {
            band.clear();
        }

        let mut rand_idx = 0_usize;
        for (j, row) in field.data().chunks_exact(cols).enumerate() {
            let y = j as f64 * p.cell_size;
            let wy = (j as f64 / rows as f64) * p.wind_scale * 0.3;
            for (i, &val) in row.iter().enumerate() {
                let base = ((val * (RAMP.len() as f64 - 0.001)).floor().max(0.0) as usize).min(top);

                let wx = (i as f64 / cols as f64) * p.wind_scale;
                let wind = self.wind.sample(wx + wind_drift, wy + wind_drift * 0.2);
                let offset = (wind * p.wind_strength).round() as isize;
                let idx = (base as isize + offset).clamp(0, top as isize) as usize;

                let mut ch = RAMP[idx];
                if cursor_active {
                    let dist = (i as f64 - cursor_col).hypot(j as f64 - cursor_row);
                    if dist < p.interference_radius {
                        let r = self.rand_table[rand_idx % self.rand_table.len()];
                        rand_idx += 1;
                        if r < p.interference_chance * (1.0 - dist / p.interference_radius) {
                            ch = GLITCH_CHARS[rand_idx & 3];
                        }
                    }
                }

                if ch == ' ' {
                    continue;
                }
                self.bands[idx].push(Glyph {
                    ch,
                    x: i as f64 * p.cell_size,
                    y,
                });
            }
        }
    }
}

impl Default for AsciiTerrain {
    fn default() -> Self {
        Self::new(AsciiTerrainParams::default())
    }
}

impl Scene for AsciiTerrain {
    fn name(&self) -> &'static str {
        "ascii-terrain"
    }

    fn cell_size(&self) -> f64 {
        self.params.cell_size
    }

    fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
        self.pipeline.build(cols, rows)
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
        let p = self.params;
        self.pipeline.sample(frame.elapsed);
        p.influence
            .deposit(self.pipeline.field_mut(), &frame.cursor, frame.min_dim(), p.cell_size);
        self.pipeline.field_mut().normalize();
        self.classify(frame);

        let breathe = 1.0 + (frame.elapsed * p.breathe_speed).sin() * p.breathe_amp;
        surface.set_font_size(p.cell_size);
        surface.set_text_baseline(TextBaseline::Top);
        surface.set_fill_color(p.color);

        let mut buf = [0_u8; 4];
        for (b, glyphs) in self.bands.iter().enumerate() {
            if glyphs.is_empty() {
                continue;
            }
            surface.set_global_alpha(p.band_alpha(b) * breathe);
            for g in glyphs {
                surface.fill_text(g.ch.encode_utf8(&mut buf), g.x, g.y);
            }
        }
        surface.set_global_alpha(1.0);
    }

    fn dispose(&mut self) {
        for band in &mut self.bands {
            band.clear();
            band.shrink_to_fit();
        }
    }

    fn params(&self) -> Value {
        let p = &self.params;
        merge_objects([
            json!({
                "cell_size": p.cell_size,
                "alpha_min": p.alpha_min,
                "alpha_max": p.alpha_max,
                "breathe_speed": p.breathe_speed,
                "breathe_amp": p.breathe_amp,
                "wind_seed": p.wind_seed,
                "wind_octaves": p.wind_octaves,
                "wind_scale": p.wind_scale,
                "wind_speed": p.wind_speed,
                "wind_strength": p.wind_strength,
                "interference_radius": p.interference_radius,
                "interference_chance": p.interference_chance,
                "interference_seed": p.interference_seed,
                "color": p.color.to_hex(),
            }),
            terrain_params(&p.terrain),
            influence_params(&p.influence),
        ])
    }

    fn param_schema(&self) -> Value {
        let d = AsciiTerrainParams::default();
        merge_objects([
            json!({
                "cell_size": {
                    "type": "number",
                    "default": d.cell_size,
                    "min": 4.0,
                    "max": 32.0,
                    "description": "Character cell size and font size in pixels"
                },
                "alpha_min": {
                    "type": "number",
                    "default": d.alpha_min,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Opacity of the lightest glyph"
                },
                "alpha_max": {
                    "type": "number",
                    "default": d.alpha_max,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Opacity of the heaviest glyph"
                },
                "breathe_speed": {
                    "type": "number",
                    "default": d.breathe_speed,
                    "min": 0.0,
                    "max": 5.0,
                    "description": "Angular speed of the global opacity pulse"
                },
                "breathe_amp": {
                    "type": "number",
                    "default": d.breathe_amp,
                    "min": 0.0,
                    "max": 0.5,
                    "description": "Relative depth of the opacity pulse"
                },
                "wind_seed": {
                    "type": "integer",
                    "default": d.wind_seed,
                    "description": "Seed of the wind noise"
                },
                "wind_octaves": {
                    "type": "integer",
                    "default": d.wind_octaves,
                    "min": 1,
                    "max": 8,
                    "description": "FBM octaves of the wind noise"
                },
                "wind_scale": {
                    "type": "number",
                    "default": d.wind_scale,
                    "min": 0.1,
                    "max": 20.0,
                    "description": "Wind noise units across the viewport"
                },
                "wind_speed": {
                    "type": "number",
                    "default": d.wind_speed,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Wind drift in noise units per second"
                },
                "wind_strength": {
                    "type": "number",
                    "default": d.wind_strength,
                    "min": 0.0,
                    "max": 6.0,
                    "description": "Largest ramp offset applied by the wind"
                },
                "interference_radius": {
                    "type": "number",
                    "default": d.interference_radius,
                    "min": 0.0,
                    "max": 100.0,
                    "description": "Interference radius around the cursor, in cells"
                },
                "interference_chance": {
                    "type": "number",
                    "default": d.interference_chance,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Interference probability at the cursor"
                },
                "interference_seed": {
                    "type": "integer",
                    "default": d.interference_seed,
                    "description": "Seed of the interference random table"
                },
                "color": {
                    "type": "string",
                    "default": d.color.to_hex(),
                    "description": "Glyph color as #rrggbb"
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
    use backdrop_core::{CursorState, RecordingSurface};
    use glam::DVec2;

    fn frame(amp: f64, elapsed: f64) -> Frame<'static> {
        Frame {
            cursor: CursorState {
                raw: DVec2::splat(0.5),
                smoothed: DVec2::splat(0.5),
                velocity: DVec2::ZERO,
                amp,
                present: amp > 0.0,
                trail: &[],
            },
            width: 400.0,
            height: 300.0,
            elapsed,
        }
    }

    fn render(scene: &mut AsciiTerrain, f: &Frame<'_>) -> RecordingSurface {
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface, f);
        surface
    }

    fn glyphs(surface: &RecordingSurface) -> Vec<(String, f64, f64)> {
        surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText(s, x, y) => Some((s.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    fn built(params: &Value) -> AsciiTerrain {
        let mut scene = AsciiTerrain::from_json(params);
        scene.build(42, 32).unwrap();
        scene
    }

    // -- params --

    #[test]
    fn default_terrain_differs_from_topographic() {
        let p = AsciiTerrainParams::default();
        assert_eq!(p.terrain.seed, 73);
        assert_eq!(p.terrain.warp_seed, 211);
        assert_eq!(p.terrain.noise_step, 6);
        assert_eq!(p.influence.cursor_amp, 0.38);
    }

    #[test]
    fn band_alpha_spans_min_to_max() {
        let p = AsciiTerrainParams::default();
        assert!((p.band_alpha(0) - 0.08).abs() < 1e-12);
        assert!((p.band_alpha(6) - 0.30).abs() < 1e-12);
        assert!((p.band_alpha(3) - 0.19).abs() < 1e-12);
    }

    #[test]
    fn tiny_cell_size_is_raised_to_smallest_font() {
        let p = AsciiTerrainParams::from_json(&json!({"cell_size": 1e-6}));
        assert_eq!(p.cell_size, 4.0);
        assert_eq!(AsciiTerrainParams::from_json(&json!({"cell_size": 12.0})).cell_size, 12.0);
    }

    #[test]
    fn params_reload_to_same_values() {
        let scene = AsciiTerrain::from_json(&json!({"wind_strength": 2.0, "seed": 5}));
        assert_eq!(AsciiTerrainParams::from_json(&scene.params()), scene.params);
    }

    #[test]
    fn schema_describes_every_param() {
        let scene = AsciiTerrain::default();
        let schema = scene.param_schema();
        for key in scene.params().as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn rand_table_is_seeded() {
        let a = AsciiTerrain::default();
        let mut rng = Lcg32::new(9973);
        assert_eq!(a.rand_table.len(), 1024);
        assert_eq!(a.rand_table[0], rng.next_f64());
        assert_eq!(a.rand_table[1], rng.next_f64());
    }

    // -- rendering --

    #[test]
    fn text_setup_precedes_glyphs() {
        let mut scene = built(&json!({}));
        let surface = render(&mut scene, &frame(0.0, 1.0));
        let ops = surface.ops();
        assert_eq!(ops[0], DrawOp::FontSize(10.0));
        assert_eq!(ops[1], DrawOp::TextBaseline(TextBaseline::Top));
        assert_eq!(ops.last(), Some(&DrawOp::GlobalAlpha(1.0)));
    }

    #[test]
    fn glyphs_sit_on_the_cell_grid_and_skip_spaces() {
        let mut scene = built(&json!({}));
        let surface = render(&mut scene, &frame(0.0, 2.0));
        let drawn = glyphs(&surface);
        assert!(!drawn.is_empty());
        for (s, x, y) in drawn {
            assert_ne!(s, " ");
            let ch = s.chars().next().unwrap();
            assert!(RAMP.contains(&ch));
            assert_eq!(x % 10.0, 0.0);
            assert_eq!(y % 10.0, 0.0);
        }
    }

    #[test]
    fn band_alphas_stay_within_breathing_range() {
        let mut scene = built(&json!({}));
        let surface = render(&mut scene, &frame(0.0, 3.0));
        for op in surface.ops() {
            if let DrawOp::GlobalAlpha(a) = op {
                assert!(*a == 1.0 || (0.08 * 0.94 - 1e-12..=0.30 * 1.06 + 1e-12).contains(a));
            }
        }
    }

    #[test]
    fn absent_cursor_draws_no_interference() {
        let mut scene = built(&json!({"interference_chance": 1.0}));
        let surface = render(&mut scene, &frame(0.0, 0.5));
        assert!(glyphs(&surface)
            .iter()
            .all(|(s, _, _)| !GLITCH_CHARS.contains(&s.chars().next().unwrap())));
    }

    #[test]
    fn present_cursor_draws_interference_nearby() {
        let mut scene = built(&json!({"interference_chance": 1.0}));
        let surface = render(&mut scene, &frame(1.0, 0.5));
        let glitches: Vec<_> = glyphs(&surface)
            .into_iter()
            .filter(|(s, _, _)| GLITCH_CHARS.contains(&s.chars().next().unwrap()))
            .collect();
        assert!(!glitches.is_empty());
        for (_, x, y) in glitches {
            let dx = x / 10.0 - 21.0;
            let dy = y / 10.0 - 16.0;
            assert!(dx.hypot(dy) < 15.0);
        }
    }

    #[test]
    fn field_is_renormalized_after_bumps() {
        let mut scene = built(&json!({}));
        render(&mut scene, &frame(1.0, 0.0));
        let (min, max) = scene.field().min_max();
        assert!(min.abs() < 1e-12);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn render_is_deterministic() {
        let mut a = built(&json!({}));
        let mut b = built(&json!({}));
        assert_eq!(
            render(&mut a, &frame(1.0, 7.0)).ops(),
            render(&mut b, &frame(1.0, 7.0)).ops()
        );
    }
}
