//! Mech cockpit heads-up display.
//!
//! A layered vector overlay: scan lines, a drifting grid that brightens
//! around the pointer, ruler ticks along the edges, dashed links between
//! targeting reticles and four scrolling data panels, and a row of gauges.
//! The third reticle eases toward the pointer. Panel text is drawn from a
//! seeded generator so a given seed always produces the same readouts.

use std::f64::consts::TAU;

use backdrop_core::params::{param_f64, param_f64_at_least, param_rgba, param_u32, param_usize};
use backdrop_core::{
    BackdropError, Frame, Lcg32, LineCap, LineJoin, Rgba, Scene, Surface, TextBaseline,
};
use glam::DVec2;
use serde_json::{json, Value};

const JP_LINES: [&str; 18] = [
    "機体状態：正常",
    "システム起動完了",
    "目標捕捉：完了",
    "戦闘モード：待機",
    "エネルギー充填中",
    "兵装システム確認",
    "レーダー走査中",
    "通信リンク：確立",
    "装甲integrity：98%",
    "ニューラルリンク同期",
    "索敵範囲：拡大",
    "火器管制：オンライン",
    "姿勢制御：安定",
    "推進剤残量：82%",
    "センサーアレイ起動",
    "電子戦装備：待機",
    "IFF識別：味方",
    "射撃統制：自動",
];

const STATUS_CODES: [&str; 12] = [
    "SYS OK  0x00",
    "LINK UP 0x01",
    "TGT ACQ 0x02",
    "SYNC 99.7%",
    "ARM RDY 0x04",
    "NAV FIX 0x05",
    "PWR NOM 0x06",
    "SCAN ACT",
    "THERM OK 32C",
    "BRG 247.3",
    "ALT 1420m",
    "VEL 0.0m/s",
];

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub const GAUGE_LABELS: [&str; 5] = ["PWR", "SYN", "THR", "ARM", "COM"];

const PANEL_MARGIN: f64 = 30.0;
const BRACKET_LEN: f64 = 12.0;
const TICK_SHORT: f64 = 6.0;
const TICK_LONG: f64 = 14.0;
const GAUGE_W: f64 = 80.0;
const GAUGE_H: f64 = 6.0;
const GAUGE_GAP: f64 = 20.0;
/// Pointer stand-in when absent, far enough away that nothing reacts.
const OFFSCREEN: DVec2 = DVec2::new(-1000.0, -1000.0);

/// Configuration for the HUD scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MechHudParams {
    pub grid_spacing: f64,
    /// Grid drift in pixels per second, x and y.
    pub grid_drift_x: f64,
    pub grid_drift_y: f64,
    /// Radius around the pointer where grid lines brighten.
    pub bright_radius: f64,
    pub scan_line_spacing: f64,
    pub tick_spacing: f64,
    /// Panel text line height in pixels.
    pub line_height: f64,
    /// Panel scroll speed in pixels per second.
    pub scroll_speed: f64,
    pub panel_lines: usize,
    /// Fraction of the remaining distance the tracking reticle covers per frame.
    pub track_rate: f64,
    pub text_seed: u32,
    pub color: Rgba,
}

impl Default for MechHudParams {
    fn default() -> Self {
        Self {
            grid_spacing: 80.0,
            grid_drift_x: 3.0,
            grid_drift_y: 2.0,
            bright_radius: 150.0,
            scan_line_spacing: 3.0,
            tick_spacing: 30.0,
            line_height: 14.0,
            scroll_speed: 40.0,
            panel_lines: 60,
            track_rate: 0.05,
            text_seed: 2077,
            color: Rgba::WHITE,
        }
    }
}

impl MechHudParams {
    /// Parse from JSON, falling back to defaults for missing fields.
    /// Spacings below one pixel are raised to one.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            grid_spacing: param_f64_at_least(params, "grid_spacing", d.grid_spacing, 1.0),
            grid_drift_x: param_f64(params, "grid_drift_x", d.grid_drift_x),
            grid_drift_y: param_f64(params, "grid_drift_y", d.grid_drift_y),
            bright_radius: param_f64(params, "bright_radius", d.bright_radius),
            scan_line_spacing: param_f64_at_least(params, "scan_line_spacing", d.scan_line_spacing, 1.0),
            tick_spacing: param_f64_at_least(params, "tick_spacing", d.tick_spacing, 1.0),
            line_height: param_f64_at_least(params, "line_height", d.line_height, 1.0),
            scroll_speed: param_f64(params, "scroll_speed", d.scroll_speed),
            panel_lines: param_usize(params, "panel_lines", d.panel_lines).max(1),
            track_rate: param_f64(params, "track_rate", d.track_rate),
            text_seed: param_u32(params, "text_seed", d.text_seed),
            color: param_rgba(params, "color", d.color),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Panel {
    pos: DVec2,
    size: DVec2,
    lines: Vec<String>,
}

impl Panel {
    fn center(&self) -> DVec2 {
        self.pos + self.size * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Reticle {
    pos: DVec2,
    radius: f64,
    label: &'static str,
}

/// Twenty-four hex digits in space-separated groups of four.
fn hex_line(rng: &mut Lcg32) -> String {
    let mut s = String::with_capacity(29);
    for i in 0..24 {
        if i > 0 && i % 4 == 0 {
            s.push(' ');
        }
        s.push(char::from(HEX_DIGITS[rng.next_usize(16)]));
    }
    s
}

fn panel_text(rng: &mut Lcg32, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let r = rng.next_f64();
            if r < 0.35 {
                JP_LINES[rng.next_usize(JP_LINES.len())].to_owned()
            } else if r < 0.65 {
                hex_line(rng)
            } else {
                STATUS_CODES[rng.next_usize(STATUS_CODES.len())].to_owned()
            }
        })
        .collect()
}

/// Per-frame values shared by the layers.
#[derive(Debug, Clone, Copy)]
struct HudFrame {
    w: f64,
    h: f64,
    t: f64,
    /// Pointer in pixels, or `OFFSCREEN` when absent.
    pointer: DVec2,
    present: bool,
}

/// Layered cockpit overlay.
#[derive(Debug, Clone)]
pub struct MechHud {
    params: MechHudParams,
    layout_size: Option<(f64, f64)>,
    panels: Vec<Panel>,
    reticles: Vec<Reticle>,
    track: DVec2,
}

impl MechHud {
    pub fn new(params: MechHudParams) -> Self {
        Self {
            params,
            layout_size: None,
            panels: Vec::new(),
            reticles: Vec::new(),
            track: DVec2::ZERO,
        }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(MechHudParams::from_json(params))
    }

    /// Position of the pointer-tracking reticle.
    pub fn track(&self) -> DVec2 {
        self.track
    }

    fn layout(&mut self, w: f64, h: f64) {
        tracing::debug!(w, h, "laying out hud");
        self.layout_size = Some((w, h));
        self.track = DVec2::new(w / 2.0, h / 2.0);

        let mut rng = Lcg32::new(self.params.text_seed);
        let size = DVec2::new(260.0_f64.min(w * 0.18), 160.0_f64.min(h * 0.16));
        let m = PANEL_MARGIN;
        let corners = [
            DVec2::new(m, m),
            DVec2::new(w - m - size.x, m),
            DVec2::new(m, h - m - size.y),
            DVec2::new(w - m - size.x, h - m - size.y),
        ];
        self.panels = corners
            .into_iter()
            .map(|pos| Panel {
                pos,
                size,
                lines: panel_text(&mut rng, self.params.panel_lines),
            })
            .collect();

        self.reticles = vec![
            Reticle {
                pos: DVec2::new(w * 0.35, h * 0.4),
                radius: 60.0,
                label: "TGT-A  BRG 247",
            },
            Reticle {
                pos: DVec2::new(w * 0.65, h * 0.55),
                radius: 50.0,
                label: "TGT-B  RNG 1.4k",
            },
            Reticle {
                pos: self.track,
                radius: 45.0,
                label: "TRACK  LOCK",
            },
        ];
    }

    fn ink(&self, alpha: f64) -> Rgba {
        self.params.color.with_alpha(alpha)
    }

    fn update_reticles(&mut self, f: &HudFrame) {
        if f.present {
            self.track += (f.pointer - self.track) * self.params.track_rate;
        }
        let t = f.t;
        if let [a, b, c] = self.reticles.as_mut_slice() {
            a.pos = DVec2::new(
                f.w * 0.35 + (t * 0.2).sin() * 40.0,
                f.h * 0.4 + (t * 0.15).cos() * 30.0,
            );
            b.pos = DVec2::new(
                f.w * 0.65 + (t * 0.17 + 2.0).sin() * 35.0,
                f.h * 0.55 + (t * 0.22 + 1.0).cos() * 25.0,
            );
            c.pos = self.track;
        }
    }

    fn draw_scan_lines(&self, s: &mut dyn Surface, f: &HudFrame) {
        s.set_stroke_color(self.ink(0.04));
        s.set_line_width(0.5);
        s.begin_path();
        let mut y = 0.0;
        while y < f.h {
            s.move_to(0.0, y);
            s.line_to(f.w, y);
            y += self.params.scan_line_spacing;
        }
        s.stroke();
    }

    fn draw_grid(&self, s: &mut dyn Surface, f: &HudFrame) {
        let g = self.params.grid_spacing;
        let off_x = (f.t * self.params.grid_drift_x).rem_euclid(g);
        let off_y = (f.t * self.params.grid_drift_y).rem_euclid(g);
        let xs = grid_lines(off_x - g, f.w + g, g);
        let ys = grid_lines(off_y - g, f.h + g, g);

        s.set_line_width(0.5);
        s.begin_path();
        for x in xs.clone() {
            s.move_to(x, 0.0);
            s.line_to(x, f.h);
        }
        for y in ys.clone() {
            s.move_to(0.0, y);
            s.line_to(f.w, y);
        }
        s.set_stroke_color(self.ink(0.06));
        s.stroke();

        if !f.present {
            return;
        }
        let r = self.params.bright_radius;
        let p = f.pointer;
        s.set_stroke_color(self.ink(0.12));
        s.begin_path();
        for x in xs.filter(|x| (x - p.x).abs() < r) {
            s.move_to(x, (p.y - r).max(0.0));
            s.line_to(x, (p.y + r).min(f.h));
        }
        for y in ys.filter(|y| (y - p.y).abs() < r) {
            s.move_to((p.x - r).max(0.0), y);
            s.line_to((p.x + r).min(f.w), y);
        }
        s.stroke();
    }

    fn draw_edge_ticks(&self, s: &mut dyn Surface, f: &HudFrame) {
        let spacing = self.params.tick_spacing;
        let tick_len = |idx: usize| if idx % 5 == 0 { TICK_LONG } else { TICK_SHORT };

        s.set_stroke_color(self.ink(0.15));
        s.set_line_width(0.5);
        s.set_font_size(8.0);
        s.begin_path();
        for (idx, x) in ruler(f.w, spacing) {
            let len = tick_len(idx);
            s.move_to(x, 0.0);
            s.line_to(x, len);
            s.move_to(x, f.h);
            s.line_to(x, f.h - len);
        }
        for (idx, y) in ruler(f.h, spacing) {
            let len = tick_len(idx);
            s.move_to(0.0, y);
            s.line_to(len, y);
            s.move_to(f.w, y);
            s.line_to(f.w - len, y);
        }
        s.stroke();

        s.set_fill_color(self.ink(0.12));
        for (idx, x) in ruler(f.w, spacing).filter(|(i, _)| i % 5 == 0) {
            s.fill_text(&idx.to_string(), x + 2.0, TICK_LONG + 10.0);
        }
        for (idx, y) in ruler(f.h, spacing).filter(|(i, _)| i % 5 == 0) {
            s.fill_text(&idx.to_string(), TICK_LONG + 2.0, y + 3.0);
        }
    }

    fn draw_connections(&self, s: &mut dyn Surface, f: &HudFrame) {
        s.set_line_dash(&[4.0, 6.0]);
        s.set_stroke_color(self.ink(0.08));
        s.set_line_width(0.5);
        s.begin_path();
        for (ret, panel) in self.reticles.iter().zip(&self.panels) {
            let c = panel.center();
            s.move_to(ret.pos.x, ret.pos.y);
            s.line_to(c.x, c.y);
        }
        s.stroke();

        if let (Some(ret), Some(panel)) = (self.reticles.first(), self.panels.first()) {
            let prog = (f.t * 0.3).rem_euclid(1.0);
            let dot = ret.pos + (panel.center() - ret.pos) * prog;
            s.set_fill_color(self.ink(0.4));
            s.begin_path();
            s.arc(dot.x, dot.y, 2.0, 0.0, TAU);
            s.fill();
        }

        if let (true, Some(track)) = (f.present, self.reticles.get(2)) {
            s.set_stroke_color(self.ink(0.1));
            s.begin_path();
            s.move_to(f.pointer.x, f.pointer.y);
            s.line_to(track.pos.x, track.pos.y);
            s.stroke();
        }
        s.set_line_dash(&[]);
    }

    fn draw_reticle(&self, s: &mut dyn Surface, ret: &Reticle, rotation: f64) {
        let DVec2 { x, y } = ret.pos;
        let radius = ret.radius;
        let inner = radius * 0.6;

        s.set_stroke_color(self.ink(0.25));
        s.set_fill_color(self.ink(0.25));
        s.set_line_width(0.5);

        for r in [radius, inner] {
            s.begin_path();
            s.arc(x, y, r, 0.0, TAU);
            s.stroke();
        }

        for (count, ring, half, angle) in [(12, radius, 5.0, rotation), (8, inner, 4.0, -rotation * 0.7)] {
            s.save();
            s.translate(x, y);
            s.rotate(angle);
            s.begin_path();
            for i in 0..count {
                let a = f64::from(i) / f64::from(count) * TAU;
                let (sin, cos) = a.sin_cos();
                s.move_to(cos * (ring - half), sin * (ring - half));
                s.line_to(cos * (ring + half), sin * (ring + half));
            }
            s.stroke();
            s.restore();
        }

        let arm = radius * 0.35;
        s.begin_path();
        s.move_to(x - arm, y);
        s.line_to(x - 4.0, y);
        s.move_to(x + 4.0, y);
        s.line_to(x + arm, y);
        s.move_to(x, y - arm);
        s.line_to(x, y - 4.0);
        s.move_to(x, y + 4.0);
        s.line_to(x, y + arm);
        s.stroke();

        s.begin_path();
        s.arc(x, y, 2.0, 0.0, TAU);
        s.fill();

        s.set_font_size(9.0);
        s.set_fill_color(self.ink(0.2));
        s.fill_text(ret.label, x - inner, y + radius + 14.0);
    }

    fn draw_panel(&self, s: &mut dyn Surface, f: &HudFrame, panel: &Panel) {
        let lh = self.params.line_height;
        let len = panel.lines.len();
        if len == 0 {
            return;
        }
        let scroll = (f.t * self.params.scroll_speed).rem_euclid(len as f64 * lh);
        let near = f.present && f.pointer.distance(panel.center()) < 200.0;
        let DVec2 { x, y } = panel.pos;
        let DVec2 { x: w, y: h } = panel.size;
        let b = BRACKET_LEN;

        s.set_stroke_color(self.ink(if near { 0.4 } else { 0.2 }));
        s.set_line_width(1.0);
        s.begin_path();
        s.move_to(x, y + b);
        s.line_to(x, y);
        s.line_to(x + b, y);
        s.move_to(x + w - b, y);
        s.line_to(x + w, y);
        s.line_to(x + w, y + b);
        s.move_to(x, y + h - b);
        s.line_to(x, y + h);
        s.line_to(x + b, y + h);
        s.move_to(x + w - b, y + h);
        s.line_to(x + w, y + h);
        s.line_to(x + w, y + h - b);
        s.stroke();

        s.save();
        s.begin_path();
        s.rect(x + 4.0, y + 4.0, w - 8.0, h - 8.0);
        s.clip();

        s.set_font_size(10.0);
        s.set_fill_color(self.ink(if near { 0.3 } else { 0.2 }));
        let visible = (h / lh).ceil().max(0.0) as usize + 2;
        let start = (scroll / lh).floor() as usize;
        let shift = scroll % lh;
        for i in 0..visible {
            let line = &panel.lines[(start + i) % len];
            s.fill_text(line, x + 8.0, y + lh + i as f64 * lh - shift);
        }

        if (f.t * 4.0).sin() > 0.0 {
            let row = visible - 2;
            let text = &panel.lines[(start + row) % len];
            let caret_x = x + 8.0 + s.measure_text(text) + 2.0;
            let caret_y = y + lh + row as f64 * lh - shift;
            s.set_fill_color(self.ink(if near { 0.5 } else { 0.3 }));
            s.fill_rect(caret_x, caret_y - 10.0, 6.0, 12.0);
        }
        s.restore();
    }

    fn draw_gauges(&self, s: &mut dyn Surface, f: &HudFrame) {
        let count = GAUGE_LABELS.len() as f64;
        let left = f.w / 2.0 - count * (GAUGE_W + GAUGE_GAP) / 2.0;
        let gy = f.h - 45.0;
        let near = f.present && (f.pointer.y - gy).abs() < 60.0 && (f.pointer.x - f.w / 2.0).abs() < 300.0;

        s.set_font_size(9.0);
        for (i, label) in GAUGE_LABELS.iter().enumerate() {
            let gx = left + i as f64 * (GAUGE_W + GAUGE_GAP);
            let fill = gauge_fill(f.t, i);

            s.set_fill_color(self.ink(0.25));
            s.fill_text(label, gx, gy - 4.0);

            s.set_stroke_color(self.ink(0.15));
            s.set_line_width(0.5);
            s.stroke_rect(gx, gy, GAUGE_W, GAUGE_H);

            s.set_fill_color(self.ink(0.25));
            s.fill_rect(gx, gy, GAUGE_W * fill, GAUGE_H);

            if near {
                s.set_fill_color(self.ink(0.3));
                s.fill_text(&format!("{:.1}%", fill * 100.0), gx + GAUGE_W + 4.0, gy + 6.0);
            }
        }
    }
}

/// Gauge level in [0.3, 1.0] for gauge `i` at time `t`.
fn gauge_fill(t: f64, i: usize) -> f64 {
    0.3 + 0.7 * (0.5 + 0.5 * (t * 1.5 + i as f64 * 1.3).sin())
}

/// Positions `start, start + step, ...` strictly below `end`.
fn grid_lines(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> + Clone {
    let count = ((end - start) / step).ceil().max(0.0) as usize;
    (0..count).map(move |i| start + i as f64 * step).filter(move |&v| v < end)
}

/// `(index, position)` ticks from 0 strictly below `extent`.
fn ruler(extent: f64, spacing: f64) -> impl Iterator<Item = (usize, f64)> {
    let count = (extent / spacing).ceil().max(0.0) as usize;
    (0..count).map(move |i| (i, i as f64 * spacing))
}

impl Default for MechHud {
    fn default() -> Self {
        Self::new(MechHudParams::default())
    }
}

impl Scene for MechHud {
    fn name(&self) -> &'static str {
        "mech-hud"
    }

    /// Vector-only; the engine grid is unused.
    fn cell_size(&self) -> f64 {
        100.0
    }

    fn build(&mut self, _cols: usize, _rows: usize) -> Result<(), BackdropError> {
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
        let (w, h) = (frame.width, frame.height);
        if self.layout_size != Some((w, h)) {
            self.layout(w, h);
        }
        let present = frame.cursor.present;
        let f = HudFrame {
            w,
            h,
            t: frame.elapsed,
            pointer: if present {
                frame.cursor.smoothed_px(w, h)
            } else {
                OFFSCREEN
            },
            present,
        };
        self.update_reticles(&f);

        surface.set_line_cap(LineCap::Butt);
        surface.set_line_join(LineJoin::Miter);
        surface.set_text_baseline(TextBaseline::Alphabetic);

        self.draw_scan_lines(surface, &f);
        self.draw_grid(surface, &f);
        self.draw_edge_ticks(surface, &f);
        self.draw_connections(surface, &f);
        let rotation = f.t * 0.4;
        for ret in &self.reticles {
            self.draw_reticle(surface, ret, rotation);
        }
        for panel in &self.panels {
            self.draw_panel(surface, &f, panel);
        }
        self.draw_gauges(surface, &f);
    }

    fn dispose(&mut self) {
        self.panels.clear();
        self.reticles.clear();
        self.layout_size = None;
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "grid_spacing": p.grid_spacing,
            "grid_drift_x": p.grid_drift_x,
            "grid_drift_y": p.grid_drift_y,
            "bright_radius": p.bright_radius,
            "scan_line_spacing": p.scan_line_spacing,
            "tick_spacing": p.tick_spacing,
            "line_height": p.line_height,
            "scroll_speed": p.scroll_speed,
            "panel_lines": p.panel_lines,
            "track_rate": p.track_rate,
            "text_seed": p.text_seed,
            "color": p.color.to_hex(),
        })
    }

    fn param_schema(&self) -> Value {
        let d = MechHudParams::default();
        json!({
            "grid_spacing": {
                "type": "number",
                "default": d.grid_spacing,
                "min": 10.0,
                "max": 400.0,
                "description": "Spacing of the drifting grid in pixels"
            },
            "grid_drift_x": {
                "type": "number",
                "default": d.grid_drift_x,
                "min": -50.0,
                "max": 50.0,
                "description": "Horizontal grid drift in pixels per second"
            },
            "grid_drift_y": {
                "type": "number",
                "default": d.grid_drift_y,
                "min": -50.0,
                "max": 50.0,
                "description": "Vertical grid drift in pixels per second"
            },
            "bright_radius": {
                "type": "number",
                "default": d.bright_radius,
                "min": 0.0,
                "max": 600.0,
                "description": "Radius around the pointer where grid lines brighten"
            },
            "scan_line_spacing": {
                "type": "number",
                "default": d.scan_line_spacing,
                "min": 1.0,
                "max": 20.0,
                "description": "Vertical distance between scan lines"
            },
            "tick_spacing": {
                "type": "number",
                "default": d.tick_spacing,
                "min": 5.0,
                "max": 200.0,
                "description": "Distance between edge ruler ticks"
            },
            "line_height": {
                "type": "number",
                "default": d.line_height,
                "min": 6.0,
                "max": 40.0,
                "description": "Panel text line height"
            },
            "scroll_speed": {
                "type": "number",
                "default": d.scroll_speed,
                "min": 0.0,
                "max": 400.0,
                "description": "Panel scroll speed in pixels per second"
            },
            "panel_lines": {
                "type": "integer",
                "default": d.panel_lines,
                "min": 1,
                "max": 500,
                "description": "Lines of generated text per panel"
            },
            "track_rate": {
                "type": "number",
                "default": d.track_rate,
                "min": 0.0,
                "max": 1.0,
                "description": "Per-frame easing of the tracking reticle toward the pointer"
            },
            "text_seed": {
                "type": "integer",
                "default": d.text_seed,
                "description": "Seed of the generated panel text"
            },
            "color": {
                "type": "string",
                "default": d.color.to_hex(),
                "description": "Overlay color as #rrggbb"
            }
        })
    }
}
