//! [`Pixmap`]: a CPU RGBA implementation of [`Surface`].
//!
//! Paths are flattened into device-space polylines as they are built, so the
//! transform in effect at each `move_to`/`line_to`/`arc` applies, as on a
//! canvas. Fills and clips use the nonzero rule; strokes are outlined by
//! [`crate::stroke`] and filled. Pixels are stored premultiplied.
//!
//! Text is drawn as one filled box per glyph whose area follows the glyph's
//! ink density, which is enough for headless snapshots of character scenes
//! without bundling a font.

use std::f64::consts::TAU;
use std::sync::Arc;

use backdrop_core::surface::MONOSPACE_ADVANCE;
use backdrop_core::{LineCap, LineJoin, LinearGradient, Paint, Rgba, Surface, TextBaseline};
use glam::{DAffine2, DVec2};

use crate::pixel::{self, premultiply, source_over, Premul};
use crate::raster::{coverage_mask, rasterize, Contour};
use crate::stroke::{apply_dash, normalize_dash, outline, Polyline, StrokeStyle};

const DEFAULT_FONT_SIZE: f64 = 10.0;

/// Ink density of a monospace glyph as a fraction of its cell.
fn ink_density(ch: char) -> f64 {
    match ch {
        ' ' => 0.0,
        '.' => 0.1,
        ':' | '-' => 0.2,
        '+' => 0.35,
        '*' => 0.45,
        '#' => 0.7,
        '@' => 0.85,
        _ => 0.5,
    }
}

#[derive(Debug, Clone)]
struct DrawState {
    transform: DAffine2,
    stroke: Paint,
    fill: Paint,
    line_width: f64,
    cap: LineCap,
    join: LineJoin,
    dash: Vec<f64>,
    alpha: f64,
    font_size: f64,
    baseline: TextBaseline,
    clip: Option<Arc<[f32]>>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: DAffine2::IDENTITY,
            stroke: Paint::Solid(Rgba::BLACK),
            fill: Paint::Solid(Rgba::BLACK),
            line_width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash: Vec::new(),
            alpha: 1.0,
            font_size: DEFAULT_FONT_SIZE,
            baseline: TextBaseline::Alphabetic,
            clip: None,
        }
    }
}

impl DrawState {
    /// Uniform scale factor of the current transform.
    fn scale(&self) -> f64 {
        self.transform.matrix2.determinant().abs().sqrt()
    }
}

/// Per-pixel color source for one paint operation.
enum Shader {
    Solid(Rgba),
    Linear(LinearGradient, DAffine2),
}

impl Shader {
    fn new(paint: &Paint, transform: DAffine2) -> Self {
        match paint {
            Paint::Solid(c) => Shader::Solid(*c),
            Paint::Linear(g) => Shader::Linear(g.clone(), transform.inverse()),
        }
    }

    fn color_at(&self, x: usize, y: usize) -> Rgba {
        match self {
            Shader::Solid(c) => *c,
            Shader::Linear(g, inverse) => {
                let p = inverse.transform_point2(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
                g.color_at(g.parameter_at(p.x, p.y))
            }
        }
    }
}

/// A premultiplied RGBA raster with canvas-style drawing state.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<Premul>,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<Polyline>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Straight-alpha color at `(x, y)`, or `None` outside the pixmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        Some(pixel::unpremultiply(self.pixels[i]))
    }

    /// Straight-alpha RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        pixel::to_rgba8(&self.pixels)
    }

    /// Opaque RGBA8 bytes over `background`.
    pub fn to_rgba8_over(&self, background: Rgba) -> Vec<u8> {
        pixel::to_rgba8_over(&self.pixels, background)
    }

    fn dims(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    fn device(&self, x: f64, y: f64) -> DVec2 {
        self.state.transform.transform_point2(DVec2::new(x, y))
    }

    fn rect_contour(&self, x: f64, y: f64, w: f64, h: f64) -> Contour {
        vec![
            self.device(x, y),
            self.device(x + w, y),
            self.device(x + w, y + h),
            self.device(x, y + h),
        ]
    }

    fn path_contours(&self) -> Vec<Contour> {
        self.path
            .iter()
            .filter(|p| p.points.len() >= 3)
            .map(|p| p.points.clone())
            .collect()
    }

    /// The last subpath, if it has a current point and is still open.
    fn open_subpath(&mut self) -> Option<&mut Polyline> {
        self.path.last_mut().filter(|p| !p.points.is_empty() && !p.closed)
    }

    fn push_point(&mut self, p: DVec2) {
        if let Some(sub) = self.open_subpath() {
            sub.points.push(p);
            return;
        }
        self.path.push(Polyline {
            points: vec![p],
            closed: false,
        });
    }

    /// Composites `paint` through `contours`, honoring global alpha and clip.
    fn paint_contours(&mut self, contours: &[Contour], paint: &Paint) {
        let (w, h) = self.dims();
        let shader = Shader::new(paint, self.state.transform);
        let alpha = self.state.alpha as f32;
        let clip = self.state.clip.clone();
        let pixels = &mut self.pixels;
        rasterize(contours, w, h, |x, y, cov| {
            let i = y * w + x;
            let cov = cov * alpha * clip.as_ref().map_or(1.0, |m| m[i]);
            if cov > 0.0 {
                source_over(&mut pixels[i], premultiply(shader.color_at(x, y), cov));
            }
        });
    }

    fn stroke_polylines(&mut self, lines: &[Polyline]) {
        let scale = self.state.scale();
        let style = StrokeStyle {
            width: self.state.line_width * scale,
            cap: self.state.cap,
            join: self.state.join,
        };
        let dash: Vec<f64> = self.state.dash.iter().map(|d| d * scale).collect();
        let mut contours = Vec::new();
        for line in lines {
            for piece in apply_dash(line, &dash) {
                outline(&piece, &style, &mut contours);
            }
        }
        let paint = self.state.stroke.clone();
        self.paint_contours(&contours, &paint);
    }
}

impl Default for Pixmap {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Surface for Pixmap {
    fn resize(&mut self, width: u32, height: u32) {
        *self = Pixmap::new(width, height);
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.state.transform = DAffine2::from_cols_array(&[a, b, c, d, e, f]);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * DAffine2::from_translation(DVec2::new(x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.state.transform = self.state.transform * DAffine2::from_angle(angle);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let (pw, ph) = self.dims();
        let contour = self.rect_contour(x, y, w, h);
        let clip = self.state.clip.clone();
        let pixels = &mut self.pixels;
        rasterize(&[contour], pw, ph, |px, py, cov| {
            let i = py * pw + px;
            let keep = 1.0 - cov * clip.as_ref().map_or(1.0, |m| m[i]);
            pixels[i].iter_mut().for_each(|c| *c *= keep);
        });
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.device(x, y);
        self.path.push(Polyline {
            points: vec![p],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.device(x, y);
        self.push_point(p);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        let sweep = if end - start >= TAU {
            TAU
        } else {
            (end - start).rem_euclid(TAU)
        };
        let device_radius = radius * self.state.scale();
        let full = ((device_radius * 2.0).ceil() + 8.0).clamp(8.0, 128.0);
        let steps = ((sweep / TAU) * full).ceil().max(1.0) as usize;
        let center = DVec2::new(x, y);
        for i in 0..=steps {
            let a = start + sweep * i as f64 / steps as f64;
            let p = center + DVec2::new(a.cos(), a.sin()) * radius;
            let d = self.device(p.x, p.y);
            self.push_point(d);
        }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let points = self.rect_contour(x, y, w, h);
        let origin = points[0];
        self.path.push(Polyline { points, closed: true });
        self.path.push(Polyline {
            points: vec![origin],
            closed: false,
        });
    }

    fn close_path(&mut self) {
        let Some(sub) = self.open_subpath() else {
            return;
        };
        sub.closed = true;
        let origin = sub.points[0];
        self.path.push(Polyline {
            points: vec![origin],
            closed: false,
        });
    }

    fn stroke(&mut self) {
        let lines = std::mem::take(&mut self.path);
        self.stroke_polylines(&lines);
        self.path = lines;
    }

    fn fill(&mut self) {
        let contours = self.path_contours();
        let paint = self.state.fill.clone();
        self.paint_contours(&contours, &paint);
    }

    fn clip(&mut self) {
        let (w, h) = self.dims();
        let mut mask = coverage_mask(&self.path_contours(), w, h);
        if let Some(old) = &self.state.clip {
            mask.iter_mut().zip(old.iter()).for_each(|(m, o)| *m *= o);
        }
        self.state.clip = Some(mask.into());
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let contour = self.rect_contour(x, y, w, h);
        let paint = self.state.fill.clone();
        self.paint_contours(&[contour], &paint);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let rect = Polyline {
            points: self.rect_contour(x, y, w, h),
            closed: true,
        };
        self.stroke_polylines(&[rect]);
    }

    fn set_stroke_paint(&mut self, paint: Paint) {
        self.state.stroke = paint;
    }

    fn set_fill_paint(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_line_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.state.line_width = width;
        }
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.join = join;
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        if segments.iter().all(|v| v.is_finite() && *v >= 0.0) {
            self.state.dash = normalize_dash(segments);
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.alpha = alpha;
        }
    }

    fn set_font_size(&mut self, size_px: f64) {
        if size_px > 0.0 && size_px.is_finite() {
            self.state.font_size = size_px;
        }
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.baseline = baseline;
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let size = self.state.font_size;
        let advance = size * MONOSPACE_ADVANCE;
        let top = match self.state.baseline {
            TextBaseline::Top => y,
            TextBaseline::Middle => y - size / 2.0,
            TextBaseline::Alphabetic => y - size * 0.8,
            TextBaseline::Bottom => y - size,
        };
        let contours: Vec<Contour> = text
            .chars()
            .enumerate()
            .filter_map(|(i, ch)| {
                let side = ink_density(ch).sqrt();
                if side <= 0.0 {
                    return None;
                }
                let (gw, gh) = (advance * side, size * side);
                let gx = x + i as f64 * advance + (advance - gw) / 2.0;
                let gy = top + (size - gh) / 2.0;
                Some(self.rect_contour(gx, gy, gw, gh))
            })
            .collect();
        let paint = self.state.fill.clone();
        self.paint_contours(&contours, &paint);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.state.font_size * MONOSPACE_ADVANCE
    }
}
