//! The 2D immediate-mode drawing surface scenes render through.
//!
//! [`Surface`] mirrors the conventional canvas 2D API: path construction,
//! stroke/fill with color or linear-gradient paint, line styling, clipping,
//! save/restore of drawing state, and monospace text. Coordinates are CSS
//! pixels; the engine installs the device-pixel-ratio transform.
//!
//! The trait is object-safe so scenes receive `&mut dyn Surface` regardless of
//! backend. [`RecordingSurface`] is a backend that records every call, for
//! tests and headless inspection.

use crate::color::Rgba;

/// Stroke end-cap style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Stroke corner style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Vertical anchor used by [`Surface::fill_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

/// One color stop of a [`LinearGradient`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

/// A gradient along the line `(x0, y0) -> (x1, y1)` in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    stops: Vec<GradientStop>,
}

impl LinearGradient {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            stops: Vec::new(),
        }
    }

    /// Adds a stop; `offset` is clamped to [0, 1] and stops are kept sorted.
    pub fn with_stop(mut self, offset: f64, color: Rgba) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let at = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(at, GradientStop { offset, color });
        self
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Gradient parameter of the point `(x, y)`: its projection onto the
    /// gradient line, clamped to [0, 1]. A degenerate line yields 0.
    pub fn parameter_at(&self, x: f64, y: f64) -> f64 {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        let len2 = dx * dx + dy * dy;
        if len2 < 1e-12 {
            return 0.0;
        }
        (((x - self.x0) * dx + (y - self.y0) * dy) / len2).clamp(0.0, 1.0)
    }

    /// Color at gradient parameter `t`. No stops means transparent.
    pub fn color_at(&self, t: f64) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Rgba::TRANSPARENT,
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        self.stops
            .windows(2)
            .find(|w| t >= w[0].offset && t <= w[1].offset)
            .map(|w| {
                let span = w[1].offset - w[0].offset;
                let local = if span < 1e-12 { 0.0 } else { (t - w[0].offset) / span };
                w[0].color.lerp(w[1].color, local)
            })
            .unwrap_or(last.color)
    }
}

/// Stroke or fill paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
}

impl From<Rgba> for Paint {
    fn from(color: Rgba) -> Self {
        Paint::Solid(color)
    }
}

impl From<LinearGradient> for Paint {
    fn from(gradient: LinearGradient) -> Self {
        Paint::Linear(gradient)
    }
}

/// A 2D raster drawing context.
pub trait Surface {
    /// Sets the backing-store size in device pixels. Resets all drawing state
    /// (transform, styles, clip), as resizing a canvas element does.
    fn resize(&mut self, width: u32, height: u32);

    /// Replaces the current transform with the affine matrix
    /// `[a c e; b d f; 0 0 1]`.
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    /// Pushes transform, styles and clip.
    fn save(&mut self);
    /// Pops the state pushed by the matching [`Surface::save`]; no-op when
    /// the stack is empty.
    fn restore(&mut self);

    /// Sets the covered pixels to transparent.
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Clockwise arc around `(x, y)` from `start` to `end` radians.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    /// Adds a closed rectangle subpath.
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn fill(&mut self);
    /// Intersects the clip region with the current path.
    fn clip(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn set_stroke_paint(&mut self, paint: Paint);
    fn set_fill_paint(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    /// Alternating dash/gap lengths; an empty slice draws solid lines.
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_global_alpha(&mut self, alpha: f64);

    /// Selects a monospace font of `size_px` CSS pixels.
    fn set_font_size(&mut self, size_px: f64);
    fn set_text_baseline(&mut self, baseline: TextBaseline);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f64;

    fn set_stroke_color(&mut self, color: Rgba) {
        self.set_stroke_paint(Paint::Solid(color));
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.set_fill_paint(Paint::Solid(color));
    }

    /// Shorthand for a pure scale transform, used for device pixel ratio.
    fn set_scale(&mut self, scale: f64) {
        self.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
    }
}

/// Advance of one monospace glyph as a fraction of the font size.
pub const MONOSPACE_ADVANCE: f64 = 0.6;

/// A recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize(u32, u32),
    SetTransform([f64; 6]),
    Translate(f64, f64),
    Rotate(f64),
    Save,
    Restore,
    ClearRect(f64, f64, f64, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc(f64, f64, f64, f64, f64),
    Rect(f64, f64, f64, f64),
    ClosePath,
    Stroke,
    Fill,
    Clip,
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    StrokePaint(Paint),
    FillPaint(Paint),
    LineWidth(f64),
    LineCap(LineCap),
    LineJoin(LineJoin),
    LineDash(Vec<f64>),
    GlobalAlpha(f64),
    FontSize(f64),
    TextBaseline(TextBaseline),
    FillText(String, f64, f64),
}

/// A surface that draws nothing and records every call in order.
///
/// `measure_text` assumes a monospace advance of 0.6 em.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    font_size: f64,
    width: u32,
    height: u32,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            font_size: 10.0,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of recorded ops matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    /// Drops recorded ops, keeping the size.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Backing size from the last resize.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.font_size = 10.0;
        self.ops.push(DrawOp::Resize(width, height));
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.ops.push(DrawOp::SetTransform([a, b, c, d, e, f]));
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate(x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.ops.push(DrawOp::Rotate(angle));
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::ClearRect(x, y, w, h));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Arc(x, y, radius, start, end));
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::Rect(x, y, w, h));
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn clip(&mut self) {
        self.ops.push(DrawOp::Clip);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::FillRect(x, y, w, h));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::StrokeRect(x, y, w, h));
    }

    fn set_stroke_paint(&mut self, paint: Paint) {
        self.ops.push(DrawOp::StrokePaint(paint));
    }

    fn set_fill_paint(&mut self, paint: Paint) {
        self.ops.push(DrawOp::FillPaint(paint));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ops.push(DrawOp::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ops.push(DrawOp::LineJoin(join));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.ops.push(DrawOp::LineDash(segments.to_vec()));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn set_font_size(&mut self, size_px: f64) {
        self.font_size = size_px;
        self.ops.push(DrawOp::FontSize(size_px));
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.ops.push(DrawOp::TextBaseline(baseline));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::FillText(text.to_owned(), x, y));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_size * MONOSPACE_ADVANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_stops_are_sorted() {
        let g = LinearGradient::new(0.0, 0.0, 10.0, 0.0)
            .with_stop(1.0, Rgba::WHITE)
            .with_stop(0.0, Rgba::BLACK)
            .with_stop(0.5, Rgba::white(0.5));
        let offsets: Vec<f64> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn gradient_parameter_projects_onto_line() {
        let g = LinearGradient::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(g.parameter_at(5.0, 99.0), 0.5);
        assert_eq!(g.parameter_at(-5.0, 0.0), 0.0);
        assert_eq!(g.parameter_at(50.0, 0.0), 1.0);
    }

    #[test]
    fn degenerate_gradient_parameter_is_zero() {
        let g = LinearGradient::new(3.0, 3.0, 3.0, 3.0);
        assert_eq!(g.parameter_at(10.0, 10.0), 0.0);
    }

    #[test]
    fn gradient_color_interpolates_between_stops() {
        let g = LinearGradient::new(0.0, 0.0, 1.0, 0.0)
            .with_stop(0.0, Rgba::BLACK)
            .with_stop(1.0, Rgba::WHITE);
        let mid = g.color_at(0.5);
        assert!((mid.r - 0.5).abs() < 1e-12);
        assert_eq!(g.color_at(-1.0), Rgba::BLACK);
        assert_eq!(g.color_at(2.0), Rgba::WHITE);
    }

    #[test]
    fn empty_gradient_is_transparent() {
        let g = LinearGradient::new(0.0, 0.0, 1.0, 0.0);
        assert_eq!(g.color_at(0.5), Rgba::TRANSPARENT);
    }

    #[test]
    fn recording_surface_records_in_order() {
        let mut s = RecordingSurface::new();
        s.begin_path();
        s.move_to(1.0, 2.0);
        s.line_to(3.0, 4.0);
        s.stroke();
        assert_eq!(
            s.ops(),
            &[
                DrawOp::BeginPath,
                DrawOp::MoveTo(1.0, 2.0),
                DrawOp::LineTo(3.0, 4.0),
                DrawOp::Stroke
            ]
        );
    }

    #[test]
    fn recording_surface_measures_monospace_text() {
        let mut s = RecordingSurface::new();
        s.set_font_size(10.0);
        assert!((s.measure_text("abcd") - 24.0).abs() < 1e-12);
    }

    #[test]
    fn default_color_helpers_route_through_paint() {
        let mut s = RecordingSurface::new();
        s.set_stroke_color(Rgba::white(0.5));
        s.set_scale(2.0);
        assert_eq!(s.ops()[0], DrawOp::StrokePaint(Paint::Solid(Rgba::white(0.5))));
        assert_eq!(s.ops()[1], DrawOp::SetTransform([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]));
    }

    #[test]
    fn surface_is_object_safe() {
        let mut s = RecordingSurface::new();
        let dyn_surface: &mut dyn Surface = &mut s;
        dyn_surface.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(s.count(|op| matches!(op, DrawOp::FillRect(..))), 1);
    }
}
