//! [`CanvasSurface`]: the core [`Surface`] over a `CanvasRenderingContext2d`.

use backdrop_core::surface::MONOSPACE_ADVANCE;
use backdrop_core::{BackdropError, LineCap, LineJoin, LinearGradient, Paint, Surface, TextBaseline};
use js_sys::Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

pub(crate) fn cap_name(cap: LineCap) -> &'static str {
    match cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
        LineCap::Square => "square",
    }
}

pub(crate) fn join_name(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Miter => "miter",
        LineJoin::Round => "round",
        LineJoin::Bevel => "bevel",
    }
}

pub(crate) fn baseline_name(baseline: TextBaseline) -> &'static str {
    match baseline {
        TextBaseline::Top => "top",
        TextBaseline::Middle => "middle",
        TextBaseline::Alphabetic => "alphabetic",
        TextBaseline::Bottom => "bottom",
    }
}

pub(crate) fn font(size_px: f64) -> String {
    format!("{size_px}px monospace")
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    font_size: f64,
}

impl CanvasSurface {
    /// Acquires the 2D context of `canvas`.
    ///
    /// Returns `BackdropError::SurfaceUnavailable` if the browser refuses.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, BackdropError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| BackdropError::SurfaceUnavailable(format!("{e:?}")))?
            .ok_or_else(|| BackdropError::SurfaceUnavailable("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| BackdropError::SurfaceUnavailable("not a 2d context".into()))?;
        Ok(Self {
            canvas,
            ctx,
            font_size: 10.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn gradient(&self, g: &LinearGradient) -> CanvasGradient {
        let gradient = self.ctx.create_linear_gradient(g.x0, g.y0, g.x1, g.y1);
        for stop in g.stops() {
            let _ = gradient.add_color_stop(stop.offset as f32, &stop.color.to_css());
        }
        gradient
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.font_size = 10.0;
        // CSS size tracks the window; the backing store carries the dpr.
        let style = self.canvas.style();
        let _ = style.set_property("width", "100vw");
        let _ = style.set_property("height", "100vh");
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let _ = self.ctx.set_transform(a, b, c, d, e, f);
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.ctx.translate(x, y);
    }

    fn rotate(&mut self, angle: f64) {
        let _ = self.ctx.rotate(angle);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.clear_rect(x, y, w, h);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let _ = self.ctx.arc(x, y, radius, start, end);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.rect(x, y, w, h);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn clip(&mut self) {
        self.ctx.clip();
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.stroke_rect(x, y, w, h);
    }

    fn set_stroke_paint(&mut self, paint: Paint) {
        match paint {
            Paint::Solid(c) => self.ctx.set_stroke_style_str(&c.to_css()),
            Paint::Linear(g) => self.ctx.set_stroke_style_canvas_gradient(&self.gradient(&g)),
        }
    }

    fn set_fill_paint(&mut self, paint: Paint) {
        match paint {
            Paint::Solid(c) => self.ctx.set_fill_style_str(&c.to_css()),
            Paint::Linear(g) => self.ctx.set_fill_style_canvas_gradient(&self.gradient(&g)),
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ctx.set_line_cap(cap_name(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ctx.set_line_join(join_name(join));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let array: Array = segments.iter().map(|&v| JsValue::from_f64(v)).collect();
        let _ = self.ctx.set_line_dash(&array);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_font_size(&mut self, size_px: f64) {
        if size_px > 0.0 && size_px.is_finite() {
            self.font_size = size_px;
            self.ctx.set_font(&font(size_px));
        }
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.ctx.set_text_baseline(baseline_name(baseline));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = self.ctx.fill_text(text, x, y);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.ctx
            .measure_text(text)
            .map(|m| m.width())
            .unwrap_or_else(|_| text.chars().count() as f64 * self.font_size * MONOSPACE_ADVANCE)
    }
}
