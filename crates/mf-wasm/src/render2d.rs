//! [`Canvas2d`] over a browser `CanvasRenderingContext2d`.
//!
//! Context calls that can throw (transforms, arcs, text) are best-effort:
//! a rejected call leaves the path as it was and drawing continues.

use mf_render::canvas::Canvas2d;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

pub struct WebCanvas<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl<'a> WebCanvas<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Canvas2d for WebCanvas<'_> {
    fn save(&mut self) {
        self.ctx.save();
    }
    fn restore(&mut self) {
        self.ctx.restore();
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }
    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.ctx.translate(x, y);
    }
    fn rotate(&mut self, angle: f64) {
        let _ = self.ctx.rotate(angle);
    }
    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }
    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }
    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }
    fn set_line_dash(&mut self, segments: &[f64]) {
        let dash: js_sys::Array = segments.iter().map(|v| JsValue::from_f64(*v)).collect();
        let _ = self.ctx.set_line_dash(&dash);
    }
    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }
    fn set_text_align(&mut self, align: &str) {
        self.ctx.set_text_align(align);
    }
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.clear_rect(x, y, w, h);
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.stroke_rect(x, y, w, h);
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
    fn close_path(&mut self) {
        self.ctx.close_path();
    }
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.rect(x, y, w, h);
    }
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let _ = self.ctx.arc(x, y, radius, start, end);
    }
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.ctx.arc_to(x1, y1, x2, y2, radius).unwrap_or(());
    }
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
    ) {
        let _ = self
            .ctx
            .ellipse(x, y, radius_x, radius_y, rotation, start, end);
    }
    fn fill(&mut self) {
        self.ctx.fill();
    }
    fn stroke(&mut self) {
        self.ctx.stroke();
    }
    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = self.ctx.fill_text(text, x, y);
    }
}
