//! Shapes and frames → [`Canvas2d`] calls.
//!
//! The template editor canvas is redrawn from scratch on every change:
//! clear, optional grid, shapes in paint order, then the selection
//! decorations of the selected shape. Every shape is painted inside its
//! own `save`/`restore` pair so alpha, dash and rotation never leak.

use crate::canvas::Canvas2d;
use crate::hit::{Handle, HitSettings, line_handles, rectangle_corners, rotate_handle_position};
use mf_core::geometry::points_of;
use mf_core::shape::display_text;
use mf_core::{Frame, FrameKind, Geometry, Id, Shape, Template, paint_order};
use std::f64::consts::TAU;

const SELECTION_PAD: f64 = 2.0;
const LINE_SELECTION_PAD: f64 = 5.0;
const SELECTION_DASH: [f64; 2] = [5.0, 5.0];
const CORNER_HANDLE_SIZE: f64 = 8.0;
const POINT_HANDLE_RADIUS: f64 = 5.0;
const FRAME_CORNER_RADIUS: f64 = 8.0;

/// Colours for everything that is not a shape's own style.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasTheme {
    pub grid: &'static str,
    pub selection: &'static str,
    pub handle_fill: &'static str,
    pub handle_stroke: &'static str,
    pub handle_hover: &'static str,
    pub rotate_handle: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            grid: "#e2e8f0",
            selection: "#3b82f6",
            handle_fill: "#ffffff",
            handle_stroke: "#3b82f6",
            handle_hover: "#f59e0b",
            rotate_handle: "#10b981",
        }
    }
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Per-frame inputs of [`render_shapes`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub show_grid: bool,
    pub grid_spacing: f64,
    pub selected: Option<Id>,
    /// Handle under the pointer; drawn highlighted.
    pub hovered_handle: Option<Handle>,
    pub hit: HitSettings,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            show_grid: true,
            grid_spacing: 20.0,
            selected: None,
            hovered_handle: None,
            hit: HitSettings::default(),
        }
    }
}

// ─── Editor canvas ───────────────────────────────────────────────────────

/// Redraw the template editor canvas.
pub fn render_shapes(
    canvas: &mut impl Canvas2d,
    shapes: &[Shape],
    options: &RenderOptions,
    theme: &CanvasTheme,
) {
    canvas.clear_rect(0.0, 0.0, options.width, options.height);
    if options.show_grid {
        draw_grid(canvas, options.width, options.height, options.grid_spacing, theme);
    }
    for shape in paint_order(shapes) {
        paint_shape(canvas, shape);
        if options.selected == Some(shape.id) {
            draw_selection(canvas, shape, options, theme);
        }
    }
}

fn draw_grid(
    canvas: &mut impl Canvas2d,
    width: f64,
    height: f64,
    spacing: f64,
    theme: &CanvasTheme,
) {
    if spacing <= 0.0 {
        return;
    }
    canvas.save();
    canvas.set_stroke_style(theme.grid);
    canvas.set_line_width(0.5);
    canvas.begin_path();
    let mut x = 0.0;
    while x <= width {
        canvas.move_to(x, 0.0);
        canvas.line_to(x, height);
        x += spacing;
    }
    let mut y = 0.0;
    while y <= height {
        canvas.move_to(0.0, y);
        canvas.line_to(width, y);
        y += spacing;
    }
    canvas.stroke();
    canvas.restore();
}

/// Paint one shape with its opacity, rotation and stroke style.
pub fn paint_shape(canvas: &mut impl Canvas2d, shape: &Shape) {
    log::trace!("paint {} {} at ({}, {})", shape.kind(), shape.id, shape.x, shape.y);
    canvas.save();
    canvas.set_global_alpha(shape.opacity);
    if shape.rotation != 0.0 {
        let c = shape.center();
        canvas.translate(c.x, c.y);
        canvas.rotate(shape.rotation.to_radians());
        canvas.translate(-c.x, -c.y);
    }
    canvas.set_line_dash(shape.stroke_style.dash_pattern());
    canvas.set_fill_style(&shape.fill_color);
    canvas.set_stroke_style(&shape.stroke_color);
    canvas.set_line_width(shape.stroke_width);

    let (x, y) = (shape.x, shape.y);
    match &shape.geometry {
        Geometry::Rectangle {
            width,
            height,
            corner_radius,
        } => {
            match corner_radius {
                Some(r) if *r > 0.0 => rounded_rect_path(canvas, x, y, *width, *height, *r),
                _ => {
                    canvas.begin_path();
                    canvas.rect(x, y, *width, *height);
                }
            }
            fill_and_stroke(canvas, shape);
        }
        Geometry::Circle { radius } => {
            canvas.begin_path();
            canvas.arc(x + radius, y + radius, *radius, 0.0, TAU);
            fill_and_stroke(canvas, shape);
        }
        Geometry::Triangle { points } => {
            canvas.begin_path();
            canvas.move_to(x + points[0], y + points[1]);
            canvas.line_to(x + points[2], y + points[3]);
            canvas.line_to(x + points[4], y + points[5]);
            canvas.close_path();
            fill_and_stroke(canvas, shape);
        }
        Geometry::Line { points } => {
            canvas.begin_path();
            for (i, p) in points_of(points).enumerate() {
                if i == 0 {
                    canvas.move_to(x + p.x, y + p.y);
                } else {
                    canvas.line_to(x + p.x, y + p.y);
                }
            }
            canvas.stroke();
        }
        Geometry::Text {
            text,
            font_size,
            font_family,
            font_weight,
            font_style,
            text_align,
        } => {
            let mut font = String::new();
            for part in [font_style, font_weight].into_iter().flatten() {
                font.push_str(part);
                font.push(' ');
            }
            font.push_str(&format!("{font_size}px {font_family}"));
            canvas.set_font(&font);
            canvas.set_text_align(text_align.unwrap_or_default().as_str());
            canvas.fill_text(display_text(text), x, y);
        }
    }
    canvas.restore();
}

fn fill_and_stroke(canvas: &mut impl Canvas2d, shape: &Shape) {
    canvas.fill();
    if shape.stroke_width > 0.0 {
        canvas.stroke();
    }
}

// ─── Selection decorations ───────────────────────────────────────────────

fn draw_selection(
    canvas: &mut impl Canvas2d,
    shape: &Shape,
    options: &RenderOptions,
    theme: &CanvasTheme,
) {
    canvas.save();
    canvas.set_stroke_style(theme.selection);
    canvas.set_line_width(2.0);
    canvas.set_line_dash(&SELECTION_DASH);

    let (x, y) = (shape.x, shape.y);
    match &shape.geometry {
        Geometry::Rectangle { width, height, .. } => {
            canvas.stroke_rect(
                x - SELECTION_PAD,
                y - SELECTION_PAD,
                width + 2.0 * SELECTION_PAD,
                height + 2.0 * SELECTION_PAD,
            );
        }
        Geometry::Circle { radius } => {
            canvas.begin_path();
            canvas.arc(x + radius, y + radius, radius + SELECTION_PAD, 0.0, TAU);
            canvas.stroke();
        }
        Geometry::Triangle { points } => {
            canvas.begin_path();
            canvas.move_to(x + points[0], y + points[1] - SELECTION_PAD);
            canvas.line_to(x + points[2] + SELECTION_PAD, y + points[3] + SELECTION_PAD);
            canvas.line_to(x + points[4] - SELECTION_PAD, y + points[5] + SELECTION_PAD);
            canvas.close_path();
            canvas.stroke();
        }
        Geometry::Line { points } => {
            let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
            let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
            for p in points_of(points) {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
            if min_x.is_finite() {
                canvas.stroke_rect(
                    x + min_x - LINE_SELECTION_PAD,
                    y + min_y - LINE_SELECTION_PAD,
                    max_x - min_x + 2.0 * LINE_SELECTION_PAD,
                    max_y - min_y + 2.0 * LINE_SELECTION_PAD,
                );
            }
        }
        Geometry::Text { .. } => {
            let (w, h) = (shape.bounding_width(), shape.bounding_height());
            canvas.stroke_rect(
                x - SELECTION_PAD,
                y - h - SELECTION_PAD,
                w + 2.0 * SELECTION_PAD,
                h + 2.0 * SELECTION_PAD,
            );
        }
    }

    canvas.set_line_dash(&[]);
    canvas.set_line_width(1.5);
    if let Some(corners) = rectangle_corners(shape) {
        canvas.set_fill_style(theme.handle_fill);
        canvas.set_stroke_style(theme.handle_stroke);
        let half = CORNER_HANDLE_SIZE / 2.0;
        for c in corners {
            canvas.fill_rect(c.x - half, c.y - half, CORNER_HANDLE_SIZE, CORNER_HANDLE_SIZE);
            canvas.stroke_rect(c.x - half, c.y - half, CORNER_HANDLE_SIZE, CORNER_HANDLE_SIZE);
        }
    }
    draw_line_handles(canvas, shape, options, theme);
    canvas.restore();
}

fn draw_line_handles(
    canvas: &mut impl Canvas2d,
    shape: &Shape,
    options: &RenderOptions,
    theme: &CanvasTheme,
) {
    let (Some(mid), Some(rotate_at)) = (
        shape.line_midpoint(),
        rotate_handle_position(shape, &options.hit),
    ) else {
        return;
    };

    // Stem from the midpoint to the rotate handle.
    canvas.set_stroke_style(theme.rotate_handle);
    canvas.begin_path();
    canvas.move_to(mid.x, mid.y);
    canvas.line_to(rotate_at.x, rotate_at.y);
    canvas.stroke();

    for (handle, at) in line_handles(shape, &options.hit) {
        let fill = if options.hovered_handle == Some(handle) {
            theme.handle_hover
        } else {
            match handle {
                Handle::Vertex(_) => theme.handle_fill,
                Handle::Rotate => theme.rotate_handle,
            }
        };
        canvas.set_fill_style(fill);
        canvas.set_stroke_style(theme.handle_stroke);
        canvas.begin_path();
        canvas.arc(at.x, at.y, POINT_HANDLE_RADIUS, 0.0, TAU);
        canvas.fill();
        canvas.stroke();
    }
}

// ─── Frames and previews ─────────────────────────────────────────────────

/// Draw a template's outer silhouette in a `width × height` box, rotated
/// by `rotation_deg` about the box centre.
pub fn render_frame(
    canvas: &mut impl Canvas2d,
    frame: &Frame,
    width: f64,
    height: f64,
    rotation_deg: f64,
) {
    canvas.save();
    if rotation_deg != 0.0 {
        canvas.translate(width / 2.0, height / 2.0);
        canvas.rotate(rotation_deg.to_radians());
        canvas.translate(-width / 2.0, -height / 2.0);
    }
    canvas.set_fill_style(&frame.fill_color);
    canvas.set_stroke_style(&frame.stroke_color);
    canvas.set_line_width(frame.stroke_width);

    // Keep the stroke inside the box.
    let inset = frame.stroke_width / 2.0;
    let (x, y, w, h) = (inset, inset, width - 2.0 * inset, height - 2.0 * inset);
    match frame.kind {
        FrameKind::Square | FrameKind::Wide | FrameKind::Tall => {
            rounded_rect_path(canvas, x, y, w, h, FRAME_CORNER_RADIUS);
        }
        FrameKind::Circle => {
            canvas.begin_path();
            canvas.ellipse(x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0, 0.0, 0.0, TAU);
        }
        FrameKind::Triangle => {
            canvas.begin_path();
            canvas.move_to(x + w / 2.0, y);
            canvas.line_to(x + w, y + h);
            canvas.line_to(x, y + h);
            canvas.close_path();
        }
    }
    canvas.fill();
    if frame.stroke_width > 0.0 {
        canvas.stroke();
    }
    canvas.restore();
}

/// Draw a template as a node shows it: the frame rotated by the node's
/// override (or the template's own rotation), then the shapes, which the
/// frame rotation does not affect.
pub fn render_template_preview(
    canvas: &mut impl Canvas2d,
    template: &Template,
    rotation_override: Option<f64>,
) {
    let rotation = rotation_override.unwrap_or(template.frame.rotation);
    canvas.clear_rect(0.0, 0.0, template.width, template.height);
    render_frame(canvas, &template.frame, template.width, template.height, rotation);
    for shape in paint_order(&template.shapes) {
        paint_shape(canvas, shape);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(canvas: &mut impl Canvas2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    canvas.begin_path();
    canvas.move_to(x + r, y);
    canvas.line_to(x + w - r, y);
    canvas.arc_to(x + w, y, x + w, y + r, r);
    canvas.line_to(x + w, y + h - r);
    canvas.arc_to(x + w, y + h, x + w - r, y + h, r);
    canvas.line_to(x + r, y + h);
    canvas.arc_to(x, y + h, x, y + h - r, r);
    canvas.line_to(x, y + r);
    canvas.arc_to(x, y, x + r, y, r);
    canvas.close_path();
}
