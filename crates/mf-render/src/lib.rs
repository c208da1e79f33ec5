//! Canvas rendering and hit testing for Machine Flow templates.

pub mod canvas;
pub mod hit;
pub mod paint;

pub use canvas::{Canvas2d, DrawCmd, RecordingCanvas};
pub use hit::{Handle, HitSettings, handle_at_point, hit_test, point_in_shape};
pub use paint::{
    CanvasTheme, RenderOptions, paint_shape, render_frame, render_shapes, render_template_preview,
};
