//! Drawing port.
//!
//! [`Canvas2d`] is the subset of the HTML Canvas 2D API the renderer uses.
//! The browser bridge implements it over `CanvasRenderingContext2d`;
//! [`RecordingCanvas`] implements it in memory for tests and headless use.
//! Angles are radians, as in the Canvas API.

pub trait Canvas2d {
    fn save(&mut self);
    fn restore(&mut self);

    fn set_global_alpha(&mut self, alpha: f64);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    /// An empty slice restores solid strokes.
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: &str);

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64);
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
    );

    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

/// One recorded [`Canvas2d`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Save,
    Restore,
    GlobalAlpha(f64),
    Translate(f64, f64),
    Rotate(f64),
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    LineDash(Vec<f64>),
    Font(String),
    TextAlign(String),
    ClearRect(f64, f64, f64, f64),
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
    Rect(f64, f64, f64, f64),
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
    },
    ArcTo(f64, f64, f64, f64, f64),
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
    },
    Fill,
    Stroke,
    FillText(String, f64, f64),
}

/// A canvas that records every call instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCmd>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Save depth after replaying every command. Zero when balanced.
    pub fn open_saves(&self) -> isize {
        self.commands.iter().fold(0, |depth, cmd| match cmd {
            DrawCmd::Save => depth + 1,
            DrawCmd::Restore => depth - 1,
            _ => depth,
        })
    }

    /// Texts passed to `fill_text`, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::FillText(t, _, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCmd) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Canvas2d for RecordingCanvas {
    fn save(&mut self) {
        self.commands.push(DrawCmd::Save);
    }
    fn restore(&mut self) {
        self.commands.push(DrawCmd::Restore);
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCmd::GlobalAlpha(alpha));
    }
    fn translate(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCmd::Translate(x, y));
    }
    fn rotate(&mut self, angle: f64) {
        self.commands.push(DrawCmd::Rotate(angle));
    }
    fn set_fill_style(&mut self, color: &str) {
        self.commands.push(DrawCmd::FillStyle(color.to_string()));
    }
    fn set_stroke_style(&mut self, color: &str) {
        self.commands.push(DrawCmd::StrokeStyle(color.to_string()));
    }
    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCmd::LineWidth(width));
    }
    fn set_line_dash(&mut self, segments: &[f64]) {
        self.commands.push(DrawCmd::LineDash(segments.to_vec()));
    }
    fn set_font(&mut self, font: &str) {
        self.commands.push(DrawCmd::Font(font.to_string()));
    }
    fn set_text_align(&mut self, align: &str) {
        self.commands.push(DrawCmd::TextAlign(align.to_string()));
    }
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCmd::ClearRect(x, y, w, h));
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCmd::FillRect(x, y, w, h));
    }
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCmd::StrokeRect(x, y, w, h));
    }
    fn begin_path(&mut self) {
        self.commands.push(DrawCmd::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCmd::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCmd::LineTo(x, y));
    }
    fn close_path(&mut self) {
        self.commands.push(DrawCmd::ClosePath);
    }
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCmd::Rect(x, y, w, h));
    }
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.commands.push(DrawCmd::Arc {
            x,
            y,
            radius,
            start,
            end,
        });
    }
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.commands.push(DrawCmd::ArcTo(x1, y1, x2, y2, radius));
    }
    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        _start: f64,
        _end: f64,
    ) {
        self.commands.push(DrawCmd::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
        });
    }
    fn fill(&mut self) {
        self.commands.push(DrawCmd::Fill);
    }
    fn stroke(&mut self) {
        self.commands.push(DrawCmd::Stroke);
    }
    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCmd::FillText(text.to_string(), x, y));
    }
}
