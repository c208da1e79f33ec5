//! Shape model: the primitives a template is composed of.
//!
//! A [`Shape`] carries the fields every kind shares plus a [`Geometry`]
//! payload whose variant *is* the kind. Serialised, the two are flattened
//! into one object with a `type` tag:
//!
//! ```json
//! { "id": "shape-1", "type": "circle", "x": 10, "y": 10, "radius": 25, ... }
//! ```
//!
//! Partial edits go through [`ShapeUpdate`]; geometry edits are a
//! per-kind [`GeometryUpdate`], so an edit for the wrong kind is a
//! visible mismatch instead of a silently ignored field.

use crate::geometry;
use crate::id::Id;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// Nominal extent used for triangle and line bounds.
pub const NOMINAL_EXTENT: f64 = 50.0;
/// Average glyph advance as a fraction of the font size.
pub const GLYPH_ADVANCE: f64 = 0.6;
/// Drawn in place of an empty text shape so it stays visible and clickable.
pub const PLACEHOLDER_TEXT: &str = "Text";

pub type LinePoints = SmallVec<[f64; 8]>;

// ─── Kinds and styles ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Line,
    Text,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Line,
        ShapeKind::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Line => "line",
            ShapeKind::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Canvas line-dash segments; empty means a continuous stroke.
    pub fn dash_pattern(self) -> &'static [f64] {
        match self {
            StrokeStyle::Solid => &[],
            StrokeStyle::Dashed => &[8.0, 4.0],
            StrokeStyle::Dotted => &[2.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

// ─── Shape ───────────────────────────────────────────────────────────────

/// Kind-specific payload. Point lists are relative to the shape position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    #[serde(rename_all = "camelCase")]
    Rectangle {
        width: f64,
        height: f64,
        #[serde(default, alias = "borderRadius", skip_serializing_if = "Option::is_none")]
        corner_radius: Option<f64>,
    },
    Circle {
        radius: f64,
    },
    Triangle {
        points: [f64; 6],
    },
    Line {
        points: LinePoints,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_size: f64,
        font_family: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_weight: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_style: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_align: Option<TextAlign>,
    },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Triangle { .. } => ShapeKind::Triangle,
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Text { .. } => ShapeKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    /// Degrees, applied about [`Shape::center`] when painting.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(alias = "color")]
    pub fill_color: String,
    #[serde(default = "default_stroke_color", alias = "borderColor")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width", alias = "borderWidth")]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(flatten)]
    pub geometry: Geometry,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width of the shape's box. Exact for rectangles and circles,
    /// a nominal size for triangles and lines, and a glyph-count
    /// estimate for text.
    pub fn bounding_width(&self) -> f64 {
        match &self.geometry {
            Geometry::Rectangle { width, .. } => *width,
            Geometry::Circle { radius } => radius * 2.0,
            Geometry::Triangle { .. } | Geometry::Line { .. } => NOMINAL_EXTENT,
            Geometry::Text { text, font_size, .. } => text_width(text, *font_size),
        }
    }

    pub fn bounding_height(&self) -> f64 {
        match &self.geometry {
            Geometry::Rectangle { height, .. } => *height,
            Geometry::Circle { radius } => radius * 2.0,
            Geometry::Triangle { .. } | Geometry::Line { .. } => NOMINAL_EXTENT,
            Geometry::Text { font_size, .. } => *font_size,
        }
    }

    /// Position plus half the bounding box; the pivot for painted rotation.
    pub fn center(&self) -> Point {
        Point::new(
            self.x + self.bounding_width() / 2.0,
            self.y + self.bounding_height() / 2.0,
        )
    }

    /// Line vertices, relative to the position. `None` for other kinds.
    pub fn line_points(&self) -> Option<&[f64]> {
        match &self.geometry {
            Geometry::Line { points } => Some(points),
            _ => None,
        }
    }

    /// Absolute midpoint of a line (mean of its vertices).
    pub fn line_midpoint(&self) -> Option<Point> {
        let mid = geometry::polyline_midpoint(self.line_points()?)?;
        Some(Point::new(self.x + mid.x, self.y + mid.y))
    }

    /// Deep copy under a new id, shifted by `offset` on both axes and restacked at `z_index`.
    pub fn duplicate(&self, id: Id, offset: f64, z_index: i32) -> Shape {
        Shape {
            id,
            x: self.x + offset,
            y: self.y + offset,
            z_index,
            ..self.clone()
        }
    }
}

/// What a text shape shows: its content, or the placeholder when empty.
pub fn display_text(text: &str) -> &str {
    if text.is_empty() {
        PLACEHOLDER_TEXT
    } else {
        text
    }
}

/// Approximate rendered width of `text` at `font_size`. Empty text
/// measures as the placeholder it is drawn with.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    display_text(text).chars().count() as f64 * font_size * GLYPH_ADVANCE
}

/// A shape of `kind` at the origin with the stock defaults.
pub fn create_default_shape(kind: ShapeKind, id: Id) -> Shape {
    let (fill, stroke_width, geometry) = match kind {
        ShapeKind::Rectangle => (
            "#3b82f6",
            1.0,
            Geometry::Rectangle {
                width: 50.0,
                height: 50.0,
                corner_radius: None,
            },
        ),
        ShapeKind::Circle => ("#10b981", 1.0, Geometry::Circle { radius: 25.0 }),
        ShapeKind::Triangle => (
            "#f59e0b",
            1.0,
            Geometry::Triangle {
                points: [25.0, 0.0, 50.0, 50.0, 0.0, 50.0],
            },
        ),
        ShapeKind::Line => (
            "transparent",
            2.0,
            Geometry::Line {
                points: smallvec![0.0, 0.0, 80.0, 0.0],
            },
        ),
        ShapeKind::Text => (
            "#000000",
            1.0,
            Geometry::Text {
                text: PLACEHOLDER_TEXT.to_string(),
                font_size: 14.0,
                font_family: "Arial".to_string(),
                font_weight: None,
                font_style: None,
                text_align: None,
            },
        ),
    };
    Shape {
        id,
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        opacity: 1.0,
        z_index: 0,
        fill_color: fill.to_string(),
        stroke_color: default_stroke_color(),
        stroke_width,
        stroke_style: StrokeStyle::Solid,
        geometry,
    }
}

/// Shapes in paint order: ascending `z_index`, ties kept in slice order.
pub fn paint_order(shapes: &[Shape]) -> Vec<&Shape> {
    let mut ordered: Vec<&Shape> = shapes.iter().collect();
    ordered.sort_by_key(|s| s.z_index);
    ordered
}

// ─── Updates ─────────────────────────────────────────────────────────────

/// A partial edit of a shape. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeUpdate {
    /// A kind tag carried by the edit. Kinds are immutable; a differing
    /// tag is dropped during the merge.
    pub kind: Option<ShapeKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<StrokeStyle>,
    pub geometry: Option<GeometryUpdate>,
}

impl ShapeUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn line_points(points: LinePoints) -> Self {
        Self {
            geometry: Some(GeometryUpdate::Line {
                points: Some(points),
            }),
            ..Default::default()
        }
    }
}

/// Per-kind geometry edit.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryUpdate {
    Rectangle {
        width: Option<f64>,
        height: Option<f64>,
        corner_radius: Option<f64>,
    },
    Circle {
        radius: Option<f64>,
    },
    Triangle {
        points: Option<[f64; 6]>,
    },
    Line {
        points: Option<LinePoints>,
    },
    Text {
        text: Option<String>,
        font_size: Option<f64>,
        font_family: Option<String>,
        font_weight: Option<String>,
        font_style: Option<String>,
        text_align: Option<TextAlign>,
    },
}

impl GeometryUpdate {
    pub fn kind(&self) -> ShapeKind {
        match self {
            GeometryUpdate::Rectangle { .. } => ShapeKind::Rectangle,
            GeometryUpdate::Circle { .. } => ShapeKind::Circle,
            GeometryUpdate::Triangle { .. } => ShapeKind::Triangle,
            GeometryUpdate::Line { .. } => ShapeKind::Line,
            GeometryUpdate::Text { .. } => ShapeKind::Text,
        }
    }
}

fn finite(id: Id, field: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(v) => {
            log::warn!("shape {id}: dropping non-finite {field} ({v})");
            None
        }
        None => None,
    }
}

fn set_finite(target: &mut f64, id: Id, field: &str, value: Option<f64>) {
    if let Some(v) = finite(id, field, value) {
        *target = v;
    }
}

fn set_size(target: &mut f64, id: Id, field: &str, value: Option<f64>) {
    if let Some(v) = finite(id, field, value) {
        *target = v.max(0.0);
    }
}

/// Apply `update` to a copy of `original`.
///
/// The result always has the original's id and kind. Fragments that
/// cannot apply (a kind change, geometry for another kind, non-finite
/// numbers, malformed point lists) are dropped with a warning and the
/// rest of the update still applies.
pub fn merge_shape_update(original: &Shape, update: &ShapeUpdate) -> Shape {
    let mut shape = original.clone();
    let id = original.id;
    let kind = original.kind();

    if let Some(requested) = update.kind
        && requested != kind
    {
        log::warn!("shape {id}: ignoring kind change {kind} -> {requested}");
    }

    set_finite(&mut shape.x, id, "x", update.x);
    set_finite(&mut shape.y, id, "y", update.y);
    set_finite(&mut shape.rotation, id, "rotation", update.rotation);
    if let Some(opacity) = finite(id, "opacity", update.opacity) {
        shape.opacity = opacity.clamp(0.0, 1.0);
    }
    if let Some(z) = update.z_index {
        shape.z_index = z;
    }
    if let Some(fill) = &update.fill_color {
        shape.fill_color.clone_from(fill);
    }
    if let Some(stroke) = &update.stroke_color {
        shape.stroke_color.clone_from(stroke);
    }
    set_size(&mut shape.stroke_width, id, "strokeWidth", update.stroke_width);
    if let Some(style) = update.stroke_style {
        shape.stroke_style = style;
    }

    if let Some(geometry) = &update.geometry {
        merge_geometry(&mut shape.geometry, geometry, id);
    }
    shape
}

fn merge_geometry(target: &mut Geometry, update: &GeometryUpdate, id: Id) {
    match (target, update) {
        (
            Geometry::Rectangle {
                width,
                height,
                corner_radius,
            },
            GeometryUpdate::Rectangle {
                width: w,
                height: h,
                corner_radius: r,
            },
        ) => {
            set_size(width, id, "width", *w);
            set_size(height, id, "height", *h);
            if let Some(r) = finite(id, "cornerRadius", *r) {
                *corner_radius = Some(r.max(0.0));
            }
        }
        (Geometry::Circle { radius }, GeometryUpdate::Circle { radius: r }) => {
            set_size(radius, id, "radius", *r);
        }
        (Geometry::Triangle { points }, GeometryUpdate::Triangle { points: p }) => {
            if let Some(p) = p {
                if p.iter().all(|v| v.is_finite()) {
                    *points = *p;
                } else {
                    log::warn!("shape {id}: dropping triangle points with non-finite values");
                }
            }
        }
        (Geometry::Line { points }, GeometryUpdate::Line { points: p }) => {
            if let Some(p) = p {
                if p.len() >= 4 && p.len() % 2 == 0 && p.iter().all(|v| v.is_finite()) {
                    points.clone_from(p);
                } else {
                    log::warn!(
                        "shape {id}: dropping malformed line points ({} values)",
                        p.len()
                    );
                }
            }
        }
        (
            Geometry::Text {
                text,
                font_size,
                font_family,
                font_weight,
                font_style,
                text_align,
            },
            GeometryUpdate::Text {
                text: t,
                font_size: fs,
                font_family: ff,
                font_weight: fw,
                font_style: fst,
                text_align: ta,
            },
        ) => {
            if let Some(t) = t {
                text.clone_from(t);
            }
            set_size(font_size, id, "fontSize", *fs);
            if let Some(ff) = ff {
                font_family.clone_from(ff);
            }
            if fw.is_some() {
                font_weight.clone_from(fw);
            }
            if fst.is_some() {
                font_style.clone_from(fst);
            }
            if ta.is_some() {
                *text_align = *ta;
            }
        }
        (target, update) => {
            log::warn!(
                "shape {id}: ignoring {} geometry update for a {}",
                update.kind(),
                target.kind()
            );
        }
    }
}

// ─── Loose JSON patches ──────────────────────────────────────────────────

/// A flat, untyped partial shape as it arrives from a property form or
/// script bridge. [`ShapePatch::resolve`] turns it into a typed
/// [`ShapeUpdate`] for a concrete kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapePatch {
    #[serde(rename = "type")]
    pub kind: Option<ShapeKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
    #[serde(alias = "color")]
    pub fill_color: Option<String>,
    #[serde(alias = "borderColor")]
    pub stroke_color: Option<String>,
    #[serde(alias = "borderWidth")]
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<StrokeStyle>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(alias = "borderRadius")]
    pub corner_radius: Option<f64>,
    pub radius: Option<f64>,
    pub points: Option<Vec<f64>>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub text_align: Option<TextAlign>,
}

impl ShapePatch {
    /// Keep the fields that make sense for `kind`; log and drop the rest.
    pub fn resolve(self, kind: ShapeKind) -> ShapeUpdate {
        let ShapePatch {
            kind: requested,
            x,
            y,
            rotation,
            opacity,
            z_index,
            fill_color,
            stroke_color,
            stroke_width,
            stroke_style,
            width,
            height,
            corner_radius,
            radius,
            points,
            text,
            font_size,
            font_family,
            font_weight,
            font_style,
            text_align,
        } = self;

        let mut stray: Vec<&str> = Vec::new();
        let mut note = |present: bool, name: &'static str| {
            if present {
                stray.push(name);
            }
        };

        let geometry = match kind {
            ShapeKind::Rectangle => {
                note(radius.is_some(), "radius");
                note(points.is_some(), "points");
                note(text.is_some() || font_size.is_some() || font_family.is_some(), "text");
                (width.is_some() || height.is_some() || corner_radius.is_some()).then_some(
                    GeometryUpdate::Rectangle {
                        width,
                        height,
                        corner_radius,
                    },
                )
            }
            ShapeKind::Circle => {
                note(width.is_some() || height.is_some(), "width/height");
                note(points.is_some(), "points");
                note(text.is_some() || font_size.is_some() || font_family.is_some(), "text");
                radius.map(|r| GeometryUpdate::Circle { radius: Some(r) })
            }
            ShapeKind::Triangle => {
                note(width.is_some() || height.is_some() || radius.is_some(), "size");
                note(text.is_some() || font_size.is_some() || font_family.is_some(), "text");
                match points {
                    Some(p) => match <[f64; 6]>::try_from(p.as_slice()) {
                        Ok(pts) => Some(GeometryUpdate::Triangle { points: Some(pts) }),
                        Err(_) => {
                            note(true, "points (triangle needs 6 values)");
                            None
                        }
                    },
                    None => None,
                }
            }
            ShapeKind::Line => {
                note(width.is_some() || height.is_some() || radius.is_some(), "size");
                note(text.is_some() || font_size.is_some() || font_family.is_some(), "text");
                points.map(|p| GeometryUpdate::Line {
                    points: Some(LinePoints::from_vec(p)),
                })
            }
            ShapeKind::Text => {
                note(width.is_some() || height.is_some() || radius.is_some(), "size");
                note(points.is_some(), "points");
                let any = text.is_some()
                    || font_size.is_some()
                    || font_family.is_some()
                    || font_weight.is_some()
                    || font_style.is_some()
                    || text_align.is_some();
                any.then_some(GeometryUpdate::Text {
                    text,
                    font_size,
                    font_family,
                    font_weight,
                    font_style,
                    text_align,
                })
            }
        };

        if !stray.is_empty() {
            log::warn!("ignoring fields not applicable to a {kind}: {}", stray.join(", "));
        }

        ShapeUpdate {
            kind: requested,
            x,
            y,
            rotation,
            opacity,
            z_index,
            fill_color,
            stroke_color,
            stroke_width,
            stroke_style,
            geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect() -> Shape {
        let mut s = create_default_shape(ShapeKind::Rectangle, Id::intern("rect"));
        s.x = 10.0;
        s.y = 10.0;
        s
    }

    #[test]
    fn defaults_per_kind() {
        for kind in ShapeKind::ALL {
            let s = create_default_shape(kind, Id::intern("d"));
            assert_eq!(s.kind(), kind);
            assert_eq!(s.opacity, 1.0);
            assert_eq!(s.z_index, 0);
            assert_eq!(s.stroke_color, "#000000");
            assert_eq!(s.stroke_style, StrokeStyle::Solid);
        }
        let line = create_default_shape(ShapeKind::Line, Id::intern("l"));
        assert_eq!(line.fill_color, "transparent");
        assert_eq!(line.line_points(), Some(&[0.0, 0.0, 80.0, 0.0][..]));
    }

    #[test]
    fn kind_change_is_dropped_rest_applies() {
        let original = rect();
        let update = ShapeUpdate {
            kind: Some(ShapeKind::Circle),
            x: Some(40.0),
            geometry: Some(GeometryUpdate::Circle { radius: Some(5.0) }),
            ..Default::default()
        };
        let merged = merge_shape_update(&original, &update);
        assert_eq!(merged.kind(), ShapeKind::Rectangle);
        assert_eq!(merged.x, 40.0);
        assert_eq!(merged.geometry, original.geometry);
    }

    #[test]
    fn kind_is_immutable_for_every_pair() {
        for from in ShapeKind::ALL {
            for to in ShapeKind::ALL {
                let s = create_default_shape(from, Id::intern("k"));
                let u = ShapeUpdate {
                    kind: Some(to),
                    ..Default::default()
                };
                assert_eq!(merge_shape_update(&s, &u).kind(), from);
            }
        }
    }

    #[test]
    fn non_finite_numbers_are_dropped() {
        let original = rect();
        let update = ShapeUpdate {
            x: Some(f64::NAN),
            y: Some(25.0),
            geometry: Some(GeometryUpdate::Rectangle {
                width: Some(f64::INFINITY),
                height: Some(70.0),
                corner_radius: None,
            }),
            ..Default::default()
        };
        let merged = merge_shape_update(&original, &update);
        assert_eq!(merged.x, 10.0);
        assert_eq!(merged.y, 25.0);
        assert_eq!(merged.bounding_width(), 50.0);
        assert_eq!(merged.bounding_height(), 70.0);
    }

    #[test]
    fn opacity_is_clamped() {
        let merged = merge_shape_update(
            &rect(),
            &ShapeUpdate {
                opacity: Some(3.0),
                ..Default::default()
            },
        );
        assert_eq!(merged.opacity, 1.0);
    }

    #[test]
    fn short_line_points_are_rejected() {
        let line = create_default_shape(ShapeKind::Line, Id::intern("l"));
        let merged = merge_shape_update(&line, &ShapeUpdate::line_points(smallvec![1.0, 2.0]));
        assert_eq!(merged.line_points(), line.line_points());
    }

    #[test]
    fn bounds_heuristics() {
        let text = create_default_shape(ShapeKind::Text, Id::intern("t"));
        assert!((text.bounding_width() - 4.0 * 14.0 * 0.6).abs() < 1e-9);
        assert_eq!(text.bounding_height(), 14.0);
        let mut empty = text.clone();
        if let Geometry::Text { text, .. } = &mut empty.geometry {
            text.clear();
        }
        assert_eq!(empty.bounding_width(), text.bounding_width());
        let tri = create_default_shape(ShapeKind::Triangle, Id::intern("t"));
        assert_eq!(tri.bounding_width(), NOMINAL_EXTENT);
        let circle = create_default_shape(ShapeKind::Circle, Id::intern("c"));
        assert_eq!(circle.center(), Point::new(25.0, 25.0));
    }

    #[test]
    fn dash_patterns() {
        assert!(StrokeStyle::Solid.dash_pattern().is_empty());
        assert_eq!(StrokeStyle::Dashed.dash_pattern(), &[8.0, 4.0]);
        assert_eq!(StrokeStyle::Dotted.dash_pattern(), &[2.0, 4.0]);
    }

    #[test]
    fn paint_order_is_stable() {
        let mut a = rect();
        a.id = Id::intern("a");
        a.z_index = 1;
        let mut b = rect();
        b.id = Id::intern("b");
        b.z_index = 0;
        let mut c = rect();
        c.id = Id::intern("c");
        c.z_index = 1;
        let shapes = vec![a, b, c];
        let order: Vec<&str> = paint_order(&shapes).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn json_is_flat_with_type_tag() {
        let s = create_default_shape(ShapeKind::Circle, Id::intern("c1"));
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["type"], "circle");
        assert_eq!(value["radius"], 25.0);
        assert_eq!(value["fillColor"], "#10b981");
        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r##"{ "id": "r1", "type": "rectangle", "x": 1, "y": 2, "width": 30,
            "height": 40, "borderRadius": 4, "color": "#ff0000", "borderColor": "#111111",
            "borderWidth": 3, "zIndex": 2 }"##;
        let s: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(s.fill_color, "#ff0000");
        assert_eq!(s.stroke_width, 3.0);
        assert_eq!(s.opacity, 1.0);
        assert_eq!(
            s.geometry,
            Geometry::Rectangle {
                width: 30.0,
                height: 40.0,
                corner_radius: Some(4.0)
            }
        );
    }

    #[test]
    fn patch_resolves_for_kind_and_drops_strays() {
        let patch: ShapePatch =
            serde_json::from_str(r#"{ "x": 5, "radius": 9, "width": 60 }"#).unwrap();
        let update = patch.resolve(ShapeKind::Rectangle);
        assert_eq!(update.x, Some(5.0));
        assert_eq!(
            update.geometry,
            Some(GeometryUpdate::Rectangle {
                width: Some(60.0),
                height: None,
                corner_radius: None
            })
        );

        let patch: ShapePatch = serde_json::from_str(r#"{ "points": [1, 2, 3] }"#).unwrap();
        assert_eq!(patch.resolve(ShapeKind::Triangle).geometry, None);
    }
}
