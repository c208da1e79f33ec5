//! Hit testing: canvas point → shape, and point → manipulation handle.
//!
//! Rectangle, triangle and text tests use the unrotated geometry; only
//! painting applies `rotation`.

use kurbo::Point;
use mf_core::geometry::{distance_to_segment, point_in_triangle, points_of};
use mf_core::{EditorConfig, Geometry, Id, Shape, paint_order};

/// Radii and offsets used by hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSettings {
    /// A line is hit closer than this; a handle is grabbed within it.
    pub tolerance: f64,
    /// How far above a line's midpoint its rotate handle sits.
    pub rotate_handle_offset: f64,
}

impl Default for HitSettings {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            rotate_handle_offset: 30.0,
        }
    }
}

impl From<&EditorConfig> for HitSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            tolerance: config.hit_tolerance,
            rotate_handle_offset: config.rotate_handle_offset,
        }
    }
}

/// A draggable control on the selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// Vertex `n` of a line.
    Vertex(usize),
    /// The synthetic handle above a line's midpoint.
    Rotate,
}

/// Whether canvas point `(x, y)` lies on `shape`.
pub fn point_in_shape(x: f64, y: f64, shape: &Shape, settings: &HitSettings) -> bool {
    let p = Point::new(x, y);
    let origin = shape.position();
    match &shape.geometry {
        Geometry::Rectangle { width, height, .. } => {
            x >= shape.x && x <= shape.x + width && y >= shape.y && y <= shape.y + height
        }
        Geometry::Circle { radius } => {
            let center = Point::new(shape.x + radius, shape.y + radius);
            p.distance(center) <= *radius
        }
        Geometry::Triangle { points } => {
            let [a, b, c] =
                [0, 2, 4].map(|i| Point::new(origin.x + points[i], origin.y + points[i + 1]));
            point_in_triangle(p, a, b, c)
        }
        Geometry::Line { points } => {
            let vertices: Vec<Point> = points_of(points).map(|v| origin + v.to_vec2()).collect();
            vertices
                .windows(2)
                .any(|seg| distance_to_segment(p, seg[0], seg[1]) < settings.tolerance)
        }
        Geometry::Text { .. } => {
            // Bounds grow upward from the baseline at `y`.
            let width = shape.bounding_width();
            let height = shape.bounding_height();
            x >= shape.x && x <= shape.x + width && y >= shape.y - height && y <= shape.y
        }
    }
}

/// The topmost shape under `(x, y)`: the last one in paint order that hits.
pub fn hit_test(shapes: &[Shape], x: f64, y: f64, settings: &HitSettings) -> Option<Id> {
    paint_order(shapes)
        .into_iter()
        .rev()
        .find(|s| point_in_shape(x, y, s, settings))
        .map(|s| s.id)
}

/// Absolute position of a line's rotate handle.
pub fn rotate_handle_position(shape: &Shape, settings: &HitSettings) -> Option<Point> {
    let mid = shape.line_midpoint()?;
    Some(Point::new(mid.x, mid.y - settings.rotate_handle_offset))
}

/// Every handle of `shape` with its absolute position. Only lines have
/// draggable handles.
pub fn line_handles(shape: &Shape, settings: &HitSettings) -> Vec<(Handle, Point)> {
    let Some(points) = shape.line_points() else {
        return Vec::new();
    };
    let origin = shape.position();
    let mut handles: Vec<(Handle, Point)> = points_of(points)
        .enumerate()
        .map(|(i, v)| (Handle::Vertex(i), origin + v.to_vec2()))
        .collect();
    if let Some(rotate) = rotate_handle_position(shape, settings) {
        handles.push((Handle::Rotate, rotate));
    }
    handles
}

/// The handle nearest to `(x, y)` within the tolerance radius.
pub fn handle_at_point(x: f64, y: f64, shape: &Shape, settings: &HitSettings) -> Option<Handle> {
    let p = Point::new(x, y);
    line_handles(shape, settings)
        .into_iter()
        .map(|(handle, at)| (handle, p.distance(at)))
        .filter(|(_, d)| *d <= settings.tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}

/// Corners of a rectangle, clockwise from top-left. Drawn, not draggable.
pub fn rectangle_corners(shape: &Shape) -> Option<[Point; 4]> {
    let Geometry::Rectangle { width, height, .. } = shape.geometry else {
        return None;
    };
    let (x, y) = (shape.x, shape.y);
    Some([
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{GeometryUpdate, ShapeKind, ShapeUpdate, create_default_shape, merge_shape_update};
    use smallvec::smallvec;

    fn settings() -> HitSettings {
        HitSettings::default()
    }

    fn shape_at(kind: ShapeKind, name: &str, x: f64, y: f64) -> Shape {
        let mut s = create_default_shape(kind, Id::intern(name));
        s.x = x;
        s.y = y;
        s
    }

    #[test]
    fn rectangle_containment() {
        let r = shape_at(ShapeKind::Rectangle, "r", 10.0, 10.0);
        assert!(point_in_shape(30.0, 30.0, &r, &settings()));
        assert!(point_in_shape(60.0, 60.0, &r, &settings()));
        assert!(!point_in_shape(100.0, 100.0, &r, &settings()));
    }

    #[test]
    fn rectangle_rotation_is_ignored() {
        let mut r = shape_at(ShapeKind::Rectangle, "r", 10.0, 10.0);
        r.rotation = 45.0;
        assert!(point_in_shape(12.0, 12.0, &r, &settings()));
    }

    #[test]
    fn circle_uses_center_from_top_left() {
        let c = shape_at(ShapeKind::Circle, "c", 0.0, 0.0);
        assert!(point_in_shape(25.0, 25.0, &c, &settings()));
        assert!(point_in_shape(50.0, 25.0, &c, &settings()));
        assert!(!point_in_shape(2.0, 2.0, &c, &settings()));
    }

    #[test]
    fn triangle_barycentric() {
        let mut t = shape_at(ShapeKind::Triangle, "t", 0.0, 0.0);
        t.geometry = Geometry::Triangle {
            points: [0.0, 0.0, 10.0, 0.0, 0.0, 10.0],
        };
        assert!(point_in_shape(2.0, 2.0, &t, &settings()));
        assert!(!point_in_shape(9.0, 9.0, &t, &settings()));
    }

    #[test]
    fn degenerate_triangle_never_hits() {
        let mut t = shape_at(ShapeKind::Triangle, "t", 0.0, 0.0);
        t.geometry = Geometry::Triangle {
            points: [0.0, 0.0, 5.0, 5.0, 10.0, 10.0],
        };
        assert!(!point_in_shape(5.0, 5.0, &t, &settings()));
    }

    #[test]
    fn line_distance_threshold() {
        let mut l = shape_at(ShapeKind::Line, "l", 0.0, 0.0);
        l.geometry = Geometry::Line {
            points: smallvec![0.0, 0.0, 100.0, 0.0],
        };
        assert!(point_in_shape(50.0, 5.0, &l, &settings()));
        assert!(!point_in_shape(50.0, 20.0, &l, &settings()));
    }

    #[test]
    fn polyline_checks_every_segment() {
        let mut l = shape_at(ShapeKind::Line, "l", 10.0, 10.0);
        l.geometry = Geometry::Line {
            points: smallvec![0.0, 0.0, 50.0, 0.0, 50.0, 50.0],
        };
        assert!(point_in_shape(62.0, 40.0, &l, &settings()));
    }

    #[test]
    fn zero_length_line_segment() {
        let mut l = shape_at(ShapeKind::Line, "l", 0.0, 0.0);
        l.geometry = Geometry::Line {
            points: smallvec![5.0, 5.0, 5.0, 5.0],
        };
        assert!(point_in_shape(7.0, 7.0, &l, &settings()));
        assert!(!point_in_shape(30.0, 30.0, &l, &settings()));
    }

    #[test]
    fn text_bounds_extend_above_baseline() {
        let t = shape_at(ShapeKind::Text, "t", 10.0, 50.0);
        // "Text" at 14px: 33.6 wide, 14 tall.
        assert!(point_in_shape(20.0, 40.0, &t, &settings()));
        assert!(!point_in_shape(20.0, 55.0, &t, &settings()));
        assert!(!point_in_shape(50.0, 40.0, &t, &settings()));
    }

    #[test]
    fn empty_text_is_still_hittable() {
        let mut t = shape_at(ShapeKind::Text, "t", 10.0, 50.0);
        if let Geometry::Text { text, .. } = &mut t.geometry {
            text.clear();
        }
        assert!(point_in_shape(30.0, 45.0, &t, &settings()));
        assert_eq!(hit_test(std::slice::from_ref(&t), 30.0, 45.0, &settings()), Some(t.id));
    }

    #[test]
    fn topmost_by_paint_order_wins() {
        let mut below = shape_at(ShapeKind::Rectangle, "below", 0.0, 0.0);
        below.z_index = 0;
        let mut above = shape_at(ShapeKind::Rectangle, "above", 20.0, 20.0);
        above.z_index = 5;
        // Array order puts `above` first; z order still wins.
        let shapes = vec![above, below];
        assert_eq!(hit_test(&shapes, 30.0, 30.0, &settings()), Some(Id::intern("above")));
        assert_eq!(hit_test(&shapes, 5.0, 5.0, &settings()), Some(Id::intern("below")));
        assert_eq!(hit_test(&shapes, 500.0, 5.0, &settings()), None);
    }

    #[test]
    fn equal_z_later_in_array_wins() {
        let a = shape_at(ShapeKind::Rectangle, "first", 0.0, 0.0);
        let b = shape_at(ShapeKind::Rectangle, "second", 0.0, 0.0);
        assert_eq!(hit_test(&[a, b], 10.0, 10.0, &settings()), Some(Id::intern("second")));
    }

    #[test]
    fn line_handles_and_rotate_handle() {
        let l = shape_at(ShapeKind::Line, "l", 100.0, 100.0);
        assert_eq!(handle_at_point(101.0, 99.0, &l, &settings()), Some(Handle::Vertex(0)));
        assert_eq!(handle_at_point(178.0, 100.0, &l, &settings()), Some(Handle::Vertex(1)));
        // Midpoint (140, 100); rotate handle 30 above.
        assert_eq!(handle_at_point(140.0, 72.0, &l, &settings()), Some(Handle::Rotate));
        assert_eq!(handle_at_point(140.0, 100.0, &l, &settings()), None);
    }

    #[test]
    fn nearest_handle_wins_when_radii_overlap() {
        let l = merge_shape_update(
            &shape_at(ShapeKind::Line, "short", 0.0, 0.0),
            &ShapeUpdate {
                geometry: Some(GeometryUpdate::Line {
                    points: Some(smallvec![0.0, 0.0, 8.0, 0.0]),
                }),
                ..Default::default()
            },
        );
        assert_eq!(handle_at_point(7.0, 0.0, &l, &settings()), Some(Handle::Vertex(1)));
        assert_eq!(handle_at_point(1.0, 0.0, &l, &settings()), Some(Handle::Vertex(0)));
    }

    #[test]
    fn non_lines_have_no_handles() {
        let r = shape_at(ShapeKind::Rectangle, "r", 0.0, 0.0);
        assert!(line_handles(&r, &settings()).is_empty());
        assert_eq!(handle_at_point(0.0, 0.0, &r, &settings()), None);
        assert!(rectangle_corners(&r).is_some());
    }
}
