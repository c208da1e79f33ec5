//! Small geometric helpers shared by hit testing and the interaction controller.
//!
//! Coordinates are `f64` canvas units; flat point lists are `[x0, y0, x1, y1, ...]`.

use kurbo::{Affine, Point};

/// Below this magnitude a triangle is treated as degenerate.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Round to the nearest multiple of `grid`. A non-positive grid disables snapping.
pub fn snap(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 || !value.is_finite() {
        return value;
    }
    (value / grid).round() * grid
}

/// Snap every coordinate of a flat point list.
pub fn snap_points(points: &mut [f64], grid: f64) {
    for v in points.iter_mut() {
        *v = snap(*v, grid);
    }
}

/// Iterate a flat coordinate list as points. A trailing odd coordinate is ignored.
pub fn points_of(flat: &[f64]) -> impl Iterator<Item = Point> + '_ {
    flat.chunks_exact(2).map(|c| Point::new(c[0], c[1]))
}

/// Mean of the vertices of a flat point list.
///
/// Rotating a polyline about this point leaves the point itself fixed,
/// so repeated incremental rotations do not drift.
pub fn polyline_midpoint(flat: &[f64]) -> Option<Point> {
    let n = flat.len() / 2;
    if n == 0 {
        return None;
    }
    let (sx, sy) = points_of(flat).fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n as f64, sy / n as f64))
}

/// Rotate every vertex of a flat point list by `theta` radians about `center`.
pub fn rotate_points(flat: &mut [f64], center: Point, theta: f64) {
    if theta == 0.0 || !theta.is_finite() {
        return;
    }
    let rotation = Affine::rotate_about(theta, center);
    for c in flat.chunks_exact_mut(2) {
        let p = rotation * Point::new(c[0], c[1]);
        c[0] = p.x;
        c[1] = p.y;
    }
}

/// Distance from `p` to the segment `a`–`b`.
///
/// The projection is clamped to the segment; a zero-length segment
/// degenerates to the distance to `a`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Barycentric weights of `p` in triangle `a b c`, or `None` for a degenerate triangle.
pub fn barycentric(p: Point, a: Point, b: Point, c: Point) -> Option<(f64, f64, f64)> {
    let denominator = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if denominator.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let wa = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / denominator;
    let wb = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / denominator;
    Some((wa, wb, 1.0 - wa - wb))
}

/// Whether `p` lies inside (or on the edge of) triangle `a b c`.
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let unit = 0.0..=1.0;
    barycentric(p, a, b, c)
        .is_some_and(|(wa, wb, wc)| unit.contains(&wa) && unit.contains(&wb) && unit.contains(&wc))
}

/// Angle in radians of `p` as seen from `origin`.
pub fn angle_from(origin: Point, p: Point) -> f64 {
    (p.y - origin.y).atan2(p.x - origin.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap(14.0, 10.0), 10.0);
        assert_eq!(snap(15.0, 10.0), 20.0);
        assert_eq!(snap(-14.0, 10.0), -10.0);
    }

    #[test]
    fn snap_is_idempotent() {
        for v in [-30.0, 0.0, 10.0, 120.0, 990.0] {
            assert_eq!(snap(v, 10.0), v);
            assert_eq!(snap(snap(v + 3.0, 10.0), 10.0), snap(v + 3.0, 10.0));
        }
    }

    #[test]
    fn snap_with_zero_grid_is_identity() {
        assert_eq!(snap(13.7, 0.0), 13.7);
    }

    #[test]
    fn segment_distance_perpendicular_and_clamped() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert!(approx(distance_to_segment(Point::new(50.0, 5.0), a, b), 5.0));
        // Beyond the end: distance to the endpoint, not the infinite line.
        assert!(approx(distance_to_segment(Point::new(103.0, 4.0), a, b), 5.0));
    }

    #[test]
    fn zero_length_segment_does_not_divide_by_zero() {
        let a = Point::new(10.0, 10.0);
        let d = distance_to_segment(Point::new(13.0, 14.0), a, a);
        assert!(approx(d, 5.0));
    }

    #[test]
    fn degenerate_triangle_has_no_weights() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(5.0, 5.0);
        let c = Point::new(10.0, 10.0);
        assert!(barycentric(Point::new(5.0, 5.0), a, b, c).is_none());
        assert!(!point_in_triangle(Point::new(5.0, 5.0), a, b, c));
    }

    #[test]
    fn midpoint_is_vertex_mean() {
        let m = polyline_midpoint(&[0.0, 0.0, 80.0, 0.0, 40.0, 30.0]).unwrap();
        assert!(approx(m.x, 40.0));
        assert!(approx(m.y, 10.0));
        assert!(polyline_midpoint(&[]).is_none());
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let mut pts = [0.0, 0.0, 80.0, 0.0];
        rotate_points(&mut pts, Point::new(40.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert!(approx(pts[0], 40.0) && approx(pts[1], -40.0));
        assert!(approx(pts[2], 40.0) && approx(pts[3], 40.0));
    }

    #[test]
    fn angle_from_origin() {
        let o = Point::new(10.0, 10.0);
        assert!(approx(angle_from(o, Point::new(20.0, 10.0)), 0.0));
        assert!(approx(angle_from(o, Point::new(10.0, 20.0)), std::f64::consts::FRAC_PI_2));
    }
}
