//! Geometry primitives shared by the path and hit-test algorithms.

use kurbo::{Point, Rect, Vec2};

/// Tolerance below which a segment is treated as a single point.
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Linear interpolation between two points.
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    a.lerp(b, t)
}

/// Result of projecting a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Parameter along the segment, clamped to `[0, 1]`.
    pub t: f64,
    /// Closest point on the segment.
    pub point: Point,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

/// Project `point` onto the segment `a -> b`.
///
/// The projection parameter is clamped to the segment. A degenerate segment
/// (coincident endpoints) projects everything onto `a`.
pub fn project_onto_segment(point: Point, a: Point, b: Point) -> Projection {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < DEGENERATE_EPSILON {
        return Projection {
            t: 0.0,
            point: a,
            distance: pv.hypot(),
        };
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    Projection {
        t,
        point: proj,
        distance: distance(point, proj),
    }
}

/// Distance from a point to a line segment (a -> b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    project_onto_segment(point, a, b).distance
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
///
/// A single-point polyline falls back to point distance; an empty one is
/// infinitely far away.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => distance(point, *only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Axis-aligned bounding box of a point set (union of all points).
///
/// Returns a zero rect at the origin for an empty set.
pub fn bounds_of(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| {
            acc.union_pt(*p)
        })
}

/// Normalize a vector, falling back to +X for zero-length input.
pub fn normalize(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len < DEGENERATE_EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        v / len
    }
}

/// Unit direction from `from` to `to` (+X when the points coincide).
pub fn direction(from: Point, to: Point) -> Vec2 {
    normalize(to - from)
}

/// Cubic ease-in-out curve on `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Evaluate a Bezier curve of arbitrary order with de Casteljau's algorithm.
///
/// `points` holds the start point, the control points and the end point.
/// `t` is clamped to `[0, 1]`.
pub fn bezier_point(points: &[Point], t: f64) -> Point {
    let t = t.clamp(0.0, 1.0);
    match points {
        [] => Point::ZERO,
        [only] => *only,
        _ => {
            let mut work = points.to_vec();
            let n = work.len();
            for level in 1..n {
                for i in 0..n - level {
                    work[i] = work[i].lerp(work[i + 1], t);
                }
            }
            work[0]
        }
    }
}

/// Derivative of a Bezier curve at `t` (unnormalized).
pub fn bezier_derivative(points: &[Point], t: f64) -> Vec2 {
    if points.len() < 2 {
        return Vec2::ZERO;
    }
    let degree = (points.len() - 1) as f64;
    let hodograph: Vec<Point> = points
        .windows(2)
        .map(|w| (w[1] - w[0]).to_point())
        .collect();
    bezier_point(&hodograph, t).to_vec2() * degree
}

/// Cubic Bezier evaluation (convenience wrapper).
pub fn cubic_bezier_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    bezier_point(&[p0, p1, p2, p3], t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_clamps_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        let proj = project_onto_segment(Point::new(150.0, 10.0), a, b);
        assert!((proj.t - 1.0).abs() < f64::EPSILON);
        assert_eq!(proj.point, b);

        let proj = project_onto_segment(Point::new(-20.0, 0.0), a, b);
        assert!(proj.t.abs() < f64::EPSILON);
        assert!((proj.distance - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_segment_uses_point_distance() {
        let a = Point::new(5.0, 5.0);
        let d = point_to_segment_dist(Point::new(8.0, 9.0), a, a);
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_bounds_of_points() {
        let pts = [
            Point::new(10.0, 40.0),
            Point::new(-5.0, 20.0),
            Point::new(30.0, -2.0),
        ];
        let b = bounds_of(&pts);
        assert_eq!(b, Rect::new(-5.0, -2.0, 30.0, 40.0));
        assert_eq!(bounds_of(&[]), Rect::ZERO);
    }

    #[test]
    fn test_polyline_length() {
        let pts = [Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(3.0, 14.0)];
        assert!((polyline_length(&pts) - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_bezier_endpoints_and_midpoint() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
        ];
        assert_eq!(bezier_point(&pts, 0.0), pts[0]);
        assert_eq!(bezier_point(&pts, 1.0), pts[3]);
        let mid = bezier_point(&pts, 0.5);
        assert!((mid.x - 50.0).abs() < 1e-10);
        assert!((mid.y - 75.0).abs() < 1e-10);
        // Out-of-range parameters clamp
        assert_eq!(bezier_point(&pts, 7.0), pts[3]);
    }

    #[test]
    fn test_bezier_derivative_of_line() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let d = bezier_derivative(&pts, 0.3);
        assert!((d.x - 10.0).abs() < 1e-10);
        assert!(d.y.abs() < 1e-10);
    }

    #[test]
    fn test_ease_in_out_cubic() {
        assert!(ease_in_out_cubic(0.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-10);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(Vec2::ZERO), Vec2::new(1.0, 0.0));
    }
}
