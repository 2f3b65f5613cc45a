//! Cached polyline geometry of an edge.

use kurbo::{BezPath, Point, Rect, Vec2};

use crate::geometry::{
    bounds_of, direction, point_to_segment_dist, polyline_length, project_onto_segment,
};

/// Nearest segment of a path to some query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Index of the segment start in the path's point list.
    pub index: usize,
    /// Closest point on that segment.
    pub point: Point,
    /// Parameter along the segment, `0..=1`.
    pub t: f64,
    pub distance: f64,
}

/// Points, total length and bounds of a routed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub points: Vec<Point>,
    pub length: f64,
    pub bounds: Rect,
}

impl EdgePath {
    pub fn from_points(points: Vec<Point>) -> Self {
        let length = polyline_length(&points);
        let bounds = bounds_of(&points);
        Self {
            points,
            length,
            bounds,
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Point at arc-length fraction `t` (clamped).
    pub fn point_at(&self, t: f64) -> Point {
        let Some(first) = self.start() else {
            return Point::ZERO;
        };
        let t = t.clamp(0.0, 1.0);
        if self.length <= 0.0 {
            return first;
        }
        let target = self.length * t;
        let mut walked = 0.0;
        for w in self.points.windows(2) {
            let seg = (w[1] - w[0]).hypot();
            if seg > 0.0 && walked + seg >= target {
                return w[0].lerp(w[1], (target - walked) / seg);
            }
            walked += seg;
        }
        self.end().unwrap_or(first)
    }

    /// Unit direction of the segment at arc-length fraction `t`.
    pub fn tangent_at(&self, t: f64) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let target = self.length * t;
        let mut walked = 0.0;
        let mut last = None;
        for w in self.points.windows(2) {
            let seg = (w[1] - w[0]).hypot();
            if seg <= 0.0 {
                continue;
            }
            last = Some((w[0], w[1]));
            if walked + seg >= target {
                return direction(w[0], w[1]);
            }
            walked += seg;
        }
        match last {
            Some((a, b)) => direction(a, b),
            None => Vec2::new(1.0, 0.0),
        }
    }

    /// Whether `point` lies within `tolerance` of any segment.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        self.points
            .windows(2)
            .any(|w| point_to_segment_dist(point, w[0], w[1]) <= tolerance)
    }

    /// Segment nearest to `point`.
    pub fn closest_segment(&self, point: Point) -> Option<SegmentHit> {
        self.points
            .windows(2)
            .enumerate()
            .map(|(index, w)| {
                let proj = project_onto_segment(point, w[0], w[1]);
                SegmentHit {
                    index,
                    point: proj.point,
                    t: proj.t,
                    distance: proj.distance,
                }
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Closest point on the path, or `None` for an empty path.
    pub fn closest_point(&self, point: Point) -> Option<Point> {
        match self.points.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => self.closest_segment(point).map(|hit| hit.point),
        }
    }

    /// Polyline as a kurbo path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
            for p in iter {
                path.line_to(*p);
            }
        }
        path
    }
}
