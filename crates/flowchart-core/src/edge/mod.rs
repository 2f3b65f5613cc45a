//! Edges: routed connections between node ports.

mod path;

pub use path::{EdgePath, SegmentHit};

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{bezier_derivative, bezier_point, distance, normalize};
use crate::ids::{EdgeId, NodeId, PortId, copy_id};
use crate::style::EdgeStyle;

/// Number of segments a Bezier edge is sampled into for its cached path.
pub const BEZIER_SAMPLES: usize = 32;

/// Minimum horizontal reach of derived Bezier control points.
pub const MIN_CONTROL_OFFSET: f64 = 50.0;

/// Routing family of an edge, with its per-kind editable geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeKind {
    Straight,
    Orthogonal {
        #[serde(default)]
        waypoints: Vec<Point>,
    },
    Bezier {
        #[serde(default, rename = "customControlPoints")]
        custom_control_points: Vec<Point>,
    },
}

impl EdgeKind {
    pub const TAGS: [&'static str; 3] = ["straight", "orthogonal", "bezier"];

    pub fn tag(&self) -> &'static str {
        match self {
            EdgeKind::Straight => "straight",
            EdgeKind::Orthogonal { .. } => "orthogonal",
            EdgeKind::Bezier { .. } => "bezier",
        }
    }

    /// Empty kind for a canonical tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "straight" => Some(EdgeKind::Straight),
            "orthogonal" => Some(EdgeKind::Orthogonal {
                waypoints: Vec::new(),
            }),
            "bezier" => Some(EdgeKind::Bezier {
                custom_control_points: Vec::new(),
            }),
            _ => None,
        }
    }
}

/// Marker drawn at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowKind {
    #[default]
    None,
    Arrow,
    FilledArrow,
    Circle,
    FilledCircle,
    Diamond,
    FilledDiamond,
}

impl ArrowKind {
    pub fn is_filled(self) -> bool {
        matches!(
            self,
            ArrowKind::FilledArrow | ArrowKind::FilledCircle | ArrowKind::FilledDiamond
        )
    }
}

/// Text attached to an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeLabel {
    pub text: String,
    /// Arc-length fraction along the path.
    pub position: f64,
    pub offset: Vec2,
    pub background: bool,
    pub padding: f64,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: 0.5,
            offset: Vec2::ZERO,
            background: true,
            padding: 4.0,
        }
    }
}

impl EdgeLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Which end of an edge an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEnd {
    Source,
    Target,
}

impl EdgeEnd {
    pub fn name(self) -> &'static str {
        match self {
            EdgeEnd::Source => "source",
            EdgeEnd::Target => "target",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            EdgeEnd::Source => EdgeEnd::Target,
            EdgeEnd::Target => EdgeEnd::Source,
        }
    }
}

/// A connection between two nodes.
///
/// The cached path is recomputed whenever endpoints or editable geometry
/// change, so it is never stale with respect to the stored endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
    pub source_port: Option<PortId>,
    pub target_port: Option<PortId>,
    pub style: EdgeStyle,
    pub labels: Vec<EdgeLabel>,
    pub start_arrow: ArrowKind,
    pub end_arrow: ArrowKind,
    pub selectable: bool,
    pub properties: serde_json::Map<String, serde_json::Value>,
    path: Option<EdgePath>,
    endpoints: Option<(Point, Point)>,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        kind: EdgeKind,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            target: target.into(),
            source_port: None,
            target_port: None,
            style: EdgeStyle::default(),
            labels: Vec::new(),
            start_arrow: ArrowKind::None,
            end_arrow: ArrowKind::Arrow,
            selectable: true,
            properties: serde_json::Map::new(),
            path: None,
            endpoints: None,
        }
    }

    pub fn with_ports(mut self, source_port: Option<PortId>, target_port: Option<PortId>) -> Self {
        self.source_port = source_port;
        self.target_port = target_port;
        self
    }

    pub fn path(&self) -> Option<&EdgePath> {
        self.path.as_ref()
    }

    pub fn endpoints(&self) -> Option<(Point, Point)> {
        self.endpoints
    }

    /// Route between the given endpoints and cache the result.
    pub fn calculate_path(&mut self, source: Point, target: Point) -> &EdgePath {
        self.endpoints = Some((source, target));
        self.path.insert(self.route(source, target))
    }

    /// Drop the cached path, e.g. when an endpoint node disappears.
    pub fn invalidate_path(&mut self) {
        self.path = None;
        self.endpoints = None;
    }

    fn recompute(&mut self) {
        if let Some((source, target)) = self.endpoints {
            self.path = Some(self.route(source, target));
        }
    }

    fn route(&self, source: Point, target: Point) -> EdgePath {
        match &self.kind {
            EdgeKind::Straight => EdgePath::from_points(vec![source, target]),
            EdgeKind::Orthogonal { waypoints } => {
                let mut points = Vec::with_capacity(waypoints.len() + 4);
                points.push(source);
                if waypoints.is_empty() {
                    points.extend(auto_elbow(source, target));
                } else {
                    points.extend(waypoints.iter().copied());
                }
                points.push(target);
                EdgePath::from_points(points)
            }
            EdgeKind::Bezier { .. } => {
                let curve = self.curve_points(source, target);
                let samples = (0..=BEZIER_SAMPLES)
                    .map(|i| bezier_point(&curve, i as f64 / BEZIER_SAMPLES as f64))
                    .collect();
                EdgePath::from_points(samples)
            }
        }
    }

    /// Start, control points and end of a Bezier edge.
    fn curve_points(&self, source: Point, target: Point) -> Vec<Point> {
        let mut curve = vec![source];
        curve.extend(self.effective_control_points(source, target));
        curve.push(target);
        curve
    }

    fn effective_control_points(&self, source: Point, target: Point) -> Vec<Point> {
        match &self.kind {
            EdgeKind::Bezier {
                custom_control_points,
            } if !custom_control_points.is_empty() => custom_control_points.clone(),
            EdgeKind::Bezier { .. } => derived_control_points(source, target),
            _ => Vec::new(),
        }
    }

    /// Point at arc-length fraction `t` (clamped), or the curve point for Bezier edges.
    pub fn point_at(&self, t: f64) -> Point {
        let Some(path) = &self.path else {
            return Point::ZERO;
        };
        match (&self.kind, self.endpoints) {
            (EdgeKind::Bezier { .. }, Some((s, e))) => bezier_point(&self.curve_points(s, e), t),
            _ => path.point_at(t),
        }
    }

    /// Unit tangent at `t` (clamped); `(1, 0)` without a cached path.
    pub fn tangent_at(&self, t: f64) -> Vec2 {
        let Some(path) = &self.path else {
            return Vec2::new(1.0, 0.0);
        };
        match (&self.kind, self.endpoints) {
            (EdgeKind::Bezier { .. }, Some((s, e))) => {
                let d = bezier_derivative(&self.curve_points(s, e), t);
                if d.hypot() > 0.0 {
                    normalize(d)
                } else {
                    path.tangent_at(t)
                }
            }
            _ => path.tangent_at(t),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.path
            .as_ref()
            .is_some_and(|p| p.hit_test(point, tolerance))
    }

    /// Closest point on the path; the query point itself without a cached path.
    pub fn closest_point(&self, point: Point) -> Point {
        self.path
            .as_ref()
            .and_then(|p| p.closest_point(point))
            .unwrap_or(point)
    }

    /// Nearest path segment within `tolerance`.
    pub fn closest_segment(&self, point: Point, tolerance: f64) -> Option<SegmentHit> {
        self.path
            .as_ref()
            .and_then(|p| p.closest_segment(point))
            .filter(|hit| hit.distance <= tolerance)
    }

    pub fn waypoints(&self) -> &[Point] {
        match &self.kind {
            EdgeKind::Orthogonal { waypoints } => waypoints,
            _ => &[],
        }
    }

    /// Control points in use: the custom ones, or those derived from the endpoints.
    pub fn control_points(&self) -> Vec<Point> {
        match (&self.kind, self.endpoints) {
            (EdgeKind::Bezier { .. }, Some((s, e))) => self.effective_control_points(s, e),
            (
                EdgeKind::Bezier {
                    custom_control_points,
                },
                None,
            ) => custom_control_points.clone(),
            _ => Vec::new(),
        }
    }

    pub fn has_custom_control_points(&self) -> bool {
        matches!(&self.kind, EdgeKind::Bezier { custom_control_points } if !custom_control_points.is_empty())
    }

    /// Replace the waypoints of an orthogonal edge. Returns `false` for other kinds.
    pub fn set_waypoints(&mut self, points: Vec<Point>) -> bool {
        let EdgeKind::Orthogonal { waypoints } = &mut self.kind else {
            return false;
        };
        *waypoints = points;
        self.recompute();
        true
    }

    /// Replace the control points of a Bezier edge. Returns `false` for other kinds.
    pub fn set_custom_control_points(&mut self, points: Vec<Point>) -> bool {
        let EdgeKind::Bezier {
            custom_control_points,
        } = &mut self.kind
        else {
            return false;
        };
        *custom_control_points = points;
        self.recompute();
        true
    }

    /// Revert a Bezier edge to derived control points.
    pub fn clear_custom_control_points(&mut self) -> bool {
        self.set_custom_control_points(Vec::new())
    }

    /// Index of the waypoint within `tolerance` of `point` (nearest wins).
    pub fn hit_test_waypoint(&self, point: Point, tolerance: f64) -> Option<usize> {
        nearest_within(self.waypoints(), point, tolerance)
    }

    /// Index of the control point within `tolerance` of `point` (nearest wins).
    pub fn hit_test_control_point(&self, point: Point, tolerance: f64) -> Option<usize> {
        nearest_within(&self.control_points(), point, tolerance)
    }

    /// Insert a waypoint after path segment `segment_index`.
    ///
    /// An automatic elbow is first turned into explicit waypoints so the
    /// route keeps its shape. Returns the waypoint index, or `None` for
    /// non-orthogonal edges.
    pub fn insert_waypoint(&mut self, segment_index: usize, point: Point) -> Option<usize> {
        let elbow = self.endpoints.map(|(s, t)| auto_elbow(s, t)).unwrap_or_default();
        let EdgeKind::Orthogonal { waypoints } = &mut self.kind else {
            return None;
        };
        if waypoints.is_empty() {
            *waypoints = elbow;
        }
        let index = segment_index.min(waypoints.len());
        waypoints.insert(index, point);
        self.recompute();
        Some(index)
    }

    /// Remove the waypoint at `index`.
    pub fn remove_waypoint(&mut self, index: usize) -> Option<Point> {
        let EdgeKind::Orthogonal { waypoints } = &mut self.kind else {
            return None;
        };
        if index >= waypoints.len() {
            return None;
        }
        let removed = waypoints.remove(index);
        self.recompute();
        Some(removed)
    }

    /// Move the waypoint at `index`.
    pub fn move_waypoint(&mut self, index: usize, point: Point) -> bool {
        let EdgeKind::Orthogonal { waypoints } = &mut self.kind else {
            return false;
        };
        let Some(slot) = waypoints.get_mut(index) else {
            return false;
        };
        *slot = point;
        self.recompute();
        true
    }

    /// Move the custom control point at `index`.
    pub fn move_control_point(&mut self, index: usize, point: Point) -> bool {
        let EdgeKind::Bezier {
            custom_control_points,
        } = &mut self.kind
        else {
            return false;
        };
        let Some(slot) = custom_control_points.get_mut(index) else {
            return false;
        };
        *slot = point;
        self.recompute();
        true
    }

    /// Deep copy under a fresh id.
    pub fn clone_edge(&self) -> Self {
        let mut copy = self.clone();
        copy.id = copy_id(&self.id);
        copy
    }
}

/// Elbow points for an orthogonal edge without waypoints.
fn auto_elbow(source: Point, target: Point) -> Vec<Point> {
    if (source.x - target.x).abs() < f64::EPSILON || (source.y - target.y).abs() < f64::EPSILON {
        return Vec::new();
    }
    let mid_x = (source.x + target.x) / 2.0;
    vec![Point::new(mid_x, source.y), Point::new(mid_x, target.y)]
}

/// Horizontal S-curve control points.
fn derived_control_points(source: Point, target: Point) -> Vec<Point> {
    let reach = ((target.x - source.x).abs() * 0.5).max(MIN_CONTROL_OFFSET);
    vec![
        Point::new(source.x + reach, source.y),
        Point::new(target.x - reach, target.y),
    ]
}

fn nearest_within(points: &[Point], point: Point, tolerance: f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance(*p, point)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn orthogonal(waypoints: Vec<Point>) -> Edge {
        Edge::new("e1", EdgeKind::Orthogonal { waypoints }, "a", "b")
    }

    fn bezier(points: Vec<Point>) -> Edge {
        Edge::new(
            "e2",
            EdgeKind::Bezier {
                custom_control_points: points,
            },
            "a",
            "b",
        )
    }

    #[test]
    fn test_straight_hit_test() {
        let mut edge = Edge::new("e", EdgeKind::Straight, "a", "b");
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(edge.hit_test(Point::new(50.0, 4.0), 5.0));
        assert!(!edge.hit_test(Point::new(50.0, 6.0), 5.0));
    }

    #[test]
    fn test_orthogonal_path_includes_waypoints_in_order() {
        let mut edge = orthogonal(vec![Point::new(200.0, 100.0)]);
        let path = edge.calculate_path(Point::new(220.0, 130.0), Point::new(300.0, 130.0));
        assert_eq!(
            path.points,
            vec![
                Point::new(220.0, 130.0),
                Point::new(200.0, 100.0),
                Point::new(300.0, 130.0)
            ]
        );
    }

    #[test]
    fn test_orthogonal_auto_elbow() {
        let mut edge = orthogonal(Vec::new());
        let path = edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(path.points.len(), 4);
        assert_eq!(path.points[1], Point::new(50.0, 0.0));
        assert_eq!(path.points[2], Point::new(50.0, 50.0));

        let path = edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert_eq!(path.points.len(), 2);
    }

    #[test]
    fn test_set_waypoints_recomputes_bounds() {
        let mut edge = orthogonal(vec![Point::new(50.0, 10.0)]);
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        edge.set_waypoints(vec![Point::new(50.0, -40.0), Point::new(150.0, 80.0)]);
        let path = edge.path().unwrap();
        assert_eq!(path.bounds, Rect::new(0.0, -40.0, 150.0, 80.0));
        assert_eq!(edge.waypoints().len(), 2);
    }

    #[test]
    fn test_set_waypoints_rejected_for_other_kinds() {
        let mut edge = Edge::new("e", EdgeKind::Straight, "a", "b");
        assert!(!edge.set_waypoints(vec![Point::ZERO]));
        assert!(!edge.set_custom_control_points(vec![Point::ZERO]));
    }

    #[test]
    fn test_bezier_point_at_uses_curve() {
        let mut edge = bezier(vec![Point::new(0.0, 100.0), Point::new(100.0, 100.0)]);
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let mid = edge.point_at(0.5);
        assert!((mid.x - 50.0).abs() < 1e-10);
        assert!((mid.y - 75.0).abs() < 1e-10);
        assert_eq!(edge.point_at(-1.0), Point::new(0.0, 0.0));
        assert_eq!(edge.path().unwrap().points.len(), BEZIER_SAMPLES + 1);
    }

    #[test]
    fn test_bezier_quadratic_with_one_control_point() {
        let mut edge = bezier(vec![Point::new(50.0, 100.0)]);
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let mid = edge.point_at(0.5);
        assert!((mid.x - 50.0).abs() < 1e-10);
        assert!((mid.y - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_bezier_bounds_cover_samples() {
        let mut edge = bezier(vec![Point::new(150.0, 150.0), Point::new(250.0, 50.0)]);
        edge.calculate_path(Point::new(100.0, 100.0), Point::new(300.0, 100.0));
        let bounds = edge.path().unwrap().bounds;
        for p in &edge.path().unwrap().points {
            assert!(p.x >= bounds.x0 && p.x <= bounds.x1);
            assert!(p.y >= bounds.y0 && p.y <= bounds.y1);
        }
    }

    #[test]
    fn test_derived_control_points() {
        let mut edge = bezier(Vec::new());
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(60.0, 40.0));
        assert!(!edge.has_custom_control_points());
        assert_eq!(
            edge.control_points(),
            vec![Point::new(50.0, 0.0), Point::new(10.0, 40.0)]
        );
    }

    #[test]
    fn test_uncached_defaults() {
        let edge = Edge::new("e", EdgeKind::Straight, "a", "b");
        assert_eq!(edge.point_at(0.5), Point::ZERO);
        assert_eq!(edge.tangent_at(0.5), Vec2::new(1.0, 0.0));
        assert!(!edge.hit_test(Point::ZERO, 100.0));
    }

    #[test]
    fn test_insert_and_remove_waypoint() {
        let mut edge = orthogonal(vec![Point::new(50.0, 0.0), Point::new(50.0, 100.0)]);
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let hit = edge.closest_segment(Point::new(52.0, 40.0), 8.0).unwrap();
        assert_eq!(hit.index, 1);
        let index = edge.insert_waypoint(hit.index, hit.point).unwrap();
        assert_eq!(index, 1);
        assert_eq!(edge.waypoints()[1], Point::new(50.0, 40.0));
        assert_eq!(edge.path().unwrap().points.len(), 5);

        assert_eq!(edge.remove_waypoint(1), Some(Point::new(50.0, 40.0)));
        assert_eq!(edge.remove_waypoint(9), None);
    }

    #[test]
    fn test_insert_on_auto_elbow_keeps_route() {
        let mut edge = orthogonal(Vec::new());
        edge.calculate_path(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let before = edge.path().unwrap().points.clone();
        assert_eq!(before.len(), 4);

        let hit = edge.closest_segment(Point::new(53.0, 40.0), 8.0).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(edge.insert_waypoint(hit.index, hit.point), Some(1));
        assert_eq!(
            edge.waypoints(),
            &[Point::new(50.0, 0.0), Point::new(50.0, 40.0), Point::new(50.0, 100.0)]
        );
        let after = &edge.path().unwrap().points;
        assert!(before.iter().all(|p| after.contains(p)));
        assert!(after.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y));
    }

    #[test]
    fn test_hit_test_handles() {
        let mut edge = orthogonal(vec![Point::new(200.0, 100.0)]);
        edge.calculate_path(Point::new(220.0, 130.0), Point::new(300.0, 130.0));
        assert_eq!(edge.hit_test_waypoint(Point::new(203.0, 102.0), 8.0), Some(0));
        assert_eq!(edge.hit_test_waypoint(Point::new(230.0, 100.0), 8.0), None);

        let mut curve = bezier(vec![Point::new(150.0, 150.0)]);
        curve.calculate_path(Point::ZERO, Point::new(300.0, 0.0));
        assert_eq!(curve.hit_test_control_point(Point::new(152.0, 149.0), 8.0), Some(0));
    }

    #[test]
    fn test_clone_edge_id() {
        let edge = orthogonal(Vec::new());
        let copy = edge.clone_edge();
        assert!(copy.id.starts_with("e1_copy_"));
        assert_eq!(copy.source, "a");
    }

    #[test]
    fn test_kind_serde() {
        let kind = EdgeKind::Orthogonal {
            waypoints: vec![Point::new(1.0, 2.0)],
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "orthogonal");
        let back: EdgeKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }
}
