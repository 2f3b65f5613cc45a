//! Nodes: typed boxes with connection ports.

mod kind;
mod port;

pub use kind::{NodeKind, Silhouette};
pub use port::{Port, PortDirection, PortSide, UNLIMITED_CONNECTIONS};

use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, copy_id};
use crate::style::NodeStyle;
use crate::text::{TextMeasure, wrap_text};

/// Default node size.
pub const DEFAULT_NODE_SIZE: Size = Size::new(120.0, 60.0);

/// Horizontal label padding inside a node.
pub const LABEL_PADDING: f64 = 8.0;

const OUTLINE_TOLERANCE: f64 = 0.1;

/// A diagram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner in world coordinates.
    pub position: Point,
    pub size: Size,
    pub style: NodeStyle,
    pub label: String,
    pub ports: Vec<Port>,
    pub draggable: bool,
    pub selectable: bool,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Create a node with the catalog defaults for `kind`.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Point) -> Self {
        let mut node = Self {
            id: id.into(),
            kind,
            position,
            size: DEFAULT_NODE_SIZE,
            style: kind.default_style(),
            label: kind.default_label().to_string(),
            ports: Vec::new(),
            draggable: true,
            selectable: true,
            properties: serde_json::Map::new(),
        };
        node.initialize_ports();
        node
    }

    /// Replace the ports with the default layout for this kind.
    pub fn initialize_ports(&mut self) {
        self.ports = self.kind.default_ports();
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn port(&self, port_id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == port_id)
    }

    pub fn port_mut(&mut self, port_id: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == port_id)
    }

    /// World position of a port anchor.
    pub fn port_position(&self, port_id: &str) -> Option<Point> {
        self.port(port_id).map(|p| p.position(self.bounds()))
    }

    /// Silhouette outline in world coordinates.
    pub fn outline(&self) -> BezPath {
        let rect = self.bounds();
        match self.kind.silhouette() {
            Silhouette::Stadium => {
                let radius = rect.width().min(rect.height()) / 2.0;
                RoundedRect::from_rect(rect, radius).to_path(OUTLINE_TOLERANCE)
            }
            Silhouette::RoundedRect(radius) => {
                RoundedRect::from_rect(rect, radius).to_path(OUTLINE_TOLERANCE)
            }
            Silhouette::Diamond => {
                let c = rect.center();
                let mut path = BezPath::new();
                path.move_to(Point::new(c.x, rect.y0));
                path.line_to(Point::new(rect.x1, c.y));
                path.line_to(Point::new(c.x, rect.y1));
                path.line_to(Point::new(rect.x0, c.y));
                path.close_path();
                path
            }
            Silhouette::Ellipse => Ellipse::from_rect(rect).to_path(OUTLINE_TOLERANCE),
        }
    }

    /// Silhouette-aware containment test, grown by `tolerance`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.bounds();
        let c = rect.center();
        let dx = (point.x - c.x).abs();
        let dy = (point.y - c.y).abs();
        let rx = rect.width() / 2.0 + tolerance;
        let ry = rect.height() / 2.0 + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        match self.kind.silhouette() {
            Silhouette::Diamond => dx / rx + dy / ry <= 1.0,
            Silhouette::Ellipse => (dx / rx).powi(2) + (dy / ry).powi(2) <= 1.0,
            Silhouette::Stadium | Silhouette::RoundedRect(_) => dx <= rx && dy <= ry,
        }
    }

    /// Nearest port within `tolerance` of `point`.
    pub fn hit_test_port(&self, point: Point, tolerance: f64) -> Option<&Port> {
        let bounds = self.bounds();
        self.ports
            .iter()
            .map(|p| (p, (p.position(bounds) - point).hypot()))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Label wrapped to the node's inner width.
    pub fn label_lines(&self, measure: &dyn TextMeasure) -> Vec<String> {
        let max_width = (self.size.width - LABEL_PADDING * 2.0).max(1.0);
        wrap_text(&self.label, max_width, self.style.font_size, measure)
    }

    /// Deep copy under a fresh id with connection counters reset.
    pub fn clone_node(&self) -> Self {
        let mut copy = self.clone();
        copy.id = copy_id(&self.id);
        for port in &mut copy.ports {
            port.current_connections = 0;
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproxTextMeasure;

    fn process_at(x: f64, y: f64) -> Node {
        Node::new("n1", NodeKind::Process, Point::new(x, y))
    }

    #[test]
    fn test_port_positions() {
        let node = process_at(100.0, 100.0);
        assert_eq!(node.port_position("in"), Some(Point::new(100.0, 130.0)));
        assert_eq!(node.port_position("out"), Some(Point::new(220.0, 130.0)));
        assert_eq!(node.port_position("missing"), None);
    }

    #[test]
    fn test_rect_hit_test_with_tolerance() {
        let node = process_at(0.0, 0.0);
        assert!(node.hit_test(Point::new(60.0, 30.0), 0.0));
        assert!(node.hit_test(Point::new(120.0, 60.0), 0.0));
        assert!(node.hit_test(Point::new(123.0, 30.0), 5.0));
        assert!(!node.hit_test(Point::new(130.0, 30.0), 5.0));
    }

    #[test]
    fn test_diamond_hit_test_excludes_corners() {
        let node = Node::new("g", NodeKind::ExclusiveGateway, Point::ZERO);
        assert!(node.hit_test(Point::new(60.0, 30.0), 0.0));
        assert!(!node.hit_test(Point::new(5.0, 5.0), 0.0));
        assert!(node.hit_test(Point::new(119.0, 30.0), 0.0));
    }

    #[test]
    fn test_ellipse_hit_test() {
        let node = Node::new("e", NodeKind::TimerEvent, Point::ZERO);
        assert!(node.hit_test(Point::new(60.0, 5.0), 0.0));
        assert!(!node.hit_test(Point::new(2.0, 2.0), 0.0));
    }

    #[test]
    fn test_hit_test_port_picks_nearest() {
        let node = process_at(100.0, 100.0);
        let port = node.hit_test_port(Point::new(223.0, 131.0), 10.0);
        assert_eq!(port.map(|p| p.id.as_str()), Some("out"));
        assert!(node.hit_test_port(Point::new(160.0, 130.0), 10.0).is_none());
    }

    #[test]
    fn test_translate_moves_ports() {
        let mut node = process_at(0.0, 0.0);
        node.translate(Vec2::new(10.0, 20.0));
        assert_eq!(node.position, Point::new(10.0, 20.0));
        assert_eq!(node.port_position("in"), Some(Point::new(10.0, 50.0)));
    }

    #[test]
    fn test_clone_node_resets_connections() {
        let mut node = process_at(0.0, 0.0);
        node.ports[0].current_connections = 3;
        let copy = node.clone_node();
        assert!(copy.id.starts_with("n1_copy_"));
        assert_eq!(copy.ports[0].current_connections, 0);
        assert_eq!(copy.position, node.position);
    }

    #[test]
    fn test_label_lines_wrap() {
        let mut node = process_at(0.0, 0.0);
        node.label = "Review the purchase order request".to_string();
        let lines = node.label_lines(&ApproxTextMeasure::default());
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), node.label);
    }

    #[test]
    fn test_outline_bounds() {
        let node = Node::new("g", NodeKind::Condition, Point::new(10.0, 10.0));
        let bb = node.outline().bounding_box();
        assert!((bb.x0 - 10.0).abs() < 1e-9);
        assert!((bb.x1 - 130.0).abs() < 1e-9);
    }
}
