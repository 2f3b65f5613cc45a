//! Selection state, edge handles and hit testing.

use std::collections::HashSet;

use kurbo::{Point, Rect};

use crate::diagram::Diagram;
use crate::edge::{Edge, EdgeKind, SegmentHit};
use crate::ids::{EdgeId, NodeId, PortId};
use crate::node::Node;

/// Type of edge handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Waypoint of an orthogonal edge.
    Waypoint(usize),
    /// Control point of a Bezier edge.
    ControlPoint(usize),
}

/// An edge handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    /// Handle type.
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Editable handles of an edge.
pub fn edge_handles(edge: &Edge) -> Vec<Handle> {
    match &edge.kind {
        EdgeKind::Orthogonal { waypoints } => waypoints
            .iter()
            .enumerate()
            .map(|(i, p)| Handle::new(*p, HandleKind::Waypoint(i)))
            .collect(),
        EdgeKind::Bezier { .. } => edge
            .control_points()
            .into_iter()
            .enumerate()
            .map(|(i, p)| Handle::new(p, HandleKind::ControlPoint(i)))
            .collect(),
        EdgeKind::Straight => Vec::new(),
    }
}

/// How a selection request combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Replace,
    Add,
    Toggle,
}

/// A selectable element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionItem {
    Node(NodeId),
    Edge(EdgeId),
}

/// Hit tolerances in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerances {
    /// Node bodies and edge paths.
    pub hit: f64,
    /// Waypoint and control-point handles.
    pub handle: f64,
    /// Ports.
    pub port: f64,
}

impl Default for HitTolerances {
    fn default() -> Self {
        Self {
            hit: 5.0,
            handle: 8.0,
            port: 10.0,
        }
    }
}

impl HitTolerances {
    /// Screen-pixel tolerances converted to world units at `scale`.
    pub fn scaled(self, scale: f64) -> Self {
        let s = if scale > 0.0 { scale } else { 1.0 };
        Self {
            hit: self.hit / s,
            handle: self.handle / s,
            port: self.port / s,
        }
    }
}

/// Result of a hit test, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Port {
        node_id: NodeId,
        port_id: PortId,
        position: Point,
    },
    Waypoint {
        edge_id: EdgeId,
        index: usize,
        position: Point,
    },
    ControlPoint {
        edge_id: EdgeId,
        index: usize,
        position: Point,
    },
    EdgePath {
        edge_id: EdgeId,
        segment: Option<SegmentHit>,
    },
    Node {
        node_id: NodeId,
    },
    Empty,
}

/// Nearest connectable port found by [`SelectionManager::find_nearest_port`].
#[derive(Debug, Clone, PartialEq)]
pub struct PortMatch {
    pub node_id: NodeId,
    pub port_id: PortId,
    pub position: Point,
    pub distance: f64,
}

/// Tracks which nodes and edges are selectable and selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    /// Selectable node universe; `None` means every node.
    selectable_nodes: Option<HashSet<NodeId>>,
    /// Selectable edge universe; `None` means every edge.
    selectable_edges: Option<HashSet<EdgeId>>,
    selected_nodes: Vec<NodeId>,
    selected_edges: Vec<EdgeId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selectable node set, pruning selected nodes outside it.
    pub fn set_selectable_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let set: HashSet<NodeId> = ids.into_iter().collect();
        self.selected_nodes.retain(|id| set.contains(id));
        self.selectable_nodes = Some(set);
    }

    /// Replace the selectable edge set, pruning selected edges outside it.
    pub fn set_selectable_edges(&mut self, ids: impl IntoIterator<Item = EdgeId>) {
        let set: HashSet<EdgeId> = ids.into_iter().collect();
        self.selected_edges.retain(|id| set.contains(id));
        self.selectable_edges = Some(set);
    }

    /// Make every node and edge selectable again.
    pub fn reset_selectable(&mut self) {
        self.selectable_nodes = None;
        self.selectable_edges = None;
    }

    fn in_node_universe(&self, id: &str) -> bool {
        self.selectable_nodes
            .as_ref()
            .is_none_or(|set| set.contains(id))
    }

    fn in_edge_universe(&self, id: &str) -> bool {
        self.selectable_edges
            .as_ref()
            .is_none_or(|set| set.contains(id))
    }

    pub fn is_node_selectable(&self, diagram: &Diagram, id: &str) -> bool {
        self.in_node_universe(id) && diagram.node(id).is_some_and(|n| n.selectable)
    }

    /// An edge is interactable when it is selectable and both endpoint
    /// nodes exist and are in the selectable node set.
    pub fn is_edge_interactable(&self, diagram: &Diagram, edge: &Edge) -> bool {
        edge.selectable
            && self.in_edge_universe(&edge.id)
            && !diagram.is_dangling(edge)
            && self.in_node_universe(&edge.source)
            && self.in_node_universe(&edge.target)
    }

    /// Selectable nodes, topmost first.
    pub fn selectable_nodes<'a>(&'a self, diagram: &'a Diagram) -> impl Iterator<Item = &'a Node> {
        diagram
            .nodes_ordered()
            .rev()
            .filter(move |n| n.selectable && self.in_node_universe(&n.id))
    }

    /// Interactable edges, topmost first.
    pub fn selectable_edges<'a>(&'a self, diagram: &'a Diagram) -> impl Iterator<Item = &'a Edge> {
        diagram
            .edges_ordered()
            .rev()
            .filter(move |e| self.is_edge_interactable(diagram, e))
    }

    /// Hit test with priority ports > edge handles > edge paths > node bodies.
    pub fn hit_test(&self, diagram: &Diagram, point: Point, tol: HitTolerances) -> Hit {
        for node in self.selectable_nodes(diagram) {
            if let Some(port) = node.hit_test_port(point, tol.port) {
                return Hit::Port {
                    node_id: node.id.clone(),
                    port_id: port.id.clone(),
                    position: port.position(node.bounds()),
                };
            }
        }

        for edge in self.selectable_edges(diagram) {
            for handle in edge_handles(edge) {
                if !handle.hit_test(point, tol.handle) {
                    continue;
                }
                return match handle.kind {
                    HandleKind::Waypoint(index) => Hit::Waypoint {
                        edge_id: edge.id.clone(),
                        index,
                        position: handle.position,
                    },
                    HandleKind::ControlPoint(index) => Hit::ControlPoint {
                        edge_id: edge.id.clone(),
                        index,
                        position: handle.position,
                    },
                };
            }
        }

        for edge in self.selectable_edges(diagram) {
            if edge.hit_test(point, tol.hit) {
                return Hit::EdgePath {
                    edge_id: edge.id.clone(),
                    segment: edge.closest_segment(point, tol.hit),
                };
            }
        }

        for node in self.selectable_nodes(diagram) {
            if node.hit_test(point, tol.hit) {
                return Hit::Node {
                    node_id: node.id.clone(),
                };
            }
        }

        Hit::Empty
    }

    /// Closest connectable port with free capacity within `tolerance`.
    pub fn find_nearest_port(
        &self,
        diagram: &Diagram,
        point: Point,
        tolerance: f64,
        exclude_node: Option<&str>,
    ) -> Option<PortMatch> {
        self.selectable_nodes(diagram)
            .filter(|n| Some(n.id.as_str()) != exclude_node)
            .flat_map(|node| {
                let bounds = node.bounds();
                node.ports
                    .iter()
                    .filter(|p| p.connectable && p.has_capacity())
                    .map(move |p| {
                        let position = p.position(bounds);
                        PortMatch {
                            node_id: node.id.clone(),
                            port_id: p.id.clone(),
                            position,
                            distance: (position - point).hypot(),
                        }
                    })
            })
            .filter(|m| m.distance <= tolerance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Apply `items` to the selection according to `mode`.
    pub fn select(&mut self, items: impl IntoIterator<Item = SelectionItem>, mode: SelectionMode) {
        if mode == SelectionMode::Replace {
            self.clear();
        }
        for item in items {
            match item {
                SelectionItem::Node(id) => {
                    if self.in_node_universe(&id) {
                        apply(&mut self.selected_nodes, id, mode);
                    }
                }
                SelectionItem::Edge(id) => {
                    if self.in_edge_universe(&id) {
                        apply(&mut self.selected_edges, id, mode);
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
    }

    /// Select every selectable node and interactable edge.
    pub fn select_all(&mut self, diagram: &Diagram) {
        let nodes: Vec<NodeId> = self
            .selectable_nodes(diagram)
            .map(|n| n.id.clone())
            .collect();
        let edges: Vec<EdgeId> = self
            .selectable_edges(diagram)
            .map(|e| e.id.clone())
            .collect();
        self.selected_nodes = nodes.into_iter().rev().collect();
        self.selected_edges = edges.into_iter().rev().collect();
    }

    /// Select nodes and edges intersecting `rect`.
    pub fn select_in_rect(&mut self, diagram: &Diagram, rect: Rect, mode: SelectionMode) {
        let nodes = diagram
            .nodes_in_rect(rect)
            .into_iter()
            .filter(|id| self.is_node_selectable(diagram, id))
            .map(SelectionItem::Node);
        let edges = diagram
            .edges_in_rect(rect)
            .into_iter()
            .filter(|id| {
                diagram
                    .edge(id)
                    .is_some_and(|e| self.is_edge_interactable(diagram, e))
            })
            .map(SelectionItem::Edge);
        let items: Vec<SelectionItem> = nodes.chain(edges).collect();
        self.select(items, mode);
    }

    /// Drop selected ids that no longer exist in the diagram.
    pub fn prune(&mut self, diagram: &Diagram) {
        self.selected_nodes.retain(|id| diagram.node(id).is_some());
        self.selected_edges.retain(|id| diagram.edge(id).is_some());
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.selected_nodes
    }

    pub fn selected_edges(&self) -> &[EdgeId] {
        &self.selected_edges
    }

    pub fn is_node_selected(&self, id: &str) -> bool {
        self.selected_nodes.iter().any(|n| n == id)
    }

    pub fn is_edge_selected(&self, id: &str) -> bool {
        self.selected_edges.iter().any(|e| e == id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_nodes.is_empty() && self.selected_edges.is_empty()
    }

    /// `(selected nodes, selected edges)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.selected_nodes.len(), self.selected_edges.len())
    }
}

fn apply(list: &mut Vec<String>, id: String, mode: SelectionMode) {
    let existing = list.iter().position(|x| *x == id);
    match (mode, existing) {
        (SelectionMode::Toggle, Some(pos)) => {
            list.remove(pos);
        }
        (_, None) => list.push(id),
        (_, Some(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn scenario() -> Diagram {
        let mut diagram = Diagram::new();
        diagram
            .add_node(Node::new("a", NodeKind::Process, Point::new(100.0, 100.0)))
            .unwrap();
        diagram
            .add_node(Node::new("b", NodeKind::Process, Point::new(300.0, 100.0)))
            .unwrap();
        diagram
            .add_edge(Edge::new(
                "e1",
                EdgeKind::Orthogonal {
                    waypoints: vec![Point::new(200.0, 100.0)],
                },
                "a",
                "b",
            ))
            .unwrap();
        diagram
    }

    #[test]
    fn test_handle_hit_test() {
        let handle = Handle::new(Point::new(10.0, 10.0), HandleKind::Waypoint(0));
        assert!(handle.hit_test(Point::new(13.0, 14.0), 5.0));
        assert!(!handle.hit_test(Point::new(14.0, 14.0), 5.0));
    }

    #[test]
    fn test_hit_priority_port_over_node() {
        let diagram = scenario();
        let sel = SelectionManager::new();
        let hit = sel.hit_test(&diagram, Point::new(221.0, 130.0), HitTolerances::default());
        assert!(matches!(hit, Hit::Port { ref port_id, .. } if port_id == "out"));
        let hit = sel.hit_test(&diagram, Point::new(150.0, 140.0), HitTolerances::default());
        assert_eq!(hit, Hit::Node { node_id: "a".into() });
    }

    #[test]
    fn test_hit_waypoint_and_path() {
        let diagram = scenario();
        let sel = SelectionManager::new();
        let hit = sel.hit_test(&diagram, Point::new(202.0, 101.0), HitTolerances::default());
        assert!(matches!(hit, Hit::Waypoint { index: 0, .. }));
        // Midway along the (200,100) -> (300,130) segment
        let hit = sel.hit_test(&diagram, Point::new(250.0, 115.0), HitTolerances::default());
        assert!(matches!(hit, Hit::EdgePath { ref edge_id, .. } if edge_id == "e1"));
        let hit = sel.hit_test(&diagram, Point::new(600.0, 600.0), HitTolerances::default());
        assert_eq!(hit, Hit::Empty);
    }

    #[test]
    fn test_edges_to_unselectable_nodes_are_ignored() {
        let diagram = scenario();
        let mut sel = SelectionManager::new();
        sel.set_selectable_nodes(vec!["a".to_string()]);
        // The waypoint sits on node a's top border; with the edge out of
        // play the node body wins.
        let hit = sel.hit_test(&diagram, Point::new(202.0, 101.0), HitTolerances::default());
        assert_eq!(hit, Hit::Node { node_id: "a".into() });
        let hit = sel.hit_test(&diagram, Point::new(250.0, 115.0), HitTolerances::default());
        assert_eq!(hit, Hit::Empty);
    }

    #[test]
    fn test_dangling_edge_not_interactable() {
        let mut diagram = scenario();
        diagram.remove_node("b");
        let sel = SelectionManager::new();
        let edge = diagram.edge("e1").unwrap();
        assert!(!sel.is_edge_interactable(&diagram, edge));
    }

    #[test]
    fn test_select_modes() {
        let mut sel = SelectionManager::new();
        sel.select([SelectionItem::Node("a".into())], SelectionMode::Replace);
        sel.select([SelectionItem::Node("b".into())], SelectionMode::Add);
        assert_eq!(sel.counts(), (2, 0));
        sel.select([SelectionItem::Node("a".into())], SelectionMode::Toggle);
        assert_eq!(sel.selected_nodes(), &["b".to_string()]);
        sel.select([SelectionItem::Edge("e1".into())], SelectionMode::Replace);
        assert_eq!(sel.counts(), (0, 1));
    }

    #[test]
    fn test_set_selectable_prunes() {
        let mut sel = SelectionManager::new();
        sel.select(
            [SelectionItem::Node("a".into()), SelectionItem::Node("b".into())],
            SelectionMode::Replace,
        );
        sel.set_selectable_nodes(vec!["b".to_string()]);
        assert_eq!(sel.selected_nodes(), &["b".to_string()]);
        sel.select([SelectionItem::Node("a".into())], SelectionMode::Add);
        assert!(!sel.is_node_selected("a"));
    }

    #[test]
    fn test_select_in_rect_and_all() {
        let diagram = scenario();
        let mut sel = SelectionManager::new();
        sel.select_in_rect(&diagram, Rect::new(90.0, 90.0, 230.0, 170.0), SelectionMode::Replace);
        assert!(sel.is_node_selected("a"));
        assert!(sel.is_edge_selected("e1"));
        assert!(!sel.is_node_selected("b"));
        sel.select_all(&diagram);
        assert_eq!(sel.counts(), (2, 1));
        assert_eq!(sel.selected_nodes()[0], "a");
    }

    #[test]
    fn test_find_nearest_port() {
        let mut diagram = scenario();
        let sel = SelectionManager::new();
        let m = sel
            .find_nearest_port(&diagram, Point::new(305.0, 131.0), 10.0, Some("a"))
            .unwrap();
        assert_eq!((m.node_id.as_str(), m.port_id.as_str()), ("b", "in"));
        assert!(sel
            .find_nearest_port(&diagram, Point::new(305.0, 131.0), 10.0, Some("b"))
            .is_none());

        if let Some(port) = diagram.node_mut("b").and_then(|n| n.port_mut("in")) {
            port.max_connections = 1;
        }
        assert!(sel
            .find_nearest_port(&diagram, Point::new(305.0, 131.0), 10.0, None)
            .is_none());
    }
}
