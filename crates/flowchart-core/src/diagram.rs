//! Diagram arena holding nodes and edges.
//!
//! Edges refer to nodes by id only. Removing a node never removes its
//! edges; they become dangling and are skipped by hit testing and
//! rendering until the node returns or the edge is removed.

use std::collections::HashMap;

use kurbo::{Point, Rect};

use crate::edge::{Edge, EdgeEnd};
use crate::error::{FlowchartError, Result};
use crate::geometry::bounds_of;
use crate::ids::{EdgeId, NodeId};
use crate::node::Node;

/// All nodes and edges of one diagram.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: HashMap<NodeId, Node>,
    /// Node z-order (back to front).
    z_order: Vec<NodeId>,
    edges: HashMap<EdgeId, Edge>,
    edge_order: Vec<EdgeId>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Add a node on top of the z-order.
    pub fn add_node(&mut self, mut node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(FlowchartError::DuplicateNodeId(node.id));
        }
        let id = node.id.clone();
        for port in &mut node.ports {
            port.current_connections = 0;
        }
        self.z_order.push(id.clone());
        self.nodes.insert(id.clone(), node);
        self.reattach_edges(&id);
        self.refresh_paths_for_node(&id);
        Ok(())
    }

    /// Count edges left dangling by an earlier removal against the ports of
    /// the node that now fills their endpoint.
    fn reattach_edges(&mut self, node_id: &str) {
        let ends: Vec<(String, Option<String>)> = self
            .edge_order
            .iter()
            .filter_map(|id| self.edges.get(id))
            .flat_map(|edge| {
                [
                    (edge.source == node_id).then(|| (edge.id.clone(), edge.source_port.clone())),
                    (edge.target == node_id).then(|| (edge.id.clone(), edge.target_port.clone())),
                ]
            })
            .flatten()
            .collect();
        for (edge_id, port_id) in ends {
            if self.connect_port(node_id, port_id.as_deref()).is_err() {
                log::warn!("Edge {edge_id} reattached to {node_id} over port capacity");
            }
        }
    }

    /// Add an edge, attaching it to its ports and routing it.
    ///
    /// When a port is not named, the first port with free capacity in the
    /// right direction is used. Either both ports accept the connection or
    /// neither counter changes.
    pub fn add_edge(&mut self, mut edge: Edge) -> Result<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(FlowchartError::DuplicateEdgeId(edge.id));
        }
        for node_id in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(node_id) {
                return Err(FlowchartError::NodeNotFound(node_id.clone()));
            }
        }
        edge.source_port = self.pick_port(&edge.source, edge.source_port.take(), true)?;
        edge.target_port = self.pick_port(&edge.target, edge.target_port.take(), false)?;

        self.connect_port(&edge.source, edge.source_port.as_deref())?;
        if let Err(err) = self.connect_port(&edge.target, edge.target_port.as_deref()) {
            self.disconnect_port(&edge.source, edge.source_port.as_deref());
            return Err(err);
        }

        if let Some((s, t)) = self.resolve_endpoints(&edge) {
            edge.calculate_path(s, t);
        }
        log::debug!("Added edge {} ({} -> {})", edge.id, edge.source, edge.target);
        self.edge_order.push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    fn pick_port(
        &self,
        node_id: &str,
        requested: Option<String>,
        outgoing: bool,
    ) -> Result<Option<String>> {
        let Some(node) = self.nodes.get(node_id) else {
            return Err(FlowchartError::NodeNotFound(node_id.to_string()));
        };
        if let Some(port_id) = requested {
            if node.port(&port_id).is_none() {
                return Err(FlowchartError::PortNotFound {
                    node: node_id.to_string(),
                    port: port_id,
                });
            }
            return Ok(Some(port_id));
        }
        let accepts = |p: &&crate::node::Port| {
            if outgoing {
                p.direction.accepts_outgoing()
            } else {
                p.direction.accepts_incoming()
            }
        };
        Ok(node
            .ports
            .iter()
            .filter(accepts)
            .find(|p| p.connectable && p.has_capacity())
            .map(|p| p.id.clone()))
    }

    fn connect_port(&mut self, node_id: &str, port_id: Option<&str>) -> Result<()> {
        let Some(port_id) = port_id else {
            return Ok(());
        };
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| FlowchartError::NodeNotFound(node_id.to_string()))?;
        let port = node.port_mut(port_id).ok_or_else(|| FlowchartError::PortNotFound {
            node: node_id.to_string(),
            port: port_id.to_string(),
        })?;
        port.try_connect(node_id).inspect_err(|err| {
            log::warn!("Rejected connection: {err}");
        })
    }

    fn disconnect_port(&mut self, node_id: &str, port_id: Option<&str>) {
        if let Some(port) = port_id.and_then(|p| self.nodes.get_mut(node_id)?.port_mut(p)) {
            port.disconnect();
        }
    }

    /// Remove a node. Connected edges stay, dangling.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.z_order.retain(|n| n != id);
        for edge in self.edges.values_mut() {
            if edge.source == id || edge.target == id {
                edge.invalidate_path();
            }
        }
        log::debug!("Removed node {id}");
        Some(node)
    }

    /// Remove an edge, releasing its ports.
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        self.edge_order.retain(|e| e != id);
        self.disconnect_port(&edge.source, edge.source_port.as_deref());
        self.disconnect_port(&edge.target, edge.target_port.as_deref());
        log::debug!("Removed edge {id}");
        Some(edge)
    }

    /// Move one end of an edge to another node and port.
    ///
    /// `port_id` of `None` picks the first free port facing the right way.
    /// On failure the edge and every port counter are left as they were.
    pub fn reconnect_edge(
        &mut self,
        edge_id: &str,
        end: EdgeEnd,
        node_id: &str,
        port_id: Option<&str>,
    ) -> Result<()> {
        let Some(edge) = self.edges.get(edge_id) else {
            return Err(FlowchartError::EdgeNotFound(edge_id.to_string()));
        };
        let (old_node, old_port) = match end {
            EdgeEnd::Source => (edge.source.clone(), edge.source_port.clone()),
            EdgeEnd::Target => (edge.target.clone(), edge.target_port.clone()),
        };
        let new_port = self.pick_port(
            node_id,
            port_id.map(str::to_string),
            end == EdgeEnd::Source,
        )?;

        self.disconnect_port(&old_node, old_port.as_deref());
        if let Err(err) = self.connect_port(node_id, new_port.as_deref()) {
            if self.connect_port(&old_node, old_port.as_deref()).is_err() {
                log::warn!("Could not restore {old_node} on edge {edge_id}");
            }
            return Err(err);
        }

        let Some(edge) = self.edges.get_mut(edge_id) else {
            return Err(FlowchartError::EdgeNotFound(edge_id.to_string()));
        };
        match end {
            EdgeEnd::Source => {
                edge.source = node_id.to_string();
                edge.source_port = new_port;
            }
            EdgeEnd::Target => {
                edge.target = node_id.to_string();
                edge.target_port = new_port;
            }
        }
        log::debug!("Reconnected {} of edge {edge_id} to {node_id}", end.name());
        self.refresh_edge_path(edge_id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.z_order.clear();
        self.edges.clear();
        self.edge_order.clear();
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes back to front.
    pub fn nodes_ordered(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Edges in insertion order.
    pub fn edges_ordered(&self) -> impl DoubleEndedIterator<Item = &Edge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.z_order.clone()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edge_order.clone()
    }

    /// Bring a node to the front (topmost).
    pub fn bring_to_front(&mut self, id: &str) {
        if let Some(pos) = self.z_order.iter().position(|n| n == id) {
            let id = self.z_order.remove(pos);
            self.z_order.push(id);
        }
    }

    /// World endpoints of an edge, `None` when either node is missing.
    pub fn resolve_endpoints(&self, edge: &Edge) -> Option<(Point, Point)> {
        let source = self.nodes.get(&edge.source)?;
        let target = self.nodes.get(&edge.target)?;
        let anchor = |node: &Node, port: Option<&str>| {
            port.and_then(|p| node.port_position(p))
                .unwrap_or_else(|| node.center())
        };
        Some((
            anchor(source, edge.source_port.as_deref()),
            anchor(target, edge.target_port.as_deref()),
        ))
    }

    /// Re-route one edge. Returns `false` if it is missing or dangling.
    pub fn refresh_edge_path(&mut self, id: &str) -> bool {
        let Some(edge) = self.edges.get(id) else {
            return false;
        };
        let ends = self.resolve_endpoints(edge);
        let Some(edge) = self.edges.get_mut(id) else {
            return false;
        };
        match ends {
            Some((s, t)) => {
                edge.calculate_path(s, t);
                true
            }
            None => {
                edge.invalidate_path();
                false
            }
        }
    }

    /// Ids of edges touching a node.
    pub fn edges_for_node(&self, node_id: &str) -> Vec<EdgeId> {
        self.edge_order
            .iter()
            .filter(|id| {
                self.edges
                    .get(*id)
                    .is_some_and(|e| e.source == node_id || e.target == node_id)
            })
            .cloned()
            .collect()
    }

    /// Re-route every edge touching a node.
    pub fn refresh_paths_for_node(&mut self, node_id: &str) {
        for id in self.edges_for_node(node_id) {
            self.refresh_edge_path(&id);
        }
    }

    pub fn refresh_all_paths(&mut self) {
        for id in self.edge_order.clone() {
            self.refresh_edge_path(&id);
        }
    }

    /// True if either endpoint node is missing.
    pub fn is_dangling(&self, edge: &Edge) -> bool {
        !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target)
    }

    pub fn dangling_edges(&self) -> Vec<EdgeId> {
        self.edges_ordered()
            .filter(|e| self.is_dangling(e))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Union of all node bounds; `Rect::ZERO` when there are no nodes.
    pub fn bounds(&self) -> Rect {
        self.nodes_ordered()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Nodes whose bounds intersect `rect`.
    pub fn nodes_in_rect(&self, rect: Rect) -> Vec<NodeId> {
        self.nodes_ordered()
            .filter(|n| rects_overlap(n.bounds(), rect))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Non-dangling edges whose path crosses `rect`.
    pub fn edges_in_rect(&self, rect: Rect) -> Vec<EdgeId> {
        self.edges_ordered()
            .filter(|e| !self.is_dangling(e))
            .filter(|e| {
                e.path().is_some_and(|path| {
                    rects_overlap(path.bounds, rect)
                        && (path.points.iter().any(|p| rect_contains(rect, *p))
                            || path
                                .points
                                .windows(2)
                                .any(|w| segment_intersects_rect(w[0], w[1], rect)))
                })
            })
            .map(|e| e.id.clone())
            .collect()
    }

    /// Bounds of every routed point plus node bounds.
    pub fn content_bounds(&self) -> Rect {
        let mut points: Vec<Point> = Vec::new();
        for node in self.nodes.values() {
            let b = node.bounds();
            points.push(Point::new(b.x0, b.y0));
            points.push(Point::new(b.x1, b.y1));
        }
        for edge in self.edges.values() {
            if let Some(path) = edge.path() {
                points.extend(path.points.iter().copied());
            }
        }
        bounds_of(&points)
    }
}

fn rect_contains(rect: Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Liang-Barsky clip test.
fn segment_intersects_rect(a: Point, b: Point, rect: Rect) -> bool {
    let d = b - a;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    let checks = [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return false;
        }
    }
    true
}
