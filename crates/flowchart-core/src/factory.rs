//! Type-tag driven construction of nodes and edges.

use std::collections::HashMap;

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

use crate::edge::{ArrowKind, Edge, EdgeKind, EdgeLabel};
use crate::error::{FlowchartError, Result};
use crate::ids::new_id;
use crate::node::{Node, NodeKind, Port};
use crate::style::{EdgeStyle, NodeStyle};

/// Input record for creating a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeData {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub label: Option<String>,
    pub style: Option<NodeStyle>,
    pub ports: Option<Vec<Port>>,
    pub draggable: Option<bool>,
    pub selectable: Option<bool>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
    pub fn new(node_type: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            node_type: node_type.into(),
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Input record for creating an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeData {
    pub id: Option<String>,
    /// Routing tag; the editor's configured default when absent.
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
    pub source: String,
    pub target: String,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub label: Option<String>,
    pub waypoints: Vec<Point>,
    pub control_points: Vec<Point>,
    pub start_arrow: Option<ArrowKind>,
    pub end_arrow: Option<ArrowKind>,
    pub style: Option<EdgeStyle>,
    pub selectable: Option<bool>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl EdgeData {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_ports(mut self, source_port: impl Into<String>, target_port: impl Into<String>) -> Self {
        self.source_port = Some(source_port.into());
        self.target_port = Some(target_port.into());
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Point>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn with_control_points(mut self, control_points: Vec<Point>) -> Self {
        self.control_points = control_points;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Creates nodes from type tags.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    aliases: HashMap<String, NodeKind>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `tag` as another name for `kind`.
    pub fn register_alias(&mut self, tag: impl Into<String>, kind: NodeKind) {
        self.aliases.insert(tag.into(), kind);
    }

    pub fn resolve(&self, tag: &str) -> Result<NodeKind> {
        NodeKind::from_tag(tag)
            .or_else(|| self.aliases.get(tag).copied())
            .ok_or_else(|| FlowchartError::UnknownNodeType(tag.to_string()))
    }

    /// Build a node of type `tag`; unknown tags are an error.
    pub fn create_node(&self, tag: &str, data: NodeData) -> Result<Node> {
        let kind = self.resolve(tag)?;
        let id = data.id.unwrap_or_else(new_id);
        let mut node = Node::new(id, kind, Point::new(data.x, data.y));
        if let (Some(w), Some(h)) = (data.width, data.height) {
            node.size = Size::new(w.max(1.0), h.max(1.0));
        }
        if let Some(label) = data.label {
            node.label = label;
        }
        if let Some(style) = data.style {
            node.style = style;
        }
        if let Some(ports) = data.ports {
            node.ports = ports;
        }
        node.draggable = data.draggable.unwrap_or(true);
        node.selectable = data.selectable.unwrap_or(true);
        node.properties = data.properties;
        log::debug!("Created {} node {}", kind, node.id);
        Ok(node)
    }
}

/// Creates edges from type tags.
#[derive(Debug, Clone, Default)]
pub struct EdgeFactory {
    aliases: HashMap<String, &'static str>,
}

impl EdgeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that also accepts the `line` and `polyline` spellings.
    pub fn with_builtin_aliases() -> Self {
        let mut factory = Self::new();
        factory.aliases.insert("line".into(), "straight");
        factory.aliases.insert("polyline".into(), "orthogonal");
        factory
    }

    /// Accept `tag` as another name for the canonical tag `canonical`.
    pub fn register_alias(&mut self, tag: impl Into<String>, canonical: &str) -> Result<()> {
        let canonical = EdgeKind::TAGS
            .into_iter()
            .find(|t| *t == canonical)
            .ok_or_else(|| FlowchartError::UnknownEdgeType(canonical.to_string()))?;
        self.aliases.insert(tag.into(), canonical);
        Ok(())
    }

    pub fn resolve(&self, tag: &str) -> Result<EdgeKind> {
        let canonical = self.aliases.get(tag).copied().unwrap_or(tag);
        EdgeKind::from_tag(canonical).ok_or_else(|| FlowchartError::UnknownEdgeType(tag.to_string()))
    }

    /// Build an edge of type `tag`; unknown tags are an error.
    pub fn create_edge(&self, tag: &str, data: EdgeData) -> Result<Edge> {
        let mut kind = self.resolve(tag)?;
        match &mut kind {
            EdgeKind::Orthogonal { waypoints } => *waypoints = data.waypoints,
            EdgeKind::Bezier {
                custom_control_points,
            } => *custom_control_points = data.control_points,
            EdgeKind::Straight => {
                if !data.waypoints.is_empty() || !data.control_points.is_empty() {
                    log::warn!("Ignoring routing points on straight edge");
                }
            }
        }
        let id = data.id.unwrap_or_else(new_id);
        let mut edge = Edge::new(id, kind, data.source, data.target)
            .with_ports(data.source_port, data.target_port);
        if let Some(label) = data.label {
            edge.labels.push(EdgeLabel::new(label));
        }
        if let Some(style) = data.style {
            edge.style = style;
        }
        if let Some(arrow) = data.start_arrow {
            edge.start_arrow = arrow;
        }
        if let Some(arrow) = data.end_arrow {
            edge.end_arrow = arrow;
        }
        edge.selectable = data.selectable.unwrap_or(true);
        edge.properties = data.properties;
        log::debug!("Created {} edge {}", edge.kind.tag(), edge.id);
        Ok(edge)
    }
}
