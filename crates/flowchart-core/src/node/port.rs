//! Connection anchors on a node boundary.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{FlowchartError, Result};
use crate::ids::PortId;

/// Side of the node bounding box a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl PortSide {
    /// Point on `bounds` at `offset` (0..1) along this side.
    pub fn point_on(self, bounds: Rect, offset: f64) -> Point {
        let t = offset.clamp(0.0, 1.0);
        match self {
            PortSide::Left => Point::new(bounds.x0, bounds.y0 + bounds.height() * t),
            PortSide::Right => Point::new(bounds.x1, bounds.y0 + bounds.height() * t),
            PortSide::Top => Point::new(bounds.x0 + bounds.width() * t, bounds.y0),
            PortSide::Bottom => Point::new(bounds.x0 + bounds.width() * t, bounds.y1),
        }
    }

    /// Outward normal of this side.
    pub fn normal(self) -> kurbo::Vec2 {
        match self {
            PortSide::Left => kurbo::Vec2::new(-1.0, 0.0),
            PortSide::Right => kurbo::Vec2::new(1.0, 0.0),
            PortSide::Top => kurbo::Vec2::new(0.0, -1.0),
            PortSide::Bottom => kurbo::Vec2::new(0.0, 1.0),
        }
    }
}

/// Whether a port accepts incoming edges, outgoing edges or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    #[default]
    Both,
}

impl PortDirection {
    pub fn accepts_incoming(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::Both)
    }

    pub fn accepts_outgoing(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::Both)
    }
}

/// Unbounded connection capacity.
pub const UNLIMITED_CONNECTIONS: i32 = -1;

/// A connection anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: PortId,
    pub side: PortSide,
    /// Position along the side, 0..1.
    pub offset: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub connectable: bool,
    /// Maximum number of connections, `-1` for unbounded.
    #[serde(default = "default_max_connections")]
    pub max_connections: i32,
    #[serde(default)]
    pub current_connections: u32,
    #[serde(default)]
    pub direction: PortDirection,
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> i32 {
    UNLIMITED_CONNECTIONS
}

impl Port {
    pub fn new(id: impl Into<PortId>, side: PortSide, offset: f64) -> Self {
        Self {
            id: id.into(),
            side,
            offset,
            label: None,
            connectable: true,
            max_connections: UNLIMITED_CONNECTIONS,
            current_connections: 0,
            direction: PortDirection::Both,
        }
    }

    pub fn input(id: impl Into<PortId>, side: PortSide) -> Self {
        Self {
            direction: PortDirection::Input,
            ..Self::new(id, side, 0.5)
        }
    }

    pub fn output(id: impl Into<PortId>, side: PortSide) -> Self {
        Self {
            direction: PortDirection::Output,
            ..Self::new(id, side, 0.5)
        }
    }

    pub fn with_max_connections(mut self, max: i32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_connections < 0
    }

    /// True if another connection can be attached.
    pub fn has_capacity(&self) -> bool {
        self.is_unbounded() || (self.current_connections as i64) < self.max_connections as i64
    }

    /// Record a new connection, failing if the port is full or not connectable.
    pub fn try_connect(&mut self, node_id: &str) -> Result<()> {
        if !self.connectable {
            return Err(FlowchartError::PortNotConnectable {
                node: node_id.to_string(),
                port: self.id.clone(),
            });
        }
        if !self.has_capacity() {
            return Err(FlowchartError::PortCapacityExceeded {
                node: node_id.to_string(),
                port: self.id.clone(),
                max: self.max_connections,
            });
        }
        self.current_connections += 1;
        Ok(())
    }

    /// Drop one connection; saturates at zero.
    pub fn disconnect(&mut self) {
        self.current_connections = self.current_connections.saturating_sub(1);
    }

    /// World position of this port on a node with the given bounds.
    pub fn position(&self, bounds: Rect) -> Point {
        self.side.point_on(bounds, self.offset)
    }
}
