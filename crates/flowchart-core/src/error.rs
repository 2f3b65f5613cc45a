//! Error types for the flowchart core.

use thiserror::Error;

/// Errors surfaced by the data model, factories and editor facade.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowchartError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("Unknown edge type: {0}")]
    UnknownEdgeType(String),
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),
    #[error("Port {port} not found on node {node}")]
    PortNotFound { node: String, port: String },
    #[error("Port {port} on node {node} is not connectable")]
    PortNotConnectable { node: String, port: String },
    #[error("Port {port} on node {node} already has {max} connection(s)")]
    PortCapacityExceeded { node: String, port: String, max: i32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for flowchart operations.
pub type Result<T> = std::result::Result<T, FlowchartError>;
