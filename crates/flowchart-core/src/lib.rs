//! Flowchart Core Library
//!
//! Platform-agnostic data model, geometry and interaction logic for the
//! flowchart editor. Rendering lives in `flowchart-render`.

pub mod config;
pub mod diagram;
pub mod edge;
pub mod editor;
pub mod error;
pub mod events;
pub mod factory;
pub mod geometry;
pub mod ids;
pub mod input;
pub mod interaction;
pub mod node;
pub mod selection;
pub mod snap;
pub mod style;
pub mod text;
pub mod viewport;

pub use config::EditorConfig;
pub use diagram::Diagram;
pub use edge::{ArrowKind, Edge, EdgeEnd, EdgeKind, EdgeLabel, EdgePath};
pub use editor::{FlowchartEditor, StatusSnapshot, UiCommand};
pub use error::{FlowchartError, Result};
pub use events::{EditorEvent, EventBus, EventKind, SubscriptionId};
pub use factory::{EdgeData, EdgeFactory, NodeData, NodeFactory};
pub use ids::{EdgeId, NodeId, PortId};
pub use input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{InteractionKind, InteractionManager, ProvisionalEdge, ToolMode};
pub use node::{Node, NodeKind, Port, PortDirection, PortSide, Silhouette};
pub use selection::{Handle, HandleKind, Hit, HitTolerances, SelectionItem, SelectionManager, SelectionMode};
pub use snap::{Guide, GuideOrientation, SnappingEngine, snap_to_grid};
pub use style::{EdgeStyle, NodeStyle, SerializableColor, StrokeStyle};
pub use text::{ApproxTextMeasure, TextMeasure};
pub use viewport::Viewport;
