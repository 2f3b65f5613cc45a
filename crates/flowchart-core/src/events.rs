//! Editor events and the subscription registry.

use kurbo::{Point, Vec2};

use crate::edge::EdgeEnd;
use crate::ids::{EdgeId, NodeId, PortId};
use crate::interaction::{InteractionKind, ToolMode};
use crate::snap::Guide;

/// Everything the editor reports to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    EdgeWaypointDrag {
        edge_id: EdgeId,
        waypoints: Vec<Point>,
        index: usize,
    },
    EdgeWaypointDragEnd {
        edge_id: EdgeId,
        waypoints: Vec<Point>,
        index: usize,
    },
    EdgeControlDrag {
        edge_id: EdgeId,
        control_points: Vec<Point>,
        index: usize,
    },
    EdgeControlDragEnd {
        edge_id: EdgeId,
        control_points: Vec<Point>,
        index: usize,
    },
    EdgeWaypointInsert {
        edge_id: EdgeId,
        index: usize,
        point: Point,
    },
    EdgeWaypointRemove {
        edge_id: EdgeId,
        index: usize,
    },
    EdgeControlClear {
        edge_id: EdgeId,
    },
    /// Zoom notifications carry nothing; listeners read the zoom back from the editor.
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomFit,
    ToggleSnap {
        enabled: bool,
    },
    CycleSnapSize {
        size: f64,
    },
    SelectionChange {
        nodes: Vec<NodeId>,
        edges: Vec<EdgeId>,
    },
    NodeDrag {
        ids: Vec<NodeId>,
        delta: Vec2,
    },
    NodeDragEnd {
        ids: Vec<NodeId>,
        delta: Vec2,
    },
    CanvasPan {
        offset: Vec2,
    },
    CanvasZoom {
        scale: f64,
    },
    CursorMove {
        world: Point,
        snapped: Option<Point>,
    },
    ModeChange {
        state: InteractionKind,
        tool: ToolMode,
    },
    GuidesChange {
        guides: Vec<Guide>,
    },
    ConnectStart {
        node_id: NodeId,
        port_id: PortId,
        point: Point,
    },
    ConnectPreview {
        point: Point,
        target: Option<(NodeId, PortId)>,
    },
    ConnectEnd {
        edge_id: EdgeId,
        source: (NodeId, PortId),
        target: (NodeId, PortId),
    },
    ConnectCancel,
    /// An endpoint of a selected edge was grabbed.
    ReconnectStart {
        edge_id: EdgeId,
        end: EdgeEnd,
    },
    ReconnectPreview {
        edge_id: EdgeId,
        end: EdgeEnd,
        point: Point,
        /// The end that stays attached.
        fixed: Point,
        target: Option<(NodeId, PortId)>,
    },
    ReconnectEnd {
        edge_id: EdgeId,
        end: EdgeEnd,
        node_id: NodeId,
        port_id: PortId,
    },
    /// The drag ended off any port or was rejected; the edge is unchanged.
    ReconnectCancel {
        edge_id: EdgeId,
        end: EdgeEnd,
    },
    DeleteRequest {
        nodes: Vec<NodeId>,
        edges: Vec<EdgeId>,
    },
    NodeAdded {
        id: NodeId,
    },
    NodeRemoved {
        id: NodeId,
    },
    EdgeAdded {
        id: EdgeId,
    },
    EdgeRemoved {
        id: EdgeId,
    },
}

/// Payload-free discriminant of [`EditorEvent`], used for filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EdgeWaypointDrag,
    EdgeWaypointDragEnd,
    EdgeControlDrag,
    EdgeControlDragEnd,
    EdgeWaypointInsert,
    EdgeWaypointRemove,
    EdgeControlClear,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomFit,
    ToggleSnap,
    CycleSnapSize,
    SelectionChange,
    NodeDrag,
    NodeDragEnd,
    CanvasPan,
    CanvasZoom,
    CursorMove,
    ModeChange,
    GuidesChange,
    ConnectStart,
    ConnectPreview,
    ConnectEnd,
    ConnectCancel,
    ReconnectStart,
    ReconnectPreview,
    ReconnectEnd,
    ReconnectCancel,
    DeleteRequest,
    NodeAdded,
    NodeRemoved,
    EdgeAdded,
    EdgeRemoved,
}

impl EventKind {
    /// Wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::EdgeWaypointDrag => "edge-waypoint-drag",
            EventKind::EdgeWaypointDragEnd => "edge-waypoint-drag-end",
            EventKind::EdgeControlDrag => "edge-control-drag",
            EventKind::EdgeControlDragEnd => "edge-control-drag-end",
            EventKind::EdgeWaypointInsert => "edge-waypoint-insert",
            EventKind::EdgeWaypointRemove => "edge-waypoint-remove",
            EventKind::EdgeControlClear => "edge-control-clear",
            EventKind::ZoomIn => "zoom-in",
            EventKind::ZoomOut => "zoom-out",
            EventKind::ZoomReset => "zoom-reset",
            EventKind::ZoomFit => "zoom-fit",
            EventKind::ToggleSnap => "toggle-snap",
            EventKind::CycleSnapSize => "cycle-snap-size",
            EventKind::SelectionChange => "selection-change",
            EventKind::NodeDrag => "node-drag",
            EventKind::NodeDragEnd => "node-drag-end",
            EventKind::CanvasPan => "canvas-pan",
            EventKind::CanvasZoom => "canvas-zoom",
            EventKind::CursorMove => "cursor-move",
            EventKind::ModeChange => "mode-change",
            EventKind::GuidesChange => "guides-change",
            EventKind::ConnectStart => "connect-start",
            EventKind::ConnectPreview => "connect-preview",
            EventKind::ConnectEnd => "connect-end",
            EventKind::ConnectCancel => "connect-cancel",
            EventKind::ReconnectStart => "reconnect-start",
            EventKind::ReconnectPreview => "reconnect-preview",
            EventKind::ReconnectEnd => "reconnect-end",
            EventKind::ReconnectCancel => "reconnect-cancel",
            EventKind::DeleteRequest => "delete-request",
            EventKind::NodeAdded => "node-added",
            EventKind::NodeRemoved => "node-removed",
            EventKind::EdgeAdded => "edge-added",
            EventKind::EdgeRemoved => "edge-removed",
        }
    }
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::EdgeWaypointDrag { .. } => EventKind::EdgeWaypointDrag,
            EditorEvent::EdgeWaypointDragEnd { .. } => EventKind::EdgeWaypointDragEnd,
            EditorEvent::EdgeControlDrag { .. } => EventKind::EdgeControlDrag,
            EditorEvent::EdgeControlDragEnd { .. } => EventKind::EdgeControlDragEnd,
            EditorEvent::EdgeWaypointInsert { .. } => EventKind::EdgeWaypointInsert,
            EditorEvent::EdgeWaypointRemove { .. } => EventKind::EdgeWaypointRemove,
            EditorEvent::EdgeControlClear { .. } => EventKind::EdgeControlClear,
            EditorEvent::ZoomIn => EventKind::ZoomIn,
            EditorEvent::ZoomOut => EventKind::ZoomOut,
            EditorEvent::ZoomReset => EventKind::ZoomReset,
            EditorEvent::ZoomFit => EventKind::ZoomFit,
            EditorEvent::ToggleSnap { .. } => EventKind::ToggleSnap,
            EditorEvent::CycleSnapSize { .. } => EventKind::CycleSnapSize,
            EditorEvent::SelectionChange { .. } => EventKind::SelectionChange,
            EditorEvent::NodeDrag { .. } => EventKind::NodeDrag,
            EditorEvent::NodeDragEnd { .. } => EventKind::NodeDragEnd,
            EditorEvent::CanvasPan { .. } => EventKind::CanvasPan,
            EditorEvent::CanvasZoom { .. } => EventKind::CanvasZoom,
            EditorEvent::CursorMove { .. } => EventKind::CursorMove,
            EditorEvent::ModeChange { .. } => EventKind::ModeChange,
            EditorEvent::GuidesChange { .. } => EventKind::GuidesChange,
            EditorEvent::ConnectStart { .. } => EventKind::ConnectStart,
            EditorEvent::ConnectPreview { .. } => EventKind::ConnectPreview,
            EditorEvent::ConnectEnd { .. } => EventKind::ConnectEnd,
            EditorEvent::ConnectCancel => EventKind::ConnectCancel,
            EditorEvent::ReconnectStart { .. } => EventKind::ReconnectStart,
            EditorEvent::ReconnectPreview { .. } => EventKind::ReconnectPreview,
            EditorEvent::ReconnectEnd { .. } => EventKind::ReconnectEnd,
            EditorEvent::ReconnectCancel { .. } => EventKind::ReconnectCancel,
            EditorEvent::DeleteRequest { .. } => EventKind::DeleteRequest,
            EditorEvent::NodeAdded { .. } => EventKind::NodeAdded,
            EditorEvent::NodeRemoved { .. } => EventKind::NodeRemoved,
            EditorEvent::EdgeAdded { .. } => EventKind::EdgeAdded,
            EditorEvent::EdgeRemoved { .. } => EventKind::EdgeRemoved,
        }
    }

    /// Wire name, e.g. `edge-waypoint-drag`.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&EditorEvent)>;

struct Listener {
    id: SubscriptionId,
    filter: Option<EventKind>,
    callback: Callback,
}

/// Synchronous fan-out of editor events to registered callbacks.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, filter: Option<EventKind>, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push(Listener {
            id,
            filter,
            callback,
        });
        id
    }

    /// Receive every event.
    pub fn subscribe(&mut self, callback: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.register(None, Box::new(callback))
    }

    /// Receive only events of `kind`.
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&EditorEvent) + 'static,
    ) -> SubscriptionId {
        self.register(Some(kind), Box::new(callback))
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to matching listeners in subscription order.
    pub fn emit(&mut self, event: &EditorEvent) {
        let kind = event.kind();
        if kind != EventKind::CursorMove {
            log::trace!("emit {}", kind.name());
        }
        for listener in &mut self.listeners {
            if listener.filter.is_none_or(|f| f == kind) {
                (listener.callback)(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_names() {
        let ev = EditorEvent::EdgeWaypointDrag {
            edge_id: "e".into(),
            waypoints: Vec::new(),
            index: 0,
        };
        assert_eq!(ev.name(), "edge-waypoint-drag");
        assert_eq!(EditorEvent::ZoomReset.name(), "zoom-reset");
        assert_eq!(EventKind::CycleSnapSize.name(), "cycle-snap-size");
        let ev = EditorEvent::ReconnectCancel {
            edge_id: "e".into(),
            end: EdgeEnd::Target,
        };
        assert_eq!(ev.name(), "reconnect-cancel");
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = bus.subscribe(move |e| sink.borrow_mut().push(e.name()));
        assert_eq!(bus.listener_count(), 1);

        bus.emit(&EditorEvent::ZoomReset);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&EditorEvent::ZoomReset);
        assert_eq!(*seen.borrow(), vec!["zoom-reset"]);
    }

    #[test]
    fn test_filtered_subscription() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        bus.subscribe_to(EventKind::ToggleSnap, move |_| *c.borrow_mut() += 1);
        bus.emit(&EditorEvent::ZoomReset);
        bus.emit(&EditorEvent::ToggleSnap { enabled: true });
        assert_eq!(*count.borrow(), 1);
    }
}
