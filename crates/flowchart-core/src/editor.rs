//! The editor facade: owns the diagram and everything that edits it.

use kurbo::{Point, Size};

use crate::config::EditorConfig;
use crate::diagram::Diagram;
use crate::edge::Edge;
use crate::error::{FlowchartError, Result};
use crate::events::{EditorEvent, EventBus, EventKind, SubscriptionId};
use crate::factory::{EdgeData, EdgeFactory, NodeData, NodeFactory};
use crate::ids::{EdgeId, NodeId};
use crate::input::{KeyEvent, PointerEvent};
use crate::interaction::{InteractionContext, InteractionManager, ToolMode};
use crate::node::Node;
use crate::selection::{SelectionItem, SelectionManager, SelectionMode};
use crate::snap::SnappingEngine;
use crate::viewport::Viewport;

/// One-way commands raised by status-bar controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomFit,
    ToggleSnap,
    CycleSnapSize,
}

impl UiCommand {
    pub const ALL: [UiCommand; 6] = [
        UiCommand::ZoomIn,
        UiCommand::ZoomOut,
        UiCommand::ZoomReset,
        UiCommand::ZoomFit,
        UiCommand::ToggleSnap,
        UiCommand::CycleSnapSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UiCommand::ZoomIn => "zoom-in",
            UiCommand::ZoomOut => "zoom-out",
            UiCommand::ZoomReset => "zoom-reset",
            UiCommand::ZoomFit => "zoom-fit",
            UiCommand::ToggleSnap => "toggle-snap",
            UiCommand::CycleSnapSize => "cycle-snap-size",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// What the status bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub mode_label: &'static str,
    pub tool: ToolMode,
    pub zoom_percent: i32,
    pub snap_enabled: bool,
    pub snap_size: f64,
    pub selected_nodes: usize,
    pub selected_edges: usize,
    pub cursor: Option<Point>,
    pub cursor_snapped: Option<Point>,
}

/// Flowchart editor.
#[derive(Debug)]
pub struct FlowchartEditor {
    diagram: Diagram,
    viewport: Viewport,
    selection: SelectionManager,
    snapping: SnappingEngine,
    events: EventBus,
    node_factory: NodeFactory,
    edge_factory: EdgeFactory,
    interaction: InteractionManager,
    config: EditorConfig,
    needs_redraw: bool,
}

impl FlowchartEditor {
    /// Build an editor from a validated config.
    pub fn new(config: EditorConfig) -> Result<Self> {
        config.validate()?;
        let edge_factory = EdgeFactory::with_builtin_aliases();
        edge_factory.resolve(&config.default_edge_type)?;
        log::debug!(
            "Editor created: canvas {}x{}, zoom {}..{}",
            config.canvas_size.width,
            config.canvas_size.height,
            config.min_zoom,
            config.max_zoom
        );
        Ok(Self {
            diagram: Diagram::new(),
            viewport: Viewport::with_bounds(config.min_zoom, config.max_zoom),
            selection: SelectionManager::new(),
            snapping: SnappingEngine::new(config.enable_snap, config.snap_size),
            events: EventBus::new(),
            node_factory: NodeFactory::new(),
            edge_factory,
            interaction: InteractionManager::new(),
            config,
            needs_redraw: true,
        })
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn snapping(&self) -> &SnappingEngine {
        &self.snapping
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn node_factory_mut(&mut self) -> &mut NodeFactory {
        &mut self.node_factory
    }

    pub fn edge_factory_mut(&mut self) -> &mut EdgeFactory {
        &mut self.edge_factory
    }

    pub fn canvas_size(&self) -> Size {
        self.config.canvas_size
    }

    pub fn set_canvas_size(&mut self, size: Size) {
        self.config.canvas_size = size;
        self.request_redraw();
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.config.readonly = readonly;
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the pending redraw flag.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    fn emit(&mut self, event: EditorEvent) {
        self.events.emit(&event);
    }

    fn emit_selection(&mut self) {
        let event = EditorEvent::SelectionChange {
            nodes: self.selection.selected_nodes().to_vec(),
            edges: self.selection.selected_edges().to_vec(),
        };
        self.events.emit(&event);
    }

    /// Run `f` against the interaction manager with a freshly split context.
    fn with_interaction<R>(
        &mut self,
        f: impl FnOnce(&mut InteractionManager, &mut InteractionContext<'_>) -> R,
    ) -> R {
        let mut ctx = InteractionContext {
            diagram: &mut self.diagram,
            viewport: &mut self.viewport,
            selection: &mut self.selection,
            snapping: &self.snapping,
            events: &mut self.events,
            edge_factory: &self.edge_factory,
            config: &self.config,
        };
        f(&mut self.interaction, &mut ctx)
    }

    // --- Diagram edits ---

    /// Create a node through the node factory and add it.
    pub fn add_node(&mut self, data: NodeData) -> Result<NodeId> {
        let tag = data.node_type.clone();
        let node = self.node_factory.create_node(&tag, data)?;
        self.insert_node(node)
    }

    /// Add an already-built node.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id.clone();
        self.diagram.add_node(node)?;
        self.emit(EditorEvent::NodeAdded { id: id.clone() });
        self.request_redraw();
        Ok(id)
    }

    /// Create an edge through the edge factory and add it.
    ///
    /// A missing `type` falls back to the configured default edge type.
    pub fn add_edge(&mut self, data: EdgeData) -> Result<EdgeId> {
        let tag = data
            .edge_type
            .clone()
            .unwrap_or_else(|| self.config.default_edge_type.clone());
        let edge = self.edge_factory.create_edge(&tag, data)?;
        self.insert_edge(edge)
    }

    pub fn insert_edge(&mut self, edge: Edge) -> Result<EdgeId> {
        let id = edge.id.clone();
        if let Err(err) = self.diagram.add_edge(edge) {
            log::warn!("Edge {id} rejected: {err}");
            return Err(err);
        }
        self.emit(EditorEvent::EdgeAdded { id: id.clone() });
        self.request_redraw();
        Ok(id)
    }

    /// Remove a node. Edges touching it are left dangling.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.diagram.remove_node(id)?;
        self.emit(EditorEvent::NodeRemoved { id: node.id.clone() });
        self.prune_selection();
        self.request_redraw();
        Some(node)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.diagram.remove_edge(id)?;
        self.emit(EditorEvent::EdgeRemoved { id: edge.id.clone() });
        self.prune_selection();
        self.request_redraw();
        Some(edge)
    }

    fn prune_selection(&mut self) {
        let before = self.selection.counts();
        self.selection.prune(&self.diagram);
        if self.selection.counts() != before {
            self.emit_selection();
        }
    }

    /// Remove every selected edge, then every selected node.
    pub fn delete_selected(&mut self) -> (Vec<NodeId>, Vec<EdgeId>) {
        let edges = self.selection.selected_edges().to_vec();
        let nodes = self.selection.selected_nodes().to_vec();
        let removed_edges: Vec<EdgeId> = edges
            .into_iter()
            .filter(|id| self.remove_edge(id).is_some())
            .collect();
        let removed_nodes: Vec<NodeId> = nodes
            .into_iter()
            .filter(|id| self.remove_node(id).is_some())
            .collect();
        log::debug!(
            "Deleted {} nodes and {} edges",
            removed_nodes.len(),
            removed_edges.len()
        );
        (removed_nodes, removed_edges)
    }

    /// Replace an orthogonal edge's waypoints. Returns `false` for other kinds.
    pub fn set_edge_waypoints(&mut self, id: &str, points: Vec<Point>) -> Result<bool> {
        let edge = self
            .diagram
            .edge_mut(id)
            .ok_or_else(|| FlowchartError::EdgeNotFound(id.to_string()))?;
        let applied = edge.set_waypoints(points);
        if applied {
            self.request_redraw();
        }
        Ok(applied)
    }

    /// Replace a Bezier edge's custom control points. Empty clears them.
    pub fn set_edge_control_points(&mut self, id: &str, points: Vec<Point>) -> Result<bool> {
        let edge = self
            .diagram
            .edge_mut(id)
            .ok_or_else(|| FlowchartError::EdgeNotFound(id.to_string()))?;
        let applied = edge.set_custom_control_points(points);
        if applied {
            self.request_redraw();
        }
        Ok(applied)
    }

    // --- Selection ---

    pub fn select(&mut self, items: impl IntoIterator<Item = SelectionItem>, mode: SelectionMode) {
        self.selection.select(items, mode);
        self.emit_selection();
        self.request_redraw();
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.emit_selection();
        self.request_redraw();
    }

    /// Restrict which nodes may be hit or selected.
    pub fn set_selectable_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection.set_selectable_nodes(ids);
        self.request_redraw();
    }

    /// Restrict which edges may be hit or selected.
    pub fn set_selectable_edges(&mut self, ids: impl IntoIterator<Item = EdgeId>) {
        self.selection.set_selectable_edges(ids);
        self.request_redraw();
    }

    // --- Viewport ---

    pub fn get_zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    pub fn set_zoom(&mut self, scale: f64) {
        self.viewport.set_zoom(scale);
        let scale = self.viewport.zoom();
        self.emit(EditorEvent::CanvasZoom { scale });
        self.request_redraw();
    }

    fn canvas_center(&self) -> Point {
        let size = self.config.canvas_size;
        Point::new(size.width / 2.0, size.height / 2.0)
    }

    /// Zoom in one step around the canvas centre.
    pub fn zoom_in(&mut self) -> f64 {
        let center = self.canvas_center();
        self.viewport.zoom_at(center, self.config.button_zoom_step);
        let scale = self.viewport.zoom();
        self.emit(EditorEvent::ZoomIn);
        self.request_redraw();
        scale
    }

    /// Zoom out one step around the canvas centre.
    pub fn zoom_out(&mut self) -> f64 {
        let center = self.canvas_center();
        self.viewport
            .zoom_at(center, 1.0 / self.config.button_zoom_step);
        let scale = self.viewport.zoom();
        self.emit(EditorEvent::ZoomOut);
        self.request_redraw();
        scale
    }

    pub fn zoom_reset(&mut self) {
        self.viewport.reset();
        self.emit(EditorEvent::ZoomReset);
        self.request_redraw();
    }

    /// Fit all nodes into the canvas.
    pub fn zoom_fit(&mut self) -> f64 {
        let content = self.diagram.content_bounds();
        self.viewport
            .zoom_fit(content, self.config.canvas_size, self.config.fit_margin);
        let scale = self.viewport.zoom();
        self.emit(EditorEvent::ZoomFit);
        self.request_redraw();
        scale
    }

    // --- Snapping ---

    pub fn toggle_snap(&mut self) -> bool {
        let enabled = self.snapping.toggle();
        self.emit(EditorEvent::ToggleSnap { enabled });
        self.request_redraw();
        enabled
    }

    pub fn cycle_snap_size(&mut self) -> f64 {
        let size = self.snapping.cycle_size();
        self.emit(EditorEvent::CycleSnapSize { size });
        self.request_redraw();
        size
    }

    // --- Input ---

    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        let redraw = self.with_interaction(|manager, ctx| manager.handle_pointer(ctx, event));
        if redraw {
            self.request_redraw();
        }
        redraw
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let redraw = self.with_interaction(|manager, ctx| manager.handle_key(ctx, event));
        if redraw {
            self.request_redraw();
        }
        redraw
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.with_interaction(|manager, ctx| manager.set_tool(tool, ctx));
        self.request_redraw();
    }

    /// Abandon the gesture in progress.
    pub fn cancel_interaction(&mut self) -> bool {
        let cancelled = self.with_interaction(|manager, ctx| manager.cancel(ctx));
        if cancelled {
            self.request_redraw();
        }
        cancelled
    }

    /// Apply a status-bar command.
    pub fn raise(&mut self, command: UiCommand) {
        log::debug!("UI command {}", command.name());
        match command {
            UiCommand::ZoomIn => {
                self.zoom_in();
            }
            UiCommand::ZoomOut => {
                self.zoom_out();
            }
            UiCommand::ZoomReset => self.zoom_reset(),
            UiCommand::ZoomFit => {
                self.zoom_fit();
            }
            UiCommand::ToggleSnap => {
                self.toggle_snap();
            }
            UiCommand::CycleSnapSize => {
                self.cycle_snap_size();
            }
        }
    }

    // --- Events ---

    pub fn subscribe(&mut self, callback: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&EditorEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe_to(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn status(&self) -> StatusSnapshot {
        let (selected_nodes, selected_edges) = self.selection.counts();
        let (cursor, cursor_snapped) = match self.interaction.cursor() {
            Some((world, snapped)) => (Some(world), snapped),
            None => (None, None),
        };
        StatusSnapshot {
            mode_label: self.interaction.kind().label(),
            tool: self.interaction.tool(),
            zoom_percent: (self.viewport.zoom() * 100.0).round() as i32,
            snap_enabled: self.snapping.is_enabled(),
            snap_size: self.snapping.size(),
            selected_nodes,
            selected_edges,
            cursor,
            cursor_snapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::interaction::InteractionKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor() -> FlowchartEditor {
        FlowchartEditor::new(EditorConfig {
            show_guides: false,
            ..EditorConfig::default()
        })
        .unwrap()
    }

    fn two_nodes(editor: &mut FlowchartEditor) {
        editor
            .add_node(NodeData::new("process", 100.0, 100.0).with_id("a"))
            .unwrap();
        editor
            .add_node(NodeData::new("process", 300.0, 100.0).with_id("b"))
            .unwrap();
        editor
            .add_edge(
                EdgeData::new("a", "b")
                    .with_id("e1")
                    .with_type("orthogonal")
                    .with_waypoints(vec![Point::new(200.0, 100.0)]),
            )
            .unwrap();
    }

    fn record(editor: &mut FlowchartEditor) -> Rc<RefCell<Vec<EditorEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        editor.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EditorConfig {
            max_zoom: 0.05,
            ..EditorConfig::default()
        };
        assert!(FlowchartEditor::new(config).is_err());

        let config = EditorConfig {
            default_edge_type: "squiggle".into(),
            ..EditorConfig::default()
        };
        assert!(matches!(
            FlowchartEditor::new(config),
            Err(FlowchartError::UnknownEdgeType(_))
        ));
    }

    #[test]
    fn test_waypoint_drag_scenario() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let path = editor.diagram().edge("e1").unwrap().path().unwrap();
        assert_eq!(
            path.points,
            vec![
                Point::new(220.0, 130.0),
                Point::new(200.0, 100.0),
                Point::new(300.0, 130.0)
            ]
        );

        let drags = Rc::new(RefCell::new(Vec::new()));
        let sink = drags.clone();
        editor.subscribe_to(EventKind::EdgeWaypointDrag, move |e| {
            if let EditorEvent::EdgeWaypointDrag {
                waypoints, index, ..
            } = e
            {
                sink.borrow_mut().push(waypoints[*index]);
            }
        });

        editor.handle_pointer(&PointerEvent::down(200.0, 100.0));
        editor.handle_pointer(&PointerEvent::moved(260.0, 130.0).with_modifiers(Modifiers::shift()));
        editor.handle_pointer(&PointerEvent::up(260.0, 130.0));

        let drags = drags.borrow();
        assert_eq!(drags.len(), 1);
        assert!((drags[0].y - 100.0).abs() < f64::EPSILON);
        assert_eq!(editor.interaction().kind(), InteractionKind::Idle);
    }

    #[test]
    fn test_add_edge_unknown_type() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let err = editor
            .add_edge(EdgeData::new("a", "b").with_type("zigzag"))
            .unwrap_err();
        assert_eq!(err, FlowchartError::UnknownEdgeType("zigzag".into()));
        // Aliases resolve.
        assert!(editor.add_edge(EdgeData::new("a", "b").with_type("line")).is_ok());
    }

    #[test]
    fn test_add_edge_defaults_type() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let id = editor.add_edge(EdgeData::new("b", "a")).unwrap();
        assert_eq!(editor.diagram().edge(&id).unwrap().kind.tag(), "orthogonal");
    }

    #[test]
    fn test_add_node_unknown_type() {
        let mut editor = editor();
        assert!(matches!(
            editor.add_node(NodeData::new("blob", 0.0, 0.0)),
            Err(FlowchartError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn test_delete_selected_does_not_cascade() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let log = record(&mut editor);
        editor.select([SelectionItem::Node("a".into())], SelectionMode::Replace);
        let (nodes, edges) = editor.delete_selected();
        assert_eq!(nodes, vec!["a".to_string()]);
        assert!(edges.is_empty());
        assert_eq!(editor.diagram().edge_count(), 1);
        assert!(editor.diagram().is_dangling(editor.diagram().edge("e1").unwrap()));
        assert!(editor.selection().is_empty());
        assert!(log
            .borrow()
            .iter()
            .any(|e| matches!(e, EditorEvent::NodeRemoved { id } if id == "a")));
    }

    #[test]
    fn test_zoom_commands() {
        let mut editor = editor();
        let log = record(&mut editor);
        assert!((editor.zoom_in() - 1.2).abs() < 1e-12);
        assert!((editor.zoom_out() - 1.0).abs() < 1e-12);
        editor.set_zoom(50.0);
        assert!((editor.get_zoom() - 5.0).abs() < f64::EPSILON);
        editor.raise(UiCommand::ZoomReset);
        assert!((editor.get_zoom() - 1.0).abs() < f64::EPSILON);
        let names: Vec<&str> = log.borrow().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["zoom-in", "zoom-out", "canvas-zoom", "zoom-reset"]);
        assert_eq!(log.borrow()[0], EditorEvent::ZoomIn);
        assert_eq!(log.borrow()[1], EditorEvent::ZoomOut);
    }

    #[test]
    fn test_zoom_fit() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let scale = editor.zoom_fit();
        // content 320x60 in 800x600: min(2.5, 10) * 0.9
        assert!((scale - 2.25).abs() < 1e-9);
        let center = editor.viewport().to_screen(Point::new(260.0, 130.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_fit_empty_resets() {
        let mut editor = editor();
        editor.set_zoom(3.0);
        let log = record(&mut editor);
        assert!((editor.zoom_fit() - 1.0).abs() < f64::EPSILON);
        assert_eq!(log.borrow().as_slice(), &[EditorEvent::ZoomFit]);
    }

    #[test]
    fn test_snap_commands_and_status() {
        let mut editor = editor();
        editor.raise(UiCommand::ToggleSnap);
        editor.raise(UiCommand::CycleSnapSize);
        let status = editor.status();
        assert!(status.snap_enabled);
        assert!((status.snap_size - 16.0).abs() < f64::EPSILON);
        assert_eq!(status.zoom_percent, 100);
        assert_eq!(status.mode_label, "Ready");

        editor.handle_pointer(&PointerEvent::moved(14.0, 26.0));
        let status = editor.status();
        assert_eq!(status.cursor, Some(Point::new(14.0, 26.0)));
        assert_eq!(status.cursor_snapped, Some(Point::new(16.0, 32.0)));
    }

    #[test]
    fn test_ui_command_names() {
        for command in UiCommand::ALL {
            assert_eq!(UiCommand::from_name(command.name()), Some(command));
        }
        assert_eq!(UiCommand::from_name("zoom-sideways"), None);
    }

    #[test]
    fn test_redraw_flag() {
        let mut editor = editor();
        assert!(editor.take_redraw_request());
        assert!(!editor.take_redraw_request());
        editor.toggle_snap();
        assert!(editor.take_redraw_request());
        editor.handle_pointer(&PointerEvent::moved(5.0, 5.0));
        assert!(!editor.take_redraw_request());
    }

    #[test]
    fn test_set_edge_points() {
        let mut editor = editor();
        two_nodes(&mut editor);
        assert!(editor
            .set_edge_waypoints("e1", vec![Point::new(250.0, 50.0)])
            .unwrap());
        assert!(!editor.set_edge_control_points("e1", Vec::new()).unwrap());
        assert_eq!(
            editor.set_edge_waypoints("nope", Vec::new()),
            Err(FlowchartError::EdgeNotFound("nope".into()))
        );
    }

    #[test]
    fn test_delete_key_then_host_deletes() {
        let mut editor = editor();
        two_nodes(&mut editor);
        let requests = Rc::new(RefCell::new(0));
        let sink = requests.clone();
        editor.subscribe_to(EventKind::DeleteRequest, move |_| *sink.borrow_mut() += 1);
        editor.select([SelectionItem::Edge("e1".into())], SelectionMode::Replace);
        editor.handle_key(&KeyEvent::pressed(crate::input::Key::Delete));
        assert_eq!(*requests.borrow(), 1);
        assert_eq!(editor.diagram().edge_count(), 1);
        editor.delete_selected();
        assert_eq!(editor.diagram().edge_count(), 0);
    }
}
