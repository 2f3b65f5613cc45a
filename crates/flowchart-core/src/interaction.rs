//! Pointer-driven interaction state machine.
//!
//! The manager owns only gesture state. Everything it edits is reached
//! through an [`InteractionContext`] built by the editor for each event.

use kurbo::{Point, Rect, Vec2};

use crate::config::EditorConfig;
use crate::diagram::Diagram;
use crate::edge::{EdgeEnd, EdgeKind};
use crate::events::{EditorEvent, EventBus};
use crate::factory::{EdgeData, EdgeFactory};
use crate::ids::{EdgeId, NodeId, PortId};
use crate::input::{InputState, Key, KeyEvent, MouseButton, PointerEvent};
use crate::selection::{Hit, HitTolerances, PortMatch, SelectionItem, SelectionManager, SelectionMode};
use crate::snap::{Guide, SnappingEngine};
use crate::viewport::Viewport;

/// Rubber-band drags smaller than this (world units) count as clicks.
const CLICK_SLOP: f64 = 1e-6;

/// What a left drag on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    /// Every left drag pans.
    Pan,
    /// Left press near a port starts a connection.
    Connect,
}

impl ToolMode {
    pub fn name(self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Pan => "pan",
            ToolMode::Connect => "connect",
        }
    }
}

/// Payload-free view of the current interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Idle,
    Panning,
    DraggingNode,
    DrawingEdge,
    DraggingWaypoint,
    DraggingControlPoint,
    ReconnectingEndpoint,
    RectSelecting,
}

impl InteractionKind {
    /// Label shown in the status bar.
    pub fn label(self) -> &'static str {
        match self {
            InteractionKind::Idle => "Ready",
            InteractionKind::Panning => "Panning",
            InteractionKind::DraggingNode => "Moving node",
            InteractionKind::DrawingEdge => "Connecting",
            InteractionKind::DraggingWaypoint => "Editing waypoint",
            InteractionKind::DraggingControlPoint => "Editing control point",
            InteractionKind::ReconnectingEndpoint => "Reconnecting",
            InteractionKind::RectSelecting => "Selecting",
        }
    }
}

#[derive(Debug, Clone, Default)]
enum InteractionState {
    #[default]
    Idle,
    Panning {
        start_screen: Point,
        start_offset: Vec2,
    },
    DraggingNode {
        start_world: Point,
        originals: Vec<(NodeId, Point)>,
        delta: Vec2,
    },
    DrawingEdge {
        source_node: NodeId,
        source_port: PortId,
        start: Point,
        current: Point,
        target: Option<PortMatch>,
    },
    DraggingWaypoint {
        edge_id: EdgeId,
        index: usize,
        start_world: Point,
        origin: Point,
        original: Vec<Point>,
    },
    DraggingControlPoint {
        edge_id: EdgeId,
        index: usize,
        start_world: Point,
        origin: Point,
        original: Vec<Point>,
    },
    /// Nothing is written to the diagram until release.
    ReconnectingEndpoint {
        edge_id: EdgeId,
        end: EdgeEnd,
        /// Node holding the end that stays put.
        anchor_node: NodeId,
        fixed: Point,
        current: Point,
        target: Option<PortMatch>,
    },
    RectSelecting {
        start_world: Point,
        current_world: Point,
        additive: bool,
    },
}

impl InteractionState {
    fn kind(&self) -> InteractionKind {
        match self {
            InteractionState::Idle => InteractionKind::Idle,
            InteractionState::Panning { .. } => InteractionKind::Panning,
            InteractionState::DraggingNode { .. } => InteractionKind::DraggingNode,
            InteractionState::DrawingEdge { .. } => InteractionKind::DrawingEdge,
            InteractionState::DraggingWaypoint { .. } => InteractionKind::DraggingWaypoint,
            InteractionState::DraggingControlPoint { .. } => InteractionKind::DraggingControlPoint,
            InteractionState::ReconnectingEndpoint { .. } => InteractionKind::ReconnectingEndpoint,
            InteractionState::RectSelecting { .. } => InteractionKind::RectSelecting,
        }
    }
}

/// The edge being drawn from a port, or the loose end of one being
/// reconnected, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionalEdge {
    pub from: Point,
    pub to: Point,
    pub target: Option<PortMatch>,
}

/// Mutable editor state an interaction step may touch.
pub struct InteractionContext<'a> {
    pub diagram: &'a mut Diagram,
    pub viewport: &'a mut Viewport,
    pub selection: &'a mut SelectionManager,
    pub snapping: &'a SnappingEngine,
    pub events: &'a mut EventBus,
    pub edge_factory: &'a EdgeFactory,
    pub config: &'a EditorConfig,
}

impl InteractionContext<'_> {
    fn tolerances(&self) -> HitTolerances {
        self.config.tolerances().scaled(self.viewport.zoom())
    }

    fn emit_selection(&mut self) {
        let event = EditorEvent::SelectionChange {
            nodes: self.selection.selected_nodes().to_vec(),
            edges: self.selection.selected_edges().to_vec(),
        };
        self.events.emit(&event);
    }

    /// Replace/toggle selection with one item and report it.
    fn select_one(&mut self, item: SelectionItem, mode: SelectionMode) {
        self.selection.select([item], mode);
        self.emit_selection();
    }
}

/// Constrain `target` to the dominant axis of its offset from `origin`.
pub fn lock_axis(origin: Point, target: Point) -> Point {
    let dx = (target.x - origin.x).abs();
    let dy = (target.y - origin.y).abs();
    if dx > dy {
        Point::new(target.x, origin.y)
    } else {
        Point::new(origin.x, target.y)
    }
}

/// Routes pointer and key input into diagram edits.
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    state: InteractionState,
    tool: ToolMode,
    input: InputState,
    guides: Vec<Guide>,
    cursor: Option<(Point, Option<Point>)>,
}

impl InteractionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> InteractionKind {
        self.state.kind()
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Active alignment guides.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Last cursor position in world units, and its snapped version when snapping is on.
    pub fn cursor(&self) -> Option<(Point, Option<Point>)> {
        self.cursor
    }

    /// Current rubber band in world coordinates.
    pub fn rubber_band(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::RectSelecting {
                start_world,
                current_world,
                ..
            } => Some(Rect::from_points(*start_world, *current_world)),
            _ => None,
        }
    }

    pub fn provisional_edge(&self) -> Option<ProvisionalEdge> {
        match &self.state {
            InteractionState::DrawingEdge {
                start,
                current,
                target,
                ..
            } => Some(ProvisionalEdge {
                from: *start,
                to: target.as_ref().map(|t| t.position).unwrap_or(*current),
                target: target.clone(),
            }),
            InteractionState::ReconnectingEndpoint {
                fixed,
                current,
                target,
                ..
            } => Some(ProvisionalEdge {
                from: *fixed,
                to: target.as_ref().map(|t| t.position).unwrap_or(*current),
                target: target.clone(),
            }),
            _ => None,
        }
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolMode, ctx: &mut InteractionContext<'_>) {
        if self.tool == tool {
            return;
        }
        self.cancel(ctx);
        self.tool = tool;
        ctx.events.emit(&EditorEvent::ModeChange {
            state: self.kind(),
            tool,
        });
    }

    fn transition(&mut self, next: InteractionState, events: &mut EventBus) {
        let before = self.state.kind();
        self.state = next;
        let after = self.state.kind();
        if before != after {
            log::debug!("Interaction {:?} -> {:?}", before, after);
            events.emit(&EditorEvent::ModeChange {
                state: after,
                tool: self.tool,
            });
        }
    }

    fn set_guides(&mut self, guides: Vec<Guide>, events: &mut EventBus) {
        if self.guides.is_empty() && guides.is_empty() {
            return;
        }
        self.guides = guides;
        events.emit(&EditorEvent::GuidesChange {
            guides: self.guides.clone(),
        });
    }

    /// Feed one pointer event. Returns `true` if a redraw is needed.
    pub fn handle_pointer(&mut self, ctx: &mut InteractionContext<'_>, event: &PointerEvent) -> bool {
        self.input.handle_pointer_event(event);
        match event {
            PointerEvent::Down {
                position, button, ..
            } => self.on_down(ctx, *position, *button),
            PointerEvent::Move { position, .. } => self.on_move(ctx, *position),
            PointerEvent::Up { position, .. } => self.on_up(ctx, *position),
            PointerEvent::DoubleClick { position, .. } => {
                if self.kind() != InteractionKind::Idle {
                    return false;
                }
                let world = ctx.viewport.to_world(*position);
                self.on_double_click(ctx, world)
            }
            PointerEvent::Wheel {
                position, delta, ..
            } => self.on_wheel(ctx, *position, *delta),
            PointerEvent::Leave | PointerEvent::Cancel => self.cancel(ctx),
        }
    }

    fn on_down(&mut self, ctx: &mut InteractionContext<'_>, screen: Point, button: MouseButton) -> bool {
        if self.kind() != InteractionKind::Idle {
            return false;
        }
        let modifiers = self.input.modifiers;
        let world = ctx.viewport.to_world(screen);

        let pan = button == MouseButton::Middle
            || (button == MouseButton::Left
                && (self.tool == ToolMode::Pan || self.input.is_space_held()));
        if pan {
            let start_offset = ctx.viewport.offset;
            self.transition(
                InteractionState::Panning {
                    start_screen: screen,
                    start_offset,
                },
                ctx.events,
            );
            return true;
        }
        if button != MouseButton::Left {
            return false;
        }

        let editable = !ctx.config.readonly;
        let tol = ctx.tolerances();

        if editable && self.input.is_double_click() && self.on_double_click(ctx, world) {
            return true;
        }
        if editable && modifiers.alt && self.alt_edit(ctx, world, tol) {
            return true;
        }
        if editable && self.tool == ToolMode::Select && self.grab_endpoint(ctx, world, tol) {
            return true;
        }

        if editable && self.tool == ToolMode::Connect {
            if let Some(port) = ctx.selection.find_nearest_port(ctx.diagram, world, tol.port, None) {
                self.start_connect(ctx, port.node_id, port.port_id, port.position);
                return true;
            }
        }

        match ctx.selection.hit_test(ctx.diagram, world, tol) {
            Hit::Port {
                node_id,
                port_id,
                position,
            } => {
                let intent = editable
                    && ctx
                        .diagram
                        .node(&node_id)
                        .and_then(|n| n.port(&port_id))
                        .is_some_and(|p| p.connectable && p.has_capacity());
                if intent {
                    self.start_connect(ctx, node_id, port_id, position);
                } else {
                    self.press_node(ctx, node_id, world);
                }
                true
            }
            Hit::Waypoint { edge_id, index, position } => {
                if !ctx.selection.is_edge_selected(&edge_id) {
                    ctx.select_one(SelectionItem::Edge(edge_id.clone()), SelectionMode::Replace);
                }
                if !editable {
                    return true;
                }
                let original = ctx
                    .diagram
                    .edge(&edge_id)
                    .map(|e| e.waypoints().to_vec())
                    .unwrap_or_default();
                self.transition(
                    InteractionState::DraggingWaypoint {
                        edge_id,
                        index,
                        start_world: world,
                        origin: position,
                        original,
                    },
                    ctx.events,
                );
                true
            }
            Hit::ControlPoint { edge_id, index, position } => {
                if !ctx.selection.is_edge_selected(&edge_id) {
                    ctx.select_one(SelectionItem::Edge(edge_id.clone()), SelectionMode::Replace);
                }
                if !editable {
                    return true;
                }
                let Some(edge) = ctx.diagram.edge_mut(&edge_id) else {
                    return false;
                };
                let original = match &edge.kind {
                    EdgeKind::Bezier {
                        custom_control_points,
                    } => custom_control_points.clone(),
                    _ => Vec::new(),
                };
                if original.is_empty() {
                    // Derived points become custom once grabbed.
                    let effective = edge.control_points();
                    edge.set_custom_control_points(effective);
                }
                self.transition(
                    InteractionState::DraggingControlPoint {
                        edge_id,
                        index,
                        start_world: world,
                        origin: position,
                        original,
                    },
                    ctx.events,
                );
                true
            }
            Hit::EdgePath { edge_id, .. } => {
                let mode = if modifiers.is_additive() {
                    SelectionMode::Toggle
                } else {
                    SelectionMode::Replace
                };
                ctx.select_one(SelectionItem::Edge(edge_id), mode);
                true
            }
            Hit::Node { node_id } => {
                self.press_node(ctx, node_id, world);
                true
            }
            Hit::Empty => {
                let additive = modifiers.is_additive();
                if !additive && !ctx.selection.is_empty() {
                    ctx.selection.clear();
                    ctx.emit_selection();
                }
                self.transition(
                    InteractionState::RectSelecting {
                        start_world: world,
                        current_world: world,
                        additive,
                    },
                    ctx.events,
                );
                true
            }
        }
    }

    fn press_node(&mut self, ctx: &mut InteractionContext<'_>, node_id: NodeId, world: Point) {
        if self.input.modifiers.is_additive() {
            ctx.select_one(SelectionItem::Node(node_id), SelectionMode::Toggle);
            return;
        }
        if !ctx.selection.is_node_selected(&node_id) {
            ctx.select_one(SelectionItem::Node(node_id), SelectionMode::Replace);
        }
        if ctx.config.readonly {
            return;
        }
        let originals: Vec<(NodeId, Point)> = ctx
            .selection
            .selected_nodes()
            .iter()
            .filter_map(|id| ctx.diagram.node(id))
            .filter(|n| n.draggable)
            .map(|n| (n.id.clone(), n.position))
            .collect();
        if originals.is_empty() {
            return;
        }
        self.transition(
            InteractionState::DraggingNode {
                start_world: world,
                originals,
                delta: Vec2::ZERO,
            },
            ctx.events,
        );
    }

    fn start_connect(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        node_id: NodeId,
        port_id: PortId,
        position: Point,
    ) {
        ctx.events.emit(&EditorEvent::ConnectStart {
            node_id: node_id.clone(),
            port_id: port_id.clone(),
            point: position,
        });
        self.transition(
            InteractionState::DrawingEdge {
                source_node: node_id,
                source_port: port_id,
                start: position,
                current: position,
                target: None,
            },
            ctx.events,
        );
    }

    /// Press on either end of a selected edge: start dragging that end.
    fn grab_endpoint(&mut self, ctx: &mut InteractionContext<'_>, world: Point, tol: HitTolerances) -> bool {
        let grabbed = ctx
            .selection
            .selectable_edges(ctx.diagram)
            .filter(|e| ctx.selection.is_edge_selected(&e.id))
            .find_map(|edge| {
                let points = &edge.path()?.points;
                let (first, last) = (*points.first()?, *points.last()?);
                let near = |p: Point| (p - world).hypot() <= tol.handle;
                if near(first) {
                    Some((edge.id.clone(), EdgeEnd::Source, edge.target.clone(), last))
                } else if near(last) {
                    Some((edge.id.clone(), EdgeEnd::Target, edge.source.clone(), first))
                } else {
                    None
                }
            });
        let Some((edge_id, end, anchor_node, fixed)) = grabbed else {
            return false;
        };
        ctx.events.emit(&EditorEvent::ReconnectStart {
            edge_id: edge_id.clone(),
            end,
        });
        self.transition(
            InteractionState::ReconnectingEndpoint {
                edge_id,
                end,
                anchor_node,
                fixed,
                current: world,
                target: None,
            },
            ctx.events,
        );
        true
    }

    /// Alt+press: remove a waypoint under the pointer, else insert one on an
    /// orthogonal segment.
    fn alt_edit(&mut self, ctx: &mut InteractionContext<'_>, world: Point, tol: HitTolerances) -> bool {
        let edges: Vec<EdgeId> = ctx
            .selection
            .selectable_edges(ctx.diagram)
            .filter(|e| matches!(e.kind, EdgeKind::Orthogonal { .. }))
            .map(|e| e.id.clone())
            .collect();

        for id in &edges {
            let Some(edge) = ctx.diagram.edge_mut(id) else {
                continue;
            };
            if let Some(index) = edge.hit_test_waypoint(world, tol.handle) {
                edge.remove_waypoint(index);
                ctx.events.emit(&EditorEvent::EdgeWaypointRemove {
                    edge_id: id.clone(),
                    index,
                });
                return true;
            }
        }
        self.insert_waypoint_at(ctx, &edges, world, tol.handle)
    }

    fn insert_waypoint_at(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        edges: &[EdgeId],
        world: Point,
        tolerance: f64,
    ) -> bool {
        for id in edges {
            let Some(edge) = ctx.diagram.edge_mut(id) else {
                continue;
            };
            let Some(hit) = edge.closest_segment(world, tolerance) else {
                continue;
            };
            if let Some(index) = edge.insert_waypoint(hit.index, hit.point) {
                ctx.events.emit(&EditorEvent::EdgeWaypointInsert {
                    edge_id: id.clone(),
                    index,
                    point: hit.point,
                });
                return true;
            }
        }
        false
    }

    /// Double click: clear custom Bezier control points when on a control
    /// handle, otherwise insert a waypoint on an orthogonal segment.
    fn on_double_click(&mut self, ctx: &mut InteractionContext<'_>, world: Point) -> bool {
        if ctx.config.readonly {
            return false;
        }
        let tol = ctx.tolerances();
        match ctx.selection.hit_test(ctx.diagram, world, tol) {
            Hit::ControlPoint { edge_id, .. } => {
                if let Some(edge) = ctx.diagram.edge_mut(&edge_id) {
                    edge.clear_custom_control_points();
                }
                ctx.events.emit(&EditorEvent::EdgeControlClear { edge_id });
                true
            }
            Hit::Waypoint { .. } | Hit::Port { .. } => false,
            _ => {
                let edges: Vec<EdgeId> = ctx
                    .selection
                    .selectable_edges(ctx.diagram)
                    .filter(|e| matches!(e.kind, EdgeKind::Orthogonal { .. }))
                    .map(|e| e.id.clone())
                    .collect();
                self.insert_waypoint_at(ctx, &edges, world, tol.handle)
            }
        }
    }

    fn on_move(&mut self, ctx: &mut InteractionContext<'_>, screen: Point) -> bool {
        let world = ctx.viewport.to_world(screen);
        let snapped = ctx.snapping.is_enabled().then(|| ctx.snapping.snap(world));
        self.cursor = Some((world, snapped));
        ctx.events.emit(&EditorEvent::CursorMove { world, snapped });

        let shift = self.input.modifiers.shift;
        let mut guides = None;
        let redraw = match &mut self.state {
            InteractionState::Idle => false,
            InteractionState::Panning {
                start_screen,
                start_offset,
            } => {
                let scale = ctx.viewport.zoom();
                ctx.viewport.offset = *start_offset + (screen - *start_screen) / scale;
                ctx.events.emit(&EditorEvent::CanvasPan {
                    offset: ctx.viewport.offset,
                });
                true
            }
            InteractionState::DraggingNode {
                start_world,
                originals,
                delta,
            } => {
                let mut step = ctx.snapping.snap_vec(world - *start_world);
                if ctx.config.show_guides && originals.len() == 1 {
                    let (id, origin) = &originals[0];
                    if let Some(node) = ctx.diagram.node(id) {
                        let moving = Rect::from_origin_size(*origin + step, node.size);
                        let others: Vec<Rect> = ctx
                            .diagram
                            .nodes_ordered()
                            .filter(|n| n.id != *id)
                            .map(|n| n.bounds())
                            .collect();
                        let alignment = ctx.snapping.align_to_nodes(
                            moving,
                            &others,
                            ctx.config.alignment_tolerance,
                        );
                        step += alignment.adjustment;
                        guides = Some(alignment.guides);
                    }
                }
                *delta = step;
                for (id, origin) in originals.iter() {
                    if let Some(node) = ctx.diagram.node_mut(id) {
                        node.set_position(*origin + step);
                    }
                    ctx.diagram.refresh_paths_for_node(id);
                }
                ctx.events.emit(&EditorEvent::NodeDrag {
                    ids: originals.iter().map(|(id, _)| id.clone()).collect(),
                    delta: step,
                });
                true
            }
            InteractionState::DraggingWaypoint {
                edge_id,
                index,
                start_world,
                origin,
                ..
            } => {
                let mut target = *origin + ctx.snapping.snap_vec(world - *start_world);
                if shift {
                    target = lock_axis(*origin, target);
                }
                if let Some(edge) = ctx.diagram.edge_mut(edge_id) {
                    edge.move_waypoint(*index, target);
                    ctx.events.emit(&EditorEvent::EdgeWaypointDrag {
                        edge_id: edge_id.clone(),
                        waypoints: edge.waypoints().to_vec(),
                        index: *index,
                    });
                }
                true
            }
            InteractionState::DraggingControlPoint {
                edge_id,
                index,
                start_world,
                origin,
                ..
            } => {
                let mut target = *origin + ctx.snapping.snap_vec(world - *start_world);
                if shift {
                    target = lock_axis(*origin, target);
                }
                if let Some(edge) = ctx.diagram.edge_mut(edge_id) {
                    edge.move_control_point(*index, target);
                    ctx.events.emit(&EditorEvent::EdgeControlDrag {
                        edge_id: edge_id.clone(),
                        control_points: edge.control_points(),
                        index: *index,
                    });
                }
                true
            }
            InteractionState::DrawingEdge {
                source_node,
                current,
                target,
                ..
            } => {
                *current = world;
                *target = find_free_port(ctx, world, source_node, EdgeEnd::Target);
                ctx.events.emit(&EditorEvent::ConnectPreview {
                    point: world,
                    target: target
                        .as_ref()
                        .map(|t| (t.node_id.clone(), t.port_id.clone())),
                });
                true
            }
            InteractionState::ReconnectingEndpoint {
                edge_id,
                end,
                anchor_node,
                fixed,
                current,
                target,
            } => {
                *current = world;
                *target = find_free_port(ctx, world, anchor_node, *end);
                ctx.events.emit(&EditorEvent::ReconnectPreview {
                    edge_id: edge_id.clone(),
                    end: *end,
                    point: world,
                    fixed: *fixed,
                    target: target
                        .as_ref()
                        .map(|t| (t.node_id.clone(), t.port_id.clone())),
                });
                true
            }
            InteractionState::RectSelecting { current_world, .. } => {
                *current_world = world;
                true
            }
        };
        if let Some(guides) = guides {
            self.set_guides(guides, ctx.events);
        }
        redraw
    }

    fn on_up(&mut self, ctx: &mut InteractionContext<'_>, screen: Point) -> bool {
        let world = ctx.viewport.to_world(screen);
        let state = std::mem::take(&mut self.state);
        if matches!(state, InteractionState::Idle) {
            return false;
        }
        match state {
            InteractionState::Idle | InteractionState::Panning { .. } => {}
            InteractionState::DraggingNode {
                originals, delta, ..
            } => {
                self.set_guides(Vec::new(), ctx.events);
                ctx.events.emit(&EditorEvent::NodeDragEnd {
                    ids: originals.into_iter().map(|(id, _)| id).collect(),
                    delta,
                });
            }
            InteractionState::DraggingWaypoint { edge_id, index, .. } => {
                let waypoints = ctx
                    .diagram
                    .edge(&edge_id)
                    .map(|e| e.waypoints().to_vec())
                    .unwrap_or_default();
                ctx.events.emit(&EditorEvent::EdgeWaypointDragEnd {
                    edge_id,
                    waypoints,
                    index,
                });
            }
            InteractionState::DraggingControlPoint { edge_id, index, .. } => {
                let control_points = ctx
                    .diagram
                    .edge(&edge_id)
                    .map(|e| e.control_points())
                    .unwrap_or_default();
                ctx.events.emit(&EditorEvent::EdgeControlDragEnd {
                    edge_id,
                    control_points,
                    index,
                });
            }
            InteractionState::DrawingEdge {
                source_node,
                source_port,
                ..
            } => {
                match find_free_port(ctx, world, &source_node, EdgeEnd::Target) {
                    Some(target) => commit_edge(ctx, source_node, source_port, target),
                    None => ctx.events.emit(&EditorEvent::ConnectCancel),
                }
            }
            InteractionState::ReconnectingEndpoint {
                edge_id,
                end,
                anchor_node,
                ..
            } => match find_free_port(ctx, world, &anchor_node, end) {
                Some(target) => commit_reconnect(ctx, edge_id, end, target),
                None => ctx.events.emit(&EditorEvent::ReconnectCancel { edge_id, end }),
            },
            InteractionState::RectSelecting {
                start_world,
                additive,
                ..
            } => {
                let rect = Rect::from_points(start_world, world);
                if rect.width() > CLICK_SLOP || rect.height() > CLICK_SLOP {
                    let mode = if additive {
                        SelectionMode::Add
                    } else {
                        SelectionMode::Replace
                    };
                    ctx.selection.select_in_rect(ctx.diagram, rect, mode);
                    ctx.emit_selection();
                }
            }
        }
        ctx.events.emit(&EditorEvent::ModeChange {
            state: InteractionKind::Idle,
            tool: self.tool,
        });
        true
    }

    fn on_wheel(&mut self, ctx: &mut InteractionContext<'_>, screen: Point, delta: Vec2) -> bool {
        if delta.y == 0.0 {
            return false;
        }
        let step = ctx.config.wheel_zoom_step;
        let factor = if delta.y < 0.0 { step } else { 1.0 / step };
        let before = ctx.viewport.zoom();
        ctx.viewport.zoom_at(screen, factor);
        if (ctx.viewport.zoom() - before).abs() < f64::EPSILON {
            return false;
        }
        ctx.events.emit(&EditorEvent::CanvasZoom {
            scale: ctx.viewport.zoom(),
        });
        true
    }

    /// Abandon the current gesture, restoring anything it moved.
    pub fn cancel(&mut self, ctx: &mut InteractionContext<'_>) -> bool {
        let state = std::mem::take(&mut self.state);
        let was = state.kind();
        match state {
            InteractionState::Idle => return false,
            InteractionState::Panning { .. } | InteractionState::RectSelecting { .. } => {}
            InteractionState::DraggingNode { originals, .. } => {
                for (id, origin) in &originals {
                    if let Some(node) = ctx.diagram.node_mut(id) {
                        node.set_position(*origin);
                    }
                    ctx.diagram.refresh_paths_for_node(id);
                }
                self.set_guides(Vec::new(), ctx.events);
            }
            InteractionState::DraggingWaypoint {
                edge_id, original, ..
            } => {
                if let Some(edge) = ctx.diagram.edge_mut(&edge_id) {
                    edge.set_waypoints(original);
                }
            }
            InteractionState::DraggingControlPoint {
                edge_id, original, ..
            } => {
                if let Some(edge) = ctx.diagram.edge_mut(&edge_id) {
                    edge.set_custom_control_points(original);
                }
            }
            InteractionState::DrawingEdge { .. } => {
                ctx.events.emit(&EditorEvent::ConnectCancel);
            }
            InteractionState::ReconnectingEndpoint { edge_id, end, .. } => {
                ctx.events.emit(&EditorEvent::ReconnectCancel { edge_id, end });
            }
        }
        log::debug!("Cancelled {:?}", was);
        ctx.events.emit(&EditorEvent::ModeChange {
            state: InteractionKind::Idle,
            tool: self.tool,
        });
        true
    }

    /// Feed one key event. Returns `true` if a redraw is needed.
    pub fn handle_key(&mut self, ctx: &mut InteractionContext<'_>, event: &KeyEvent) -> bool {
        self.input.handle_key_event(event);
        let KeyEvent::Pressed { key, modifiers } = event else {
            return false;
        };
        match key {
            Key::Escape => {
                let cancelled = self.cancel(ctx);
                let had_selection = !ctx.selection.is_empty();
                if had_selection {
                    ctx.selection.clear();
                    ctx.emit_selection();
                }
                cancelled || had_selection
            }
            Key::Delete | Key::Backspace => {
                if ctx.config.readonly || ctx.selection.is_empty() {
                    return false;
                }
                ctx.events.emit(&EditorEvent::DeleteRequest {
                    nodes: ctx.selection.selected_nodes().to_vec(),
                    edges: ctx.selection.selected_edges().to_vec(),
                });
                false
            }
            Key::Char(c) if modifiers.command() && c.eq_ignore_ascii_case(&'a') => {
                ctx.selection.select_all(ctx.diagram);
                ctx.emit_selection();
                true
            }
            _ => false,
        }
    }
}

/// Nearest free port on a node other than `exclude_node` that can hold the
/// given end of an edge.
fn find_free_port(
    ctx: &InteractionContext<'_>,
    world: Point,
    exclude_node: &str,
    end: EdgeEnd,
) -> Option<PortMatch> {
    let tol = ctx.tolerances();
    ctx.selection
        .find_nearest_port(ctx.diagram, world, tol.port, Some(exclude_node))
        .filter(|m| {
            ctx.diagram
                .node(&m.node_id)
                .and_then(|n| n.port(&m.port_id))
                .is_some_and(|p| match end {
                    EdgeEnd::Source => p.direction.accepts_outgoing(),
                    EdgeEnd::Target => p.direction.accepts_incoming(),
                })
        })
}

fn commit_reconnect(ctx: &mut InteractionContext<'_>, edge_id: EdgeId, end: EdgeEnd, target: PortMatch) {
    match ctx
        .diagram
        .reconnect_edge(&edge_id, end, &target.node_id, Some(&target.port_id))
    {
        Ok(()) => ctx.events.emit(&EditorEvent::ReconnectEnd {
            edge_id,
            end,
            node_id: target.node_id,
            port_id: target.port_id,
        }),
        Err(err) => {
            log::warn!("Reconnection rejected: {err}");
            ctx.events.emit(&EditorEvent::ReconnectCancel { edge_id, end });
        }
    }
}

fn commit_edge(ctx: &mut InteractionContext<'_>, source_node: NodeId, source_port: PortId, target: PortMatch) {
    let data = EdgeData::new(source_node.clone(), target.node_id.clone())
        .with_ports(source_port.clone(), target.port_id.clone());
    let created = ctx
        .edge_factory
        .create_edge(&ctx.config.default_edge_type, data)
        .and_then(|edge| {
            let id = edge.id.clone();
            ctx.diagram.add_edge(edge).map(|_| id)
        });
    match created {
        Ok(edge_id) => {
            ctx.events.emit(&EditorEvent::ConnectEnd {
                edge_id: edge_id.clone(),
                source: (source_node, source_port),
                target: (target.node_id, target.port_id),
            });
            ctx.events.emit(&EditorEvent::EdgeAdded { id: edge_id });
        }
        Err(err) => {
            log::warn!("Connection rejected: {err}");
            ctx.events.emit(&EditorEvent::ConnectCancel);
        }
    }
}
