//! Renderer that paints the diagram through a [`DrawingSurface`].

use std::f64::consts::TAU;

use flowchart_core::edge::{ArrowKind, Edge, EdgeKind};
use flowchart_core::interaction::ProvisionalEdge;
use flowchart_core::node::Node;
use flowchart_core::selection::{HandleKind, edge_handles};
use flowchart_core::snap::Guide;
use flowchart_core::text::TextMeasure;
use kurbo::{Point, Rect, Vec2};
use peniko::Color;

use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
use crate::surface::{DrawingSurface, TextAlign};

/// Grids denser than this many screen pixels per cell are not drawn.
const MIN_GRID_SCREEN_SPACING: f64 = 4.0;

/// Line height as a multiple of font size.
const LINE_HEIGHT: f64 = 1.2;

fn guide_color() -> Color {
    Color::from_rgba8(236, 72, 153, 180)
}

/// Lets a surface stand in where a plain [`TextMeasure`] is expected.
struct SurfaceMeasure<'a>(&'a dyn DrawingSurface);

impl TextMeasure for SurfaceMeasure<'_> {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.0.measure_text(text, font_size)
    }
}

/// Paints grid, edges, nodes and interaction overlays.
///
/// Overlay sizes are given in screen pixels and divided by the zoom so they
/// keep a constant on-screen size.
#[derive(Debug, Clone)]
pub struct CanvasRenderer {
    zoom: f64,
    /// Arrow length in world units.
    pub arrow_size: f64,
    pub port_radius: f64,
    pub handle_size: f64,
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            arrow_size: 10.0,
            port_radius: 4.0,
            handle_size: 8.0,
        }
    }
}

impl CanvasRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn px(&self, screen_pixels: f64) -> f64 {
        screen_pixels / self.zoom
    }

    fn grid_bounds(visible: Rect, grid_size: f64) -> (f64, f64, f64, f64) {
        (
            (visible.x0 / grid_size).floor() * grid_size,
            (visible.y0 / grid_size).floor() * grid_size,
            (visible.x1 / grid_size).ceil() * grid_size,
            (visible.y1 / grid_size).ceil() * grid_size,
        )
    }

    fn render_grid(&self, surface: &mut dyn DrawingSurface, style: GridStyle, visible: Rect, grid_size: f64) {
        if style == GridStyle::None || !(grid_size > 0.0) || grid_size * self.zoom < MIN_GRID_SCREEN_SPACING {
            return;
        }
        let (start_x, start_y, end_x, end_y) = Self::grid_bounds(visible, grid_size);
        surface.save();
        match style {
            GridStyle::None => {}
            GridStyle::Lines => {
                surface.set_stroke_color(Color::from_rgba8(200, 200, 200, 100));
                surface.set_line_width(self.px(0.5));
                surface.begin_path();
                let mut x = start_x;
                while x <= end_x {
                    surface.move_to(Point::new(x, start_y));
                    surface.line_to(Point::new(x, end_y));
                    x += grid_size;
                }
                let mut y = start_y;
                while y <= end_y {
                    surface.move_to(Point::new(start_x, y));
                    surface.line_to(Point::new(end_x, y));
                    y += grid_size;
                }
                surface.stroke();
            }
            GridStyle::Dots => {
                surface.set_fill_color(Color::from_rgba8(160, 160, 160, 70));
                let half = self.px(1.5);
                let mut x = start_x;
                while x <= end_x {
                    let mut y = start_y;
                    while y <= end_y {
                        surface.fill_rect(Rect::new(x - half, y - half, x + half, y + half));
                        y += grid_size;
                    }
                    x += grid_size;
                }
            }
            GridStyle::Crosses => {
                surface.set_stroke_color(Color::from_rgba8(180, 180, 180, 60));
                surface.set_line_width(self.px(1.0));
                let arm = self.px(3.0);
                surface.begin_path();
                let mut x = start_x;
                while x <= end_x {
                    let mut y = start_y;
                    while y <= end_y {
                        surface.move_to(Point::new(x - arm, y));
                        surface.line_to(Point::new(x + arm, y));
                        surface.move_to(Point::new(x, y - arm));
                        surface.line_to(Point::new(x, y + arm));
                        y += grid_size;
                    }
                    x += grid_size;
                }
                surface.stroke();
            }
        }
        surface.restore();
    }

    fn render_edge(&self, surface: &mut dyn DrawingSurface, edge: &Edge, selected: bool) {
        let Some(path) = edge.path() else {
            return;
        };
        if path.points.len() < 2 {
            return;
        }
        let style = &edge.style;
        let color: Color = if selected {
            style.selected_stroke
        } else {
            style.stroke
        }
        .into();

        surface.save();
        surface.set_stroke_color(color);
        surface.set_fill_color(color);
        surface.set_line_width(style.stroke_width);
        surface.set_line_dash(&style.stroke_style.dash_pattern(style.stroke_width));

        match (&edge.kind, edge.endpoints()) {
            (EdgeKind::Bezier { .. }, Some((start, end))) => {
                match edge.control_points().as_slice() {
                    [c1, c2] => {
                        surface.begin_path();
                        surface.move_to(start);
                        surface.bezier_curve_to(*c1, *c2, end);
                    }
                    [c] => {
                        surface.begin_path();
                        surface.move_to(start);
                        surface.quadratic_curve_to(*c, end);
                    }
                    // Higher orders have no native primitive; draw the sampled cache.
                    _ => surface.trace_polyline(&path.points),
                }
            }
            _ => surface.trace_polyline(&path.points),
        }
        surface.stroke();
        surface.set_line_dash(&[]);

        if let Some(end) = path.end() {
            self.render_arrow(surface, edge.end_arrow, end, edge.tangent_at(1.0));
        }
        if let Some(start) = path.start() {
            self.render_arrow(surface, edge.start_arrow, start, -edge.tangent_at(0.0));
        }
        self.render_edge_labels(surface, edge);
        surface.restore();
    }

    /// Draw an arrow whose tip sits at `position`, pointing along `direction`.
    fn render_arrow(&self, surface: &mut dyn DrawingSurface, kind: ArrowKind, position: Point, direction: Vec2) {
        if kind == ArrowKind::None {
            return;
        }
        let size = self.arrow_size;
        surface.save();
        surface.translate(position.to_vec2());
        surface.rotate(direction.y.atan2(direction.x));
        surface.begin_path();
        match kind {
            ArrowKind::None => {}
            ArrowKind::Arrow => {
                surface.move_to(Point::ZERO);
                surface.line_to(Point::new(-size, -size / 2.0));
                surface.move_to(Point::ZERO);
                surface.line_to(Point::new(-size, size / 2.0));
            }
            ArrowKind::FilledArrow => {
                surface.move_to(Point::ZERO);
                surface.line_to(Point::new(-size, -size / 2.0));
                surface.line_to(Point::new(-size * 0.7, 0.0));
                surface.line_to(Point::new(-size, size / 2.0));
                surface.close_path();
            }
            ArrowKind::Circle | ArrowKind::FilledCircle => {
                surface.arc(Point::new(-size / 2.0, 0.0), size / 4.0, 0.0, TAU);
            }
            ArrowKind::Diamond | ArrowKind::FilledDiamond => {
                surface.move_to(Point::ZERO);
                surface.line_to(Point::new(-size / 2.0, -size / 4.0));
                surface.line_to(Point::new(-size, 0.0));
                surface.line_to(Point::new(-size / 2.0, size / 4.0));
                surface.close_path();
            }
        }
        if kind.is_filled() {
            surface.fill();
        }
        surface.stroke();
        surface.restore();
    }

    fn render_edge_labels(&self, surface: &mut dyn DrawingSurface, edge: &Edge) {
        let style = &edge.style;
        for label in edge.labels.iter().filter(|l| !l.text.is_empty()) {
            let position = edge.point_at(label.position) + label.offset;
            if label.background {
                let width = surface.measure_text(&label.text, style.font_size) + label.padding * 2.0;
                let height = style.font_size + label.padding * 2.0;
                let rect = Rect::from_center_size(position, (width, height));
                surface.set_fill_color(style.label_background.into());
                surface.fill_rect(rect);
                surface.set_stroke_color(Color::from_rgba8(0xcc, 0xcc, 0xcc, 255));
                surface.set_line_width(1.0);
                surface.stroke_rect(rect);
            }
            surface.set_font_size(style.font_size);
            surface.set_text_align(TextAlign::Center);
            surface.set_fill_color(style.label_color.into());
            surface.fill_text(&label.text, position);
        }
    }

    fn render_node(
        &self,
        surface: &mut dyn DrawingSurface,
        node: &Node,
        selected: bool,
        show_ports: bool,
        selection_color: Color,
    ) {
        let style = &node.style;
        surface.save();
        surface.set_global_alpha(style.opacity);

        surface.trace_path(&node.outline());
        surface.set_fill_color(style.fill.into());
        surface.fill();
        if selected {
            surface.set_stroke_color(selection_color);
            surface.set_line_width(style.stroke_width + self.px(1.0));
        } else {
            surface.set_stroke_color(style.stroke.into());
            surface.set_line_width(style.stroke_width);
        }
        surface.stroke();

        let lines = node.label_lines(&SurfaceMeasure(&*surface));
        let line_height = style.font_size * LINE_HEIGHT;
        let center = node.center();
        let first_y = center.y - line_height * (lines.len() as f64 - 1.0) / 2.0;
        surface.set_font_size(style.font_size);
        surface.set_text_align(TextAlign::Center);
        surface.set_fill_color(style.text_color.into());
        for (i, line) in lines.iter().enumerate().filter(|(_, l)| !l.is_empty()) {
            surface.fill_text(line, Point::new(center.x, first_y + i as f64 * line_height));
        }

        if show_ports {
            let bounds = node.bounds();
            surface.set_fill_color(Color::WHITE);
            surface.set_stroke_color(style.stroke.into());
            surface.set_line_width(self.px(1.0));
            for port in &node.ports {
                surface.begin_path();
                surface.arc(port.position(bounds), self.px(self.port_radius), 0.0, TAU);
                surface.fill();
                surface.stroke();
            }
        }
        surface.restore();
    }

    /// Waypoint squares, or control-point circles with their guide lines.
    fn render_edge_handles(&self, surface: &mut dyn DrawingSurface, edge: &Edge, color: Color) {
        let handles = edge_handles(edge);
        if handles.is_empty() {
            return;
        }
        let half = self.px(self.handle_size) / 2.0;
        surface.save();
        surface.set_line_width(self.px(1.5));
        surface.set_stroke_color(color);

        if let (EdgeKind::Bezier { .. }, Some((start, end))) = (&edge.kind, edge.endpoints()) {
            let controls = edge.control_points();
            if let (Some(first), Some(last)) = (controls.first(), controls.last()) {
                let dash = self.px(4.0);
                surface.set_line_dash(&[dash, dash]);
                surface.begin_path();
                surface.move_to(start);
                surface.line_to(*first);
                surface.move_to(end);
                surface.line_to(*last);
                surface.stroke();
                surface.set_line_dash(&[]);
            }
        }

        surface.set_fill_color(Color::WHITE);
        for handle in handles {
            match handle.kind {
                HandleKind::Waypoint(_) => {
                    let rect = Rect::from_center_size(handle.position, (half * 2.0, half * 2.0));
                    surface.fill_rect(rect);
                    surface.stroke_rect(rect);
                }
                HandleKind::ControlPoint(_) => {
                    surface.begin_path();
                    surface.arc(handle.position, half, 0.0, TAU);
                    surface.fill();
                    surface.stroke();
                }
            }
        }
        surface.restore();
    }

    fn render_provisional_edge(&self, surface: &mut dyn DrawingSurface, edge: &ProvisionalEdge, color: Color) {
        surface.save();
        surface.set_stroke_color(color);
        surface.set_line_width(self.px(2.0));
        let dash = self.px(6.0);
        surface.set_line_dash(&[dash, dash]);
        surface.trace_polyline(&[edge.from, edge.to]);
        surface.stroke();
        surface.set_line_dash(&[]);
        if let Some(target) = &edge.target {
            surface.begin_path();
            surface.arc(target.position, self.px(self.port_radius * 1.5), 0.0, TAU);
            surface.stroke();
        }
        surface.restore();
    }

    fn render_guides(&self, surface: &mut dyn DrawingSurface, guides: &[Guide]) {
        if guides.is_empty() {
            return;
        }
        surface.save();
        surface.set_stroke_color(guide_color());
        surface.set_line_width(self.px(1.0));
        surface.begin_path();
        for guide in guides {
            let (a, b) = guide.endpoints();
            surface.move_to(a);
            surface.line_to(b);
        }
        surface.stroke();
        surface.restore();
    }

    fn render_selection_rect(&self, surface: &mut dyn DrawingSurface, rect: Rect, color: Color) {
        surface.save();
        surface.set_fill_color(Color::from_rgba8(0x18, 0x90, 0xff, 25));
        surface.fill_rect(rect);
        let dash = self.px(4.0);
        surface.set_line_dash(&[dash, dash]);
        surface.set_line_width(self.px(1.0));
        surface.set_stroke_color(color);
        surface.stroke_rect(rect);
        surface.restore();
    }

    fn render_snap_point(&self, surface: &mut dyn DrawingSurface, point: Point) {
        let arm = self.px(4.0);
        surface.save();
        surface.set_stroke_color(guide_color());
        surface.set_line_width(self.px(1.0));
        surface.begin_path();
        surface.move_to(Point::new(point.x - arm, point.y));
        surface.line_to(Point::new(point.x + arm, point.y));
        surface.move_to(Point::new(point.x, point.y - arm));
        surface.line_to(Point::new(point.x, point.y + arm));
        surface.stroke();
        surface.restore();
    }
}

impl Renderer for CanvasRenderer {
    fn render(&mut self, ctx: &RenderContext, surface: &mut dyn DrawingSurface) -> RenderResult<()> {
        let size = ctx.canvas_size;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(RendererError::RenderFailed(format!(
                "invalid canvas size {}x{}",
                size.width, size.height
            )));
        }
        self.zoom = ctx.viewport.zoom();
        let diagram = ctx.diagram;

        surface.save();
        surface.set_fill_color(self.background_color(ctx));
        surface.fill_rect(Rect::from_origin_size(Point::ZERO, size));

        // screen = (world + offset) * scale
        surface.scale(self.zoom);
        surface.translate(ctx.viewport.offset);

        let visible = ctx.viewport.visible_world_rect(size);
        self.render_grid(surface, ctx.grid_style, visible, ctx.grid_size);

        let mut skipped = 0;
        for edge in diagram.edges_ordered() {
            if diagram.is_dangling(edge) || edge.path().is_none() {
                skipped += 1;
                continue;
            }
            self.render_edge(surface, edge, ctx.selection.is_edge_selected(&edge.id));
        }
        if skipped > 0 {
            log::trace!("Skipped {skipped} edges without geometry");
        }

        for node in diagram.nodes_ordered() {
            let selected = ctx.selection.is_node_selected(&node.id);
            self.render_node(surface, node, selected, ctx.show_ports, ctx.selection_color);
        }

        for id in ctx.selection.selected_edges() {
            if let Some(edge) = diagram.edge(id).filter(|e| !diagram.is_dangling(e)) {
                self.render_edge_handles(surface, edge, ctx.selection_color);
            }
        }

        if let Some(edge) = &ctx.provisional_edge {
            self.render_provisional_edge(surface, edge, ctx.selection_color);
        }
        self.render_guides(surface, &ctx.guides);
        if let Some(rect) = ctx.selection_rect {
            self.render_selection_rect(surface, rect, ctx.selection_color);
        }
        if let Some(point) = ctx.snap_point {
            self.render_snap_point(surface, point);
        }

        surface.restore();
        surface.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};
    use flowchart_core::diagram::Diagram;
    use flowchart_core::edge::EdgeLabel;
    use flowchart_core::node::NodeKind;
    use flowchart_core::selection::{SelectionItem, SelectionManager, SelectionMode};
    use flowchart_core::viewport::Viewport;
    use kurbo::Size;

    fn diagram_with_edge(kind: EdgeKind) -> Diagram {
        let mut diagram = Diagram::new();
        let mut a = Node::new("a", NodeKind::Process, Point::new(100.0, 100.0));
        a.label = "Approve invoice".into();
        diagram.add_node(a).unwrap();
        diagram
            .add_node(Node::new("b", NodeKind::Process, Point::new(300.0, 100.0)))
            .unwrap();
        let mut edge = Edge::new("e1", kind, "a", "b");
        edge.labels.push(EdgeLabel::new("yes"));
        diagram.add_edge(edge).unwrap();
        diagram
    }

    fn render(diagram: &Diagram, selection: &SelectionManager, grid: GridStyle) -> RecordingSurface {
        let viewport = Viewport::new();
        let ctx = RenderContext::new(diagram, &viewport, selection, Size::new(800.0, 600.0)).with_grid(grid);
        let mut surface = RecordingSurface::new();
        CanvasRenderer::new().render(&ctx, &mut surface).unwrap();
        surface
    }

    #[test]
    fn test_empty_canvas_paints_background() {
        let diagram = Diagram::new();
        let surface = render(&diagram, &SelectionManager::new(), GridStyle::None);
        assert_eq!(surface.commands()[0], DrawCommand::Save);
        assert!(matches!(surface.commands()[2], DrawCommand::FillRect(r) if r == Rect::new(0.0, 0.0, 800.0, 600.0)));
        assert_eq!(surface.depth(), 0);
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::MoveTo(_))), 0);
    }

    #[test]
    fn test_grid_lines_drawn() {
        let diagram = Diagram::new();
        let surface = render(&diagram, &SelectionManager::new(), GridStyle::Lines);
        // 800/20 + 1 vertical, 600/20 + 1 horizontal
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::MoveTo(_))), 41 + 31);
    }

    #[test]
    fn test_invalid_canvas_size() {
        let diagram = Diagram::new();
        let viewport = Viewport::new();
        let selection = SelectionManager::new();
        let ctx = RenderContext::new(&diagram, &viewport, &selection, Size::ZERO);
        let mut surface = RecordingSurface::new();
        let err = CanvasRenderer::new().render(&ctx, &mut surface);
        assert!(matches!(err, Err(RendererError::RenderFailed(_))));
    }

    #[test]
    fn test_labels_and_arrow() {
        let diagram = diagram_with_edge(EdgeKind::Straight);
        let surface = render(&diagram, &SelectionManager::new(), GridStyle::None);
        let texts = surface.texts();
        assert!(texts.contains(&"yes"));
        assert!(texts.contains(&"Approve"));
        assert!(texts.contains(&"Process"));
        // Only the end arrow, pointing along +x.
        let rotations: Vec<f64> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rotate(r) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(rotations.len(), 1);
        assert!(rotations[0].abs() < 1e-9);
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn test_dangling_edge_skipped() {
        let mut diagram = diagram_with_edge(EdgeKind::Straight);
        diagram.remove_node("b");
        let surface = render(&diagram, &SelectionManager::new(), GridStyle::None);
        assert!(!surface.texts().contains(&"yes"));
    }

    #[test]
    fn test_bezier_draws_curve_and_handles_when_selected() {
        let diagram = diagram_with_edge(EdgeKind::Bezier {
            custom_control_points: Vec::new(),
        });
        let mut selection = SelectionManager::new();
        let plain = render(&diagram, &selection, GridStyle::None);
        let target = Point::new(300.0, 130.0);
        assert_eq!(
            plain.count(|c| matches!(c, DrawCommand::BezierCurveTo(_, _, p) if *p == target)),
            1
        );

        selection.select([SelectionItem::Edge("e1".into())], SelectionMode::Replace);
        let selected = render(&diagram, &selection, GridStyle::None);
        let arcs = |s: &RecordingSurface| s.count(|c| matches!(c, DrawCommand::Arc { .. }));
        assert_eq!(arcs(&selected), arcs(&plain) + 2);
    }

    #[test]
    fn test_higher_order_bezier_follows_cached_curve() {
        let diagram = diagram_with_edge(EdgeKind::Bezier {
            custom_control_points: vec![
                Point::new(240.0, 330.0),
                Point::new(260.0, -70.0),
                Point::new(280.0, 330.0),
            ],
        });
        let edge = diagram.edge("e1").unwrap();
        let (start, end) = edge.endpoints().unwrap();
        let mid = edge.path().unwrap().points[16];
        assert!((mid.y - 130.0).abs() > 1.0);

        let surface = render(&diagram, &SelectionManager::new(), GridStyle::None);
        let chord = surface
            .commands()
            .windows(2)
            .any(|w| w[0] == DrawCommand::MoveTo(start) && w[1] == DrawCommand::LineTo(end));
        assert!(!chord);
        assert_eq!(surface.count(|c| *c == DrawCommand::LineTo(mid)), 1);
    }

    #[test]
    fn test_waypoint_handles() {
        let diagram = diagram_with_edge(EdgeKind::Orthogonal {
            waypoints: vec![Point::new(260.0, 60.0), Point::new(260.0, 200.0)],
        });
        let mut selection = SelectionManager::new();
        selection.select([SelectionItem::Edge("e1".into())], SelectionMode::Replace);
        let surface = render(&diagram, &selection, GridStyle::None);
        // two waypoints plus the label background
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::StrokeRect(_))), 3);
    }

    #[test]
    fn test_overlays() {
        let diagram = Diagram::new();
        let viewport = Viewport::new();
        let selection = SelectionManager::new();
        let ctx = RenderContext::new(&diagram, &viewport, &selection, Size::new(400.0, 300.0))
            .with_grid(GridStyle::None)
            .with_selection_rect(Some(Rect::new(10.0, 10.0, 50.0, 50.0)))
            .with_provisional_edge(Some(ProvisionalEdge {
                from: Point::ZERO,
                to: Point::new(30.0, 40.0),
                target: None,
            }));
        let mut surface = RecordingSurface::new();
        CanvasRenderer::new().render(&ctx, &mut surface).unwrap();
        assert!(surface
            .commands()
            .contains(&DrawCommand::StrokeRect(Rect::new(10.0, 10.0, 50.0, 50.0))));
        assert!(surface.commands().contains(&DrawCommand::LineTo(Point::new(30.0, 40.0))));
    }

    #[test]
    fn test_overlay_sizes_follow_zoom() {
        let diagram = diagram_with_edge(EdgeKind::Straight);
        let mut viewport = Viewport::new();
        viewport.set_zoom(2.0);
        let selection = SelectionManager::new();
        let ctx = RenderContext::new(&diagram, &viewport, &selection, Size::new(800.0, 600.0))
            .with_grid(GridStyle::None);
        let mut surface = RecordingSurface::new();
        CanvasRenderer::new().render(&ctx, &mut surface).unwrap();
        assert!(surface.commands().contains(&DrawCommand::Scale(2.0)));
        let port_radius = surface.commands().iter().find_map(|c| match c {
            DrawCommand::Arc { radius, .. } => Some(*radius),
            _ => None,
        });
        assert_eq!(port_radius, Some(2.0));
    }
}
