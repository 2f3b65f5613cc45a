//! Renderer trait abstraction.

use flowchart_core::diagram::Diagram;
use flowchart_core::editor::FlowchartEditor;
use flowchart_core::interaction::ProvisionalEdge;
use flowchart_core::selection::SelectionManager;
use flowchart_core::snap::Guide;
use flowchart_core::viewport::Viewport;
use kurbo::{Point, Rect, Size};
use peniko::Color;
use thiserror::Error;

use crate::surface::DrawingSurface;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid (plain background).
    None,
    /// Full grid lines.
    #[default]
    Lines,
    /// Only corner dots (.).
    Dots,
    /// Only corner crosses (+).
    Crosses,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Dots,
            GridStyle::Dots => GridStyle::Crosses,
            GridStyle::Crosses => GridStyle::None,
        }
    }

    /// Get display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
            GridStyle::Dots => "Dots",
            GridStyle::Crosses => "Crosses",
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    pub diagram: &'a Diagram,
    pub viewport: &'a Viewport,
    pub selection: &'a SelectionManager,
    /// Canvas size in screen pixels.
    pub canvas_size: Size,
    pub background_color: Color,
    pub grid_style: GridStyle,
    /// World-unit spacing of the grid.
    pub grid_size: f64,
    pub selection_color: Color,
    /// Rubber band in world coordinates.
    pub selection_rect: Option<Rect>,
    pub guides: Vec<Guide>,
    pub provisional_edge: Option<ProvisionalEdge>,
    /// Snapped cursor position, drawn as a small marker.
    pub snap_point: Option<Point>,
    pub show_ports: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(
        diagram: &'a Diagram,
        viewport: &'a Viewport,
        selection: &'a SelectionManager,
        canvas_size: Size,
    ) -> Self {
        Self {
            diagram,
            viewport,
            selection,
            canvas_size,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: GridStyle::Lines,
            grid_size: 20.0,
            selection_color: Color::from_rgba8(0x18, 0x90, 0xff, 255),
            selection_rect: None,
            guides: Vec::new(),
            provisional_edge: None,
            snap_point: None,
            show_ports: true,
        }
    }

    /// Everything the editor currently has on screen.
    ///
    /// The grid follows the snap size so snapped positions land on lines.
    pub fn from_editor(editor: &'a FlowchartEditor) -> Self {
        let interaction = editor.interaction();
        let snap_point = interaction.cursor().and_then(|(_, snapped)| snapped);
        Self::new(
            editor.diagram(),
            editor.viewport(),
            editor.selection(),
            editor.canvas_size(),
        )
        .with_grid_size(editor.snapping().size())
        .with_selection_rect(interaction.rubber_band())
        .with_guides(interaction.guides().to_vec())
        .with_provisional_edge(interaction.provisional_edge())
        .with_snap_point(snap_point)
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    pub fn with_grid_size(mut self, size: f64) -> Self {
        self.grid_size = size;
        self
    }

    /// Set the selection rectangle.
    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    pub fn with_guides(mut self, guides: Vec<Guide>) -> Self {
        self.guides = guides;
        self
    }

    pub fn with_provisional_edge(mut self, edge: Option<ProvisionalEdge>) -> Self {
        self.provisional_edge = edge;
        self
    }

    /// Set the snap point for rendering the cursor marker.
    pub fn with_snap_point(mut self, point: Option<Point>) -> Self {
        self.snap_point = point;
        self
    }

    pub fn with_ports(mut self, show: bool) -> Self {
        self.show_ports = show;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Issue all drawing calls for one frame.
    fn render(&mut self, ctx: &RenderContext, surface: &mut dyn DrawingSurface) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowchart_core::config::EditorConfig;

    #[test]
    fn test_grid_style_cycle() {
        let mut style = GridStyle::default();
        let mut names = Vec::new();
        for _ in 0..4 {
            names.push(style.name());
            style = style.next();
        }
        assert_eq!(names, vec!["Lines", "Dots", "Crosses", "None"]);
        assert_eq!(style, GridStyle::Lines);
    }

    #[test]
    fn test_from_editor_picks_up_snap_size() {
        let mut editor = FlowchartEditor::new(EditorConfig::default()).unwrap();
        editor.cycle_snap_size();
        let ctx = RenderContext::from_editor(&editor);
        assert!((ctx.grid_size - 16.0).abs() < f64::EPSILON);
        assert!(ctx.selection_rect.is_none());
        assert!(ctx.provisional_edge.is_none());
        assert_eq!(ctx.canvas_size, Size::new(800.0, 600.0));
    }
}
