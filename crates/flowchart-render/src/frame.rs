//! Redraw coalescing.

use flowchart_core::editor::FlowchartEditor;

use crate::canvas_renderer::CanvasRenderer;
use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer};
use crate::surface::DrawingSurface;

/// Collapses any number of redraw requests between two animation frames
/// into a single paint.
#[derive(Debug, Clone)]
pub struct FrameScheduler<R = CanvasRenderer> {
    renderer: R,
    grid_style: GridStyle,
    pending: bool,
    frames_painted: u64,
}

impl Default for FrameScheduler<CanvasRenderer> {
    fn default() -> Self {
        Self::new(CanvasRenderer::new())
    }
}

impl<R: Renderer> FrameScheduler<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            grid_style: GridStyle::default(),
            pending: true,
            frames_painted: 0,
        }
    }

    /// Ask for a paint on the next frame.
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }

    pub fn grid_style(&self) -> GridStyle {
        self.grid_style
    }

    pub fn set_grid_style(&mut self, style: GridStyle) {
        if self.grid_style != style {
            self.grid_style = style;
            self.pending = true;
        }
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Paint if anything asked for it since the last frame.
    ///
    /// Returns `Ok(true)` when a frame was painted.
    pub fn on_animation_frame(
        &mut self,
        editor: &mut FlowchartEditor,
        surface: &mut dyn DrawingSurface,
    ) -> RenderResult<bool> {
        if editor.take_redraw_request() {
            self.pending = true;
        }
        if !self.pending {
            return Ok(false);
        }
        self.pending = false;

        let ctx = RenderContext::from_editor(editor).with_grid(self.grid_style);
        if let Err(err) = self.renderer.render(&ctx, surface) {
            log::warn!("Frame {} failed: {err}", self.frames_painted + 1);
            return Err(err);
        }
        self.frames_painted += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use flowchart_core::config::EditorConfig;
    use flowchart_core::input::PointerEvent;

    fn editor() -> FlowchartEditor {
        FlowchartEditor::new(EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_paints_once_per_burst() {
        let mut editor = editor();
        let mut scheduler: FrameScheduler = FrameScheduler::default();
        let mut surface = RecordingSurface::new();

        assert!(scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());
        assert!(!scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());

        editor.zoom_in();
        editor.zoom_in();
        editor.toggle_snap();
        assert!(scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());
        assert!(!scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());
        assert_eq!(scheduler.frames_painted(), 2);
    }

    #[test]
    fn test_idle_pointer_moves_do_not_repaint() {
        let mut editor = editor();
        let mut scheduler: FrameScheduler = FrameScheduler::default();
        let mut surface = RecordingSurface::new();
        scheduler.on_animation_frame(&mut editor, &mut surface).unwrap();

        editor.handle_pointer(&PointerEvent::moved(10.0, 10.0));
        assert!(!scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());
    }

    #[test]
    fn test_explicit_request_and_grid_change() {
        let mut editor = editor();
        let mut scheduler: FrameScheduler = FrameScheduler::default();
        let mut surface = RecordingSurface::new();
        scheduler.on_animation_frame(&mut editor, &mut surface).unwrap();

        scheduler.set_grid_style(GridStyle::Dots);
        assert!(scheduler.is_pending());
        assert!(scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());

        scheduler.request();
        assert!(scheduler.on_animation_frame(&mut editor, &mut surface).unwrap());
    }

    #[test]
    fn test_render_error_propagates() {
        let mut editor = editor();
        editor.set_canvas_size(kurbo::Size::ZERO);
        let mut scheduler: FrameScheduler = FrameScheduler::default();
        let mut surface = RecordingSurface::new();
        assert!(scheduler.on_animation_frame(&mut editor, &mut surface).is_err());
        assert_eq!(scheduler.frames_painted(), 0);
    }
}
