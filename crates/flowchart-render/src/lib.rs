//! Flowchart Render Library
//!
//! Drawing-surface contract, a recording surface and the canvas renderer
//! that paints a flowchart diagram through it.

mod canvas_renderer;
mod frame;
mod renderer;
mod surface;

pub use canvas_renderer::CanvasRenderer;
pub use frame::FrameScheduler;
pub use renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
pub use surface::{DrawCommand, DrawingSurface, RecordingSurface, TextAlign};
