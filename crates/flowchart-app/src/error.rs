//! Application error type.

use flowchart_core::FlowchartError;
use flowchart_render::RendererError;
use thiserror::Error;

/// Errors raised while loading configuration or driving a session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Editor(#[from] FlowchartError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

pub type AppResult<T> = Result<T, AppError>;
