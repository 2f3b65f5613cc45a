//! Flowchart Application
//!
//! Headless host for the editor: configuration loading, keyboard shortcut
//! dispatch, a text status bar and a scripted demo session.

mod config;
mod demo;
mod error;
mod shortcuts;
mod status;

pub use config::{load_config, load_or_default};
pub use demo::{DemoReport, DemoSession, build_sample_diagram, run_demo};
pub use error::{AppError, AppResult};
pub use shortcuts::{Shortcut, ShortcutRegistry, dispatch_key};
pub use status::{StatusBar, format_status};
