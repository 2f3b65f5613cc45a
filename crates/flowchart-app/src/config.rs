//! Loading editor configuration from disk.

use std::fs;
use std::path::Path;

use flowchart_core::EditorConfig;

use crate::error::AppResult;

/// Read a JSON config file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> AppResult<EditorConfig> {
    let text = fs::read_to_string(path)?;
    let config: EditorConfig = serde_json::from_str(&text)?;
    config.validate()?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load `path` if given, otherwise fall back to the defaults.
pub fn load_or_default(path: Option<&Path>) -> AppResult<EditorConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            log::debug!("No config file given, using defaults");
            Ok(EditorConfig::default())
        }
    }
}
