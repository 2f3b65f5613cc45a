//! Editor configuration.

use kurbo::Size;
use serde::{Deserialize, Serialize};

use crate::error::{FlowchartError, Result};
use crate::selection::HitTolerances;

/// Tunables for the editor. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_size: Size,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub enable_snap: bool,
    pub snap_size: f64,
    /// Fraction of the canvas `zoom_fit` lets the content occupy.
    pub fit_margin: f64,
    /// Screen-pixel tolerance for node bodies and edge paths.
    pub hit_tolerance: f64,
    /// Screen-pixel tolerance for waypoint and control-point handles.
    pub handle_tolerance: f64,
    /// Screen-pixel tolerance for ports.
    pub port_tolerance: f64,
    /// World-unit tolerance for alignment guides.
    pub alignment_tolerance: f64,
    pub show_guides: bool,
    pub readonly: bool,
    pub default_edge_type: String,
    pub wheel_zoom_step: f64,
    pub button_zoom_step: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_size: Size::new(800.0, 600.0),
            min_zoom: 0.1,
            max_zoom: 5.0,
            enable_snap: false,
            snap_size: 10.0,
            fit_margin: 0.9,
            hit_tolerance: 5.0,
            handle_tolerance: 8.0,
            port_tolerance: 10.0,
            alignment_tolerance: 8.0,
            show_guides: true,
            readonly: false,
            default_edge_type: "orthogonal".to_string(),
            wheel_zoom_step: 1.1,
            button_zoom_step: 1.2,
        }
    }
}

impl EditorConfig {
    /// Reject values the editor cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FlowchartError::InvalidConfig(msg));
        if !(self.min_zoom > 0.0) {
            return invalid(format!("min_zoom must be positive, got {}", self.min_zoom));
        }
        if self.min_zoom > self.max_zoom {
            return invalid(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            ));
        }
        if !(self.snap_size > 0.0) {
            return invalid(format!("snap_size must be positive, got {}", self.snap_size));
        }
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            return invalid(format!("fit_margin must be in (0, 1], got {}", self.fit_margin));
        }
        if !(self.wheel_zoom_step > 1.0 && self.button_zoom_step > 1.0) {
            return invalid("zoom steps must be greater than 1".to_string());
        }
        Ok(())
    }

    /// Screen tolerances bundled for hit testing.
    pub fn tolerances(&self) -> HitTolerances {
        HitTolerances {
            hit: self.hit_tolerance,
            handle: self.handle_tolerance,
            port: self.port_tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.max_zoom - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.default_edge_type, "orthogonal");
    }

    #[test]
    fn test_validate_rejects_bad_zoom() {
        let config = EditorConfig {
            min_zoom: 0.0,
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(FlowchartError::InvalidConfig(_))));

        let config = EditorConfig {
            min_zoom: 3.0,
            max_zoom: 2.0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_snap() {
        let config = EditorConfig {
            snap_size: -1.0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"enable_snap": true, "snap_size": 16}"#).unwrap();
        assert!(config.enable_snap);
        assert!((config.snap_size - 16.0).abs() < f64::EPSILON);
        assert!((config.min_zoom - 0.1).abs() < f64::EPSILON);
    }
}
