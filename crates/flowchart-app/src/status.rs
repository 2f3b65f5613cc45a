//! Text status bar fed from [`StatusSnapshot`]s.

use flowchart_core::StatusSnapshot;

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// One-line rendering of a snapshot.
pub fn format_status(status: &StatusSnapshot) -> String {
    let snap = if status.snap_enabled {
        format!("Snap on ({})", status.snap_size)
    } else {
        "Snap off".to_string()
    };
    let mut line = format!(
        "{} | {} | {}% | {} | {}, {}",
        status.mode_label,
        status.tool.name(),
        status.zoom_percent,
        snap,
        plural(status.selected_nodes, "node"),
        plural(status.selected_edges, "edge"),
    );
    if let Some(cursor) = status.cursor {
        line.push_str(&format!(" | {:.0}, {:.0}", cursor.x, cursor.y));
        if let Some(snapped) = status.cursor_snapped.filter(|s| *s != cursor) {
            line.push_str(&format!(" -> {:.0}, {:.0} (snapped)", snapped.x, snapped.y));
        }
    }
    line
}

/// Remembers the last line so hosts only repaint on change.
#[derive(Debug, Default)]
pub struct StatusBar {
    last: Option<String>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// The new line, or `None` if nothing changed.
    pub fn update(&mut self, status: &StatusSnapshot) -> Option<&str> {
        let line = format_status(status);
        if self.last.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last = Some(line);
        self.last.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowchart_core::{EditorConfig, FlowchartEditor, PointerEvent};

    #[test]
    fn test_idle_line() {
        let editor = FlowchartEditor::new(EditorConfig::default()).unwrap();
        assert_eq!(
            format_status(&editor.status()),
            "Ready | select | 100% | Snap off | 0 nodes, 0 edges"
        );
    }

    #[test]
    fn test_cursor_and_snap() {
        let mut editor = FlowchartEditor::new(EditorConfig::default()).unwrap();
        editor.toggle_snap();
        editor.handle_pointer(&PointerEvent::moved(14.0, 26.0));
        let line = format_status(&editor.status());
        assert!(line.starts_with("Ready | select | 100% | Snap on (10)"), "{line}");
        assert!(line.ends_with("| 14, 26 -> 10, 30 (snapped)"), "{line}");

        editor.handle_pointer(&PointerEvent::moved(20.0, 30.0));
        let line = format_status(&editor.status());
        assert!(line.ends_with("| 20, 30"), "{line}");
    }

    #[test]
    fn test_bar_reports_changes_only() {
        let mut editor = FlowchartEditor::new(EditorConfig::default()).unwrap();
        let mut bar = StatusBar::new();
        assert!(bar.update(&editor.status()).is_some());
        assert!(bar.update(&editor.status()).is_none());
        editor.zoom_in();
        assert_eq!(
            bar.update(&editor.status()),
            Some("Ready | select | 120% | Snap off | 0 nodes, 0 edges")
        );
        assert_eq!(bar.current(), Some("Ready | select | 120% | Snap off | 0 nodes, 0 edges"));
    }
}
