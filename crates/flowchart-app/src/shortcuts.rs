//! Keyboard shortcut registry and key dispatch.

use flowchart_core::{FlowchartEditor, Key, KeyEvent, UiCommand};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+A").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("+", false, false, "Zoom in"),
            Shortcut::new("-", false, false, "Zoom out"),
            Shortcut::new("0", false, false, "Reset zoom to 100%"),
            Shortcut::new("F", false, false, "Zoom to fit the diagram"),
            Shortcut::new("G", false, false, "Toggle grid snapping"),
            Shortcut::new("G", false, true, "Cycle snap size"),
            Shortcut::new("A", true, false, "Select all"),
            Shortcut::new("Delete", false, false, "Request deletion of the selection"),
            Shortcut::new("Backspace", false, false, "Request deletion of the selection"),
            Shortcut::new("Escape", false, false, "Cancel current action and clear selection"),
            Shortcut::new("Space+Drag", false, false, "Pan the canvas"),
            Shortcut::new("Shift+Drag", false, false, "Lock handle drag to one axis"),
            Shortcut::new("Shift+Click", false, false, "Toggle item in selection"),
            Shortcut::new("Alt+Click", false, false, "Add or remove an edge waypoint"),
            Shortcut::new("Double-click", false, false, "Reset edge routing"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }

    /// Status-bar command bound to a key press, if any.
    ///
    /// Chords with Ctrl or Cmd are left to the editor.
    pub fn command_for(event: &KeyEvent) -> Option<UiCommand> {
        let KeyEvent::Pressed { key: Key::Char(c), modifiers } = event else {
            return None;
        };
        if modifiers.command() || modifiers.alt {
            return None;
        }
        match c {
            '+' | '=' => Some(UiCommand::ZoomIn),
            '-' | '_' => Some(UiCommand::ZoomOut),
            '0' => Some(UiCommand::ZoomReset),
            'f' | 'F' => Some(UiCommand::ZoomFit),
            'G' => Some(UiCommand::CycleSnapSize),
            'g' if modifiers.shift => Some(UiCommand::CycleSnapSize),
            'g' => Some(UiCommand::ToggleSnap),
            _ => None,
        }
    }
}

/// Route a key event to a status-bar command or to the editor.
///
/// Returns true when the editor wants a redraw.
pub fn dispatch_key(editor: &mut FlowchartEditor, event: &KeyEvent) -> bool {
    match ShortcutRegistry::command_for(event) {
        Some(command) => {
            editor.raise(command);
            true
        }
        None => editor.handle_key(event),
    }
}
