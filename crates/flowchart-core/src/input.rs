//! Pointer and keyboard input types plus tracked input state.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Shift, Ctrl or Meta: extend the selection instead of replacing it.
    pub fn is_additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer events in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    /// Host-reported double click.
    DoubleClick {
        position: Point,
        modifiers: Modifiers,
    },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
    /// Pointer left the canvas.
    Leave,
    /// Gesture aborted by the host.
    Cancel,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        PointerEvent::Move {
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    /// Same event with different modifiers.
    pub fn with_modifiers(mut self, mods: Modifiers) -> Self {
        match &mut self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. }
            | PointerEvent::DoubleClick { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. } => *modifiers = mods,
            PointerEvent::Leave | PointerEvent::Cancel => {}
        }
        self
    }

    /// Same event with a different button.
    pub fn with_button(mut self, new_button: MouseButton) -> Self {
        if let PointerEvent::Down { button, .. } | PointerEvent::Up { button, .. } = &mut self {
            *button = new_button;
        }
        self
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::DoubleClick { position, .. }
            | PointerEvent::Wheel { position, .. } => Some(*position),
            PointerEvent::Leave | PointerEvent::Cancel => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. }
            | PointerEvent::DoubleClick { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. } => *modifiers,
            PointerEvent::Leave | PointerEvent::Cancel => Modifiers::NONE,
        }
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Space,
    Escape,
    Delete,
    Backspace,
    Char(char),
    Other(String),
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed { key: Key, modifiers: Modifiers },
    Released { key: Key, modifiers: Modifiers },
}

impl KeyEvent {
    pub fn pressed(key: Key) -> Self {
        KeyEvent::Pressed {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn released(key: Key) -> Self {
        KeyEvent::Released {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks pointer, button, key and modifier state between events.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    pub modifiers: Modifiers,
    pressed_keys: HashSet<Key>,
    /// Start position of the current drag, in screen coordinates.
    pub drag_start: Option<Point>,
    last_click_time: Option<Instant>,
    last_click_position: Option<Point>,
    double_click_detected: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer_position: Point::ZERO,
            previous_pointer_position: Point::ZERO,
            pressed_buttons: HashSet::new(),
            modifiers: Modifiers::default(),
            pressed_keys: HashSet::new(),
            drag_start: None,
            last_click_time: None,
            last_click_position: None,
            double_click_detected: false,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        self.previous_pointer_position = self.pointer_position;
        if let Some(position) = event.position() {
            self.pointer_position = position;
        }
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                self.modifiers = *modifiers;
                self.pressed_buttons.insert(*button);
                self.double_click_detected = false;
                if *button == MouseButton::Left {
                    self.detect_double_click(*position);
                }
                if self.drag_start.is_none() {
                    self.drag_start = Some(*position);
                }
            }
            PointerEvent::Up {
                button, modifiers, ..
            } => {
                self.modifiers = *modifiers;
                self.pressed_buttons.remove(button);
                if self.pressed_buttons.is_empty() {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { modifiers, .. }
            | PointerEvent::Wheel { modifiers, .. }
            | PointerEvent::DoubleClick { modifiers, .. } => {
                self.modifiers = *modifiers;
            }
            PointerEvent::Leave | PointerEvent::Cancel => {
                self.pressed_buttons.clear();
                self.drag_start = None;
            }
        }
    }

    fn detect_double_click(&mut self, position: Point) {
        let now = Instant::now();
        if let (Some(last_time), Some(last_pos)) = (self.last_click_time, self.last_click_position) {
            let elapsed = now.duration_since(last_time).as_millis();
            let distance = (position - last_pos).hypot();
            if elapsed < DOUBLE_CLICK_TIME_MS && distance < DOUBLE_CLICK_DISTANCE {
                self.double_click_detected = true;
                // Reset so a triple click is not another double click
                self.last_click_time = None;
                self.last_click_position = None;
                return;
            }
        }
        self.last_click_time = Some(now);
        self.last_click_position = Some(position);
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Pressed { key, modifiers } => {
                self.modifiers = *modifiers;
                self.pressed_keys.insert(key.clone());
            }
            KeyEvent::Released { key, modifiers } => {
                self.modifiers = *modifiers;
                self.pressed_keys.remove(key);
            }
        }
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_key_pressed(&self, key: &Key) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Space held: empty-canvas drags pan.
    pub fn is_space_held(&self) -> bool {
        self.pressed_keys.contains(&Key::Space)
    }

    /// Whether the last left press completed a double click.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Pointer movement since the previous event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Offset from the drag start, if dragging.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press_and_release() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::down(10.0, 20.0));
        assert!(input.is_button_pressed(MouseButton::Left));
        assert_eq!(input.drag_start, Some(Point::new(10.0, 20.0)));

        input.handle_pointer_event(&PointerEvent::moved(15.0, 30.0));
        assert_eq!(input.drag_delta(), Some(Vec2::new(5.0, 10.0)));
        assert_eq!(input.pointer_delta(), Vec2::new(5.0, 10.0));

        input.handle_pointer_event(&PointerEvent::up(15.0, 30.0));
        assert!(!input.is_button_pressed(MouseButton::Left));
        assert_eq!(input.drag_start, None);
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::down(100.0, 100.0));
        input.handle_pointer_event(&PointerEvent::up(100.0, 100.0));
        assert!(!input.is_double_click());
        input.handle_pointer_event(&PointerEvent::down(101.0, 101.0));
        assert!(input.is_double_click());
        input.handle_pointer_event(&PointerEvent::up(101.0, 101.0));
        // Third click starts a new sequence
        input.handle_pointer_event(&PointerEvent::down(101.0, 101.0));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_double_click_needs_proximity() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::down(0.0, 0.0));
        input.handle_pointer_event(&PointerEvent::up(0.0, 0.0));
        input.handle_pointer_event(&PointerEvent::down(50.0, 0.0));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_space_tracking() {
        let mut input = InputState::new();
        input.handle_key_event(&KeyEvent::pressed(Key::Space));
        assert!(input.is_space_held());
        input.handle_key_event(&KeyEvent::released(Key::Space));
        assert!(!input.is_space_held());
    }

    #[test]
    fn test_leave_clears_buttons() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::down(0.0, 0.0));
        input.handle_pointer_event(&PointerEvent::Leave);
        assert!(!input.is_button_pressed(MouseButton::Left));
        assert!(input.drag_start.is_none());
    }

    #[test]
    fn test_modifier_helpers() {
        assert!(Modifiers::shift().is_additive());
        assert!(Modifiers::ctrl().command());
        assert!(!Modifiers::alt().is_additive());
        let ev = PointerEvent::down(0.0, 0.0).with_modifiers(Modifiers::alt());
        assert!(ev.modifiers().alt);
    }
}
