//! Input abstraction layer.
//!
//! Normalizes mouse and touch events from the template editor canvas into
//! a unified `InputEvent` enum consumed by the interaction controller.
//! Coordinates are canvas pixels relative to the canvas element.

use kurbo::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    /// Platform command key: ⌘ on macOS, Ctrl elsewhere.
    pub fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// A normalized input event from any pointing device or the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f64, y: f64 },

    /// Pointer moved, pressed or not.
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64 },

    /// Pointer left the canvas. Ends any gesture like a release.
    PointerLeave,

    /// Key pressed; `key` is the `KeyboardEvent.key` value.
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        InputEvent::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Pointer position, if this is a positioned pointer event.
    pub fn position(&self) -> Option<Point> {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerMove { x, y }
            | InputEvent::PointerUp { x, y } => Some(Point::new(x, y)),
            InputEvent::PointerLeave | InputEvent::Key { .. } => None,
        }
    }
}
