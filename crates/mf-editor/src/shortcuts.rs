//! Keyboard bindings for the flow canvas and the template editor.
//!
//! Both surfaces resolve keys through one binding table so they agree on
//! the common keys (Delete, Escape). Each binding lists the scopes it is
//! active in: the template editor has no undo history, and the flow canvas
//! has nothing to duplicate or zoom.

use crate::input::Modifiers;

/// What a resolved key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Remove the selected node or shape.
    Delete,
    Duplicate,
    ZoomIn,
    ZoomOut,
    Deselect,
}

impl ShortcutAction {
    /// Name reported to the front end.
    pub fn name(self) -> &'static str {
        match self {
            ShortcutAction::Undo => "undo",
            ShortcutAction::Redo => "redo",
            ShortcutAction::Delete => "delete",
            ShortcutAction::Duplicate => "duplicate",
            ShortcutAction::ZoomIn => "zoomIn",
            ShortcutAction::ZoomOut => "zoomOut",
            ShortcutAction::Deselect => "deselect",
        }
    }
}

/// The surface a key event arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutScope {
    Flow,
    Template,
}

struct Binding {
    key: &'static str,
    /// Requires Ctrl (or ⌘ on macOS).
    command: bool,
    shift: bool,
    action: ShortcutAction,
    flow: bool,
    template: bool,
}

const fn bind(
    key: &'static str,
    command: bool,
    shift: bool,
    action: ShortcutAction,
    flow: bool,
    template: bool,
) -> Binding {
    Binding {
        key,
        command,
        shift,
        action,
        flow,
        template,
    }
}

const BINDINGS: &[Binding] = &[
    bind("z", true, false, ShortcutAction::Undo, true, false),
    bind("z", true, true, ShortcutAction::Redo, true, false),
    bind("y", true, false, ShortcutAction::Redo, true, false),
    bind("d", true, false, ShortcutAction::Duplicate, false, true),
    bind("=", true, false, ShortcutAction::ZoomIn, false, true),
    bind("+", true, false, ShortcutAction::ZoomIn, false, true),
    bind("+", true, true, ShortcutAction::ZoomIn, false, true),
    bind("-", true, false, ShortcutAction::ZoomOut, false, true),
    bind("Delete", false, false, ShortcutAction::Delete, true, true),
    bind("Backspace", false, false, ShortcutAction::Delete, true, true),
    bind("Escape", false, false, ShortcutAction::Deselect, true, true),
];

impl Binding {
    fn active_in(&self, scope: ShortcutScope) -> bool {
        match scope {
            ShortcutScope::Flow => self.flow,
            ShortcutScope::Template => self.template,
        }
    }

    fn matches(&self, key: &str, command: bool, shift: bool) -> bool {
        self.command == command && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

/// Resolves key events against the binding table.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a `KeyboardEvent.key` value pressed on `scope`.
    ///
    /// Ctrl and ⌘ are interchangeable; Alt is ignored. Letter keys match
    /// either case, so Shift+Z arriving as `"Z"` still resolves.
    pub fn resolve(
        scope: ShortcutScope,
        key: &str,
        modifiers: Modifiers,
    ) -> Option<ShortcutAction> {
        let command = modifiers.ctrl || modifiers.meta;
        BINDINGS
            .iter()
            .find(|b| b.active_in(scope) && b.matches(key, command, modifiers.shift))
            .map(|b| b.action)
    }
}
