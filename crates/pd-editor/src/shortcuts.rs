//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Whether an
//! action actually runs (e.g. Delete while editing text) is decided by the
//! editor, not here.

use crate::input::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Copy,
    Paste,
    Delete,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,

    // ── UI ──
    Deselect,
}

impl ShortcutAction {
    /// Actions that must not steal keys from an active text edit.
    pub fn yields_to_text_edit(&self) -> bool {
        matches!(
            self,
            ShortcutAction::Copy | ShortcutAction::Paste | ShortcutAction::Delete
        )
    }
}

/// Resolves key events into shortcut actions. `ctrl` and `meta` both act
/// as the command modifier.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "c" | "C" => Some(ShortcutAction::Copy),
                "v" | "V" => Some(ShortcutAction::Paste),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                _ => None,
            };
        }

        match key {
            "Delete" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_history() {
        assert_eq!(ShortcutMap::resolve("z", CTRL), Some(ShortcutAction::Undo));
        assert_eq!(ShortcutMap::resolve("Z", META), Some(ShortcutAction::Undo));
        assert_eq!(ShortcutMap::resolve("y", CTRL), Some(ShortcutAction::Redo));
        assert_eq!(
            ShortcutMap::resolve("Z", CTRL_SHIFT),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_clipboard_and_delete() {
        assert_eq!(ShortcutMap::resolve("c", CTRL), Some(ShortcutAction::Copy));
        assert_eq!(ShortcutMap::resolve("v", META), Some(ShortcutAction::Paste));
        assert_eq!(
            ShortcutMap::resolve("Delete", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        // Backspace belongs to text editing
        assert_eq!(ShortcutMap::resolve("Backspace", Modifiers::NONE), None);
        assert!(ShortcutAction::Delete.yields_to_text_edit());
        assert!(!ShortcutAction::Undo.yields_to_text_edit());
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(ShortcutMap::resolve("=", CTRL), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("+", CTRL), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", CTRL), Some(ShortcutAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", CTRL), Some(ShortcutAction::ZoomReset));
    }

    #[test]
    fn plain_letters_are_unbound() {
        assert_eq!(ShortcutMap::resolve("z", Modifiers::NONE), None);
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::Deselect)
        );
    }
}
