#![forbid(unsafe_code)]

//! Normalized input events dispatched through the input surface.
//!
//! Only the events overlay controllers care about are modeled: key-down
//! (tab traversal) and pointer-down (outside-interaction detection).
//! Listeners receive an [`EventFlow`] alongside each key event so they can
//! suppress the surface's default tab navigation, mirroring how a trapped
//! Tab press at a boundary must not also advance native focus.

use bitflags::bitflags;

use crate::tree::NodeId;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
    }
}

/// Key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab,
    Enter,
    Escape,
    Char(char),
}

/// A key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Forward tab.
    #[must_use]
    pub const fn tab() -> Self {
        Self::new(KeyCode::Tab)
    }

    /// Backward tab (Shift+Tab).
    #[must_use]
    pub fn shift_tab() -> Self {
        Self::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT)
    }

    /// Builder: set modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a Tab press (either direction).
    #[must_use]
    pub fn is_tab(&self) -> bool {
        self.code == KeyCode::Tab
    }

    /// Whether Shift is held.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Pointer button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A pointer-down event targeting an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Element under the pointer.
    pub target: NodeId,
    pub button: PointerButton,
}

impl PointerEvent {
    /// Primary-button press on `target`.
    #[must_use]
    pub const fn primary(target: NodeId) -> Self {
        Self {
            target,
            button: PointerButton::Primary,
        }
    }
}

/// Per-dispatch flow control handed to key listeners.
///
/// Calling [`EventFlow::prevent_default`] stops the surface from applying
/// its native tab navigation after listeners have run. It does not stop
/// later listeners from seeing the event.
#[derive(Debug, Default)]
pub struct EventFlow {
    default_prevented: bool,
}

impl EventFlow {
    /// Fresh flow for one dispatch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the surface's default handling for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether default handling was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_constructors() {
        assert!(KeyEvent::tab().is_tab());
        assert!(!KeyEvent::tab().shift());
        assert!(KeyEvent::shift_tab().is_tab());
        assert!(KeyEvent::shift_tab().shift());
        assert!(!KeyEvent::new(KeyCode::Enter).is_tab());
    }

    #[test]
    fn modifiers_compose() {
        let ev = KeyEvent::new(KeyCode::Char('a')).with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(ev.modifiers.contains(Modifiers::CTRL));
        assert!(ev.shift());
        assert!(!ev.modifiers.contains(Modifiers::ALT));
    }

    #[test]
    fn event_flow_starts_unprevented() {
        let mut flow = EventFlow::new();
        assert!(!flow.default_prevented());
        flow.prevent_default();
        assert!(flow.default_prevented());
    }
}
