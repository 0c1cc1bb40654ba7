#![forbid(unsafe_code)]

//! Outside-click watcher: invoke a callback for pointer-downs landing
//! outside a container.
//!
//! The watcher observes the whole surface and filters per event, so
//! containment is always judged against the live tree. An optional enabled
//! gate suspends the callback without tearing the listener down, for the
//! "nested popover is open" case.
//!
//! # Invariants
//!
//! 1. Exactly one callback invocation per qualifying event.
//! 2. One installed instance holds exactly one surface listener; uninstall
//!    (or drop) releases it, so mount/unmount cycles cannot accumulate
//!    observers.
//!
//! # Failure Modes
//!
//! An unset container means "nothing is outside": events are ignored, no
//! error. A gate reading `false` short-circuits before any containment
//! check.

use std::cell::RefCell;
use std::rc::Rc;

use focuskit_core::event::PointerEvent;
use focuskit_core::signal::Signal;
use focuskit_core::surface::{InputSurface, ListenerGuard};
use focuskit_core::tree::NodeRef;

struct WatcherInner {
    surface: InputSurface,
    container: NodeRef,
    callback: Rc<dyn Fn()>,
    enabled: Option<Signal<bool>>,
    pointer_guard: Option<ListenerGuard>,
}

/// Watches for pointer-downs outside a container while installed.
pub struct OutsideClickWatcher {
    inner: Rc<RefCell<WatcherInner>>,
}

impl std::fmt::Debug for OutsideClickWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("OutsideClickWatcher")
            .field("container", &inner.container.get())
            .field("installed", &inner.pointer_guard.is_some())
            .finish_non_exhaustive()
    }
}

impl OutsideClickWatcher {
    /// Install a pointer-down observer on `surface`.
    ///
    /// `callback` fires once per pointer-down whose target is not a live
    /// descendant of (or equal to) the container. When `enabled` is supplied
    /// and reads `false` at event time, the event is ignored entirely.
    #[must_use = "dropping the watcher uninstalls it"]
    pub fn install(
        surface: InputSurface,
        container: NodeRef,
        callback: impl Fn() + 'static,
        enabled: Option<Signal<bool>>,
    ) -> Self {
        let inner = Rc::new(RefCell::new(WatcherInner {
            surface: surface.clone(),
            container,
            callback: Rc::new(callback),
            enabled,
            pointer_guard: None,
        }));
        let weak = Rc::downgrade(&inner);
        let guard = surface.on_pointer_down(move |event| {
            if let Some(watcher) = weak.upgrade() {
                on_pointer_down(&watcher, event);
            }
        });
        inner.borrow_mut().pointer_guard = Some(guard);
        tracing::debug!("outside-click watcher installed");
        Self { inner }
    }

    /// Remove the observer. Idempotent; the watcher never fires again.
    pub fn uninstall(&self) {
        let released = self.inner.borrow_mut().pointer_guard.take().is_some();
        if released {
            tracing::debug!("outside-click watcher uninstalled");
        }
    }

    /// Whether the observer is currently installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.inner.borrow().pointer_guard.is_some()
    }
}

impl Drop for OutsideClickWatcher {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn on_pointer_down(inner: &Rc<RefCell<WatcherInner>>, event: &PointerEvent) {
    let (surface, container, callback, enabled) = {
        let w = inner.borrow();
        (
            w.surface.clone(),
            w.container.get(),
            Rc::clone(&w.callback),
            w.enabled.clone(),
        )
    };
    if let Some(gate) = enabled
        && !gate.get()
    {
        return;
    }
    let Some(container) = container else { return };
    // Live containment at event time; a target unknown to the tree counts
    // as outside, same as a detached node.
    let outside = surface.tree(|tree| !tree.contains(container, event.target));
    if outside {
        tracing::trace!(node = event.target, "outside interaction");
        callback();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use focuskit_core::tree::{Element, ElementKind, NodeId};
    use std::cell::Cell;

    /// Container 10 with child button 11 and grandchild 12; sibling button 1.
    fn popup_surface() -> (InputSurface, NodeRef) {
        let surface = InputSurface::new();
        surface.tree_mut(|t| {
            t.insert(Element::new(1, ElementKind::Button));
            t.insert(Element::new(10, ElementKind::Container));
            t.append(10, Element::new(11, ElementKind::Button)).unwrap();
            t.append(11, Element::new(12, ElementKind::Text)).unwrap();
        });
        (surface, NodeRef::to(10))
    }

    fn counting_watcher(
        surface: &InputSurface,
        container: NodeRef,
        enabled: Option<Signal<bool>>,
    ) -> (OutsideClickWatcher, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let watcher = OutsideClickWatcher::install(
            surface.clone(),
            container,
            move || count_clone.set(count_clone.get() + 1),
            enabled,
        );
        (watcher, count)
    }

    fn click(surface: &InputSurface, target: NodeId) {
        surface.dispatch_pointer_down(PointerEvent::primary(target));
    }

    // --- Containment ---

    #[test]
    fn inside_clicks_do_not_fire() {
        let (surface, container) = popup_surface();
        let (_watcher, count) = counting_watcher(&surface, container, None);

        click(&surface, 10); // the container itself
        click(&surface, 11); // direct child
        click(&surface, 12); // grandchild
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn outside_click_fires_exactly_once() {
        let (surface, container) = popup_surface();
        let (_watcher, count) = counting_watcher(&surface, container, None);

        click(&surface, 1);
        assert_eq!(count.get(), 1);
        click(&surface, 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn unknown_target_counts_as_outside() {
        let (surface, container) = popup_surface();
        let (_watcher, count) = counting_watcher(&surface, container, None);

        click(&surface, 99);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn containment_is_live_not_snapshotted() {
        let (surface, container) = popup_surface();
        let (_watcher, count) = counting_watcher(&surface, container, None);

        // A node appended after install is still "inside".
        surface.tree_mut(|t| {
            t.append(10, Element::new(13, ElementKind::Button)).unwrap();
        });
        click(&surface, 13);
        assert_eq!(count.get(), 0);

        // A node removed from the container becomes unknown, hence outside.
        surface.tree_mut(|t| {
            let _ = t.remove(11);
        });
        click(&surface, 11);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unset_container_ignores_everything() {
        let (surface, _) = popup_surface();
        let slot = NodeRef::new();
        let (_watcher, count) = counting_watcher(&surface, slot.clone(), None);

        click(&surface, 1);
        assert_eq!(count.get(), 0);

        // Once the slot is filled, detection starts.
        slot.set(Some(10));
        click(&surface, 1);
        assert_eq!(count.get(), 1);
    }

    // --- Enabled gate ---

    #[test]
    fn gate_false_suppresses_without_uninstalling() {
        let (surface, container) = popup_surface();
        let gate = Signal::new(true);
        let (watcher, count) = counting_watcher(&surface, container, Some(gate.clone()));

        click(&surface, 1);
        assert_eq!(count.get(), 1);

        gate.set(false);
        click(&surface, 1);
        assert_eq!(count.get(), 1);
        assert!(watcher.is_installed()); // observer stayed put

        gate.set(true);
        click(&surface, 1);
        assert_eq!(count.get(), 2);
    }

    // --- Uninstall / drop ---

    #[test]
    fn uninstall_stops_callbacks() {
        let (surface, container) = popup_surface();
        let (watcher, count) = counting_watcher(&surface, container, None);

        watcher.uninstall();
        assert!(!watcher.is_installed());
        click(&surface, 1);
        assert_eq!(count.get(), 0);

        watcher.uninstall(); // idempotent
    }

    #[test]
    fn drop_uninstalls() {
        let (surface, container) = popup_surface();
        let (watcher, count) = counting_watcher(&surface, container, None);
        drop(watcher);
        click(&surface, 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn install_uninstall_cycles_do_not_accumulate_observers() {
        let (surface, container) = popup_surface();
        let count = Rc::new(Cell::new(0u32));

        for _ in 0..5 {
            let count_clone = Rc::clone(&count);
            let watcher = OutsideClickWatcher::install(
                surface.clone(),
                container.clone(),
                move || count_clone.set(count_clone.get() + 1),
                None,
            );
            drop(watcher);
        }

        let count_clone = Rc::clone(&count);
        let _live = OutsideClickWatcher::install(
            surface.clone(),
            container,
            move || count_clone.set(count_clone.get() + 1),
            None,
        );
        click(&surface, 1);
        assert_eq!(count.get(), 1); // exactly one live observer
    }
}
