//! End-to-end lifecycle: a modal overlay driving both controllers through
//! open, interaction, and close, the way a host component wires them up.

use std::cell::Cell;
use std::rc::Rc;

use focuskit_core::event::{KeyEvent, PointerEvent};
use focuskit_core::signal::Signal;
use focuskit_core::surface::InputSurface;
use focuskit_core::tree::{Element, ElementKind, NodeRef};
use focuskit_overlay::{FocusTrap, OutsideClickWatcher};

/// A page with a trigger button and a modal containing
/// [confirm button, disabled input, docs link].
fn page() -> (InputSurface, NodeRef) {
    let surface = InputSurface::new();
    surface.tree_mut(|t| {
        t.insert(Element::new(1, ElementKind::Button)); // "open modal" trigger
        t.insert(Element::new(20, ElementKind::Container)); // modal root
        t.append(20, Element::new(21, ElementKind::Button)).unwrap();
        t.append(20, Element::new(22, ElementKind::TextInput).with_disabled(true))
            .unwrap();
        t.append(20, Element::new(23, ElementKind::Link).with_href())
            .unwrap();
    });
    (surface, NodeRef::to(20))
}

#[test]
fn modal_open_cycle_and_close_restores_focus() {
    let (surface, container) = page();
    surface.focus(1); // user activated the trigger
    let open = Signal::new(false);

    let mut trap = FocusTrap::new(surface.clone(), container.clone());
    trap.bind_active(&open);

    // Open: activation waits for the render pass, then lands on the first
    // focusable child.
    open.set(true);
    surface.flush_deferred();
    assert!(trap.is_active());
    assert_eq!(surface.focused(), Some(21));

    // Cycle: shift-tab wraps to the last enabled element, tab wraps back.
    surface.dispatch_key(KeyEvent::shift_tab());
    assert_eq!(surface.focused(), Some(23));
    surface.dispatch_key(KeyEvent::tab());
    assert_eq!(surface.focused(), Some(21));

    // Close: trigger regains focus.
    open.set(false);
    assert!(!trap.is_active());
    assert_eq!(surface.focused(), Some(1));
}

#[test]
fn outside_click_closes_the_modal() {
    let (surface, container) = page();
    surface.focus(1);
    let open = Signal::new(false);

    let mut trap = FocusTrap::new(surface.clone(), container.clone());
    trap.bind_active(&open);

    // The host closes the modal when a click lands outside it.
    let open_for_watcher = open.clone();
    let watcher = OutsideClickWatcher::install(
        surface.clone(),
        container,
        move || open_for_watcher.set(false),
        Some(open.clone()),
    );

    open.set(true);
    surface.flush_deferred();
    assert_eq!(surface.focused(), Some(21));

    // Clicks inside the modal keep it open.
    surface.dispatch_pointer_down(PointerEvent::primary(21));
    assert!(open.get());

    // A click on the page backdrop closes it and restores focus.
    surface.dispatch_pointer_down(PointerEvent::primary(1));
    assert!(!open.get());
    assert!(!trap.is_active());
    assert_eq!(surface.focused(), Some(1));

    // The now-closed modal's gate suppresses further callbacks.
    surface.dispatch_pointer_down(PointerEvent::primary(1));
    assert!(!open.get());
    drop(watcher);
}

#[test]
fn rapid_open_close_open_settles_open() {
    let (surface, container) = page();
    surface.focus(1);
    let open = Signal::new(false);

    let mut trap = FocusTrap::new(surface.clone(), container);
    trap.bind_active(&open);

    open.set(true);
    open.set(false);
    open.set(true);
    surface.flush_deferred();

    assert!(trap.is_active());
    assert_eq!(surface.focused(), Some(21));

    open.set(false);
    assert_eq!(surface.focused(), Some(1));
}

#[test]
fn two_overlays_in_sequence_each_restore_their_own_origin() {
    // A drawer opens from the page, then a modal opens from inside the
    // drawer; closing in LIFO order walks focus back step by step.
    let surface = InputSurface::new();
    surface.tree_mut(|t| {
        t.insert(Element::new(1, ElementKind::Button));
        t.insert(Element::new(30, ElementKind::Container)); // drawer
        t.append(30, Element::new(31, ElementKind::Button)).unwrap();
        t.insert(Element::new(40, ElementKind::Container)); // modal
        t.append(40, Element::new(41, ElementKind::Button)).unwrap();
    });
    surface.focus(1);

    let drawer_trap = FocusTrap::new(surface.clone(), NodeRef::to(30));
    drawer_trap.activate();
    assert_eq!(surface.focused(), Some(31));

    let modal_trap = FocusTrap::new(surface.clone(), NodeRef::to(40));
    modal_trap.activate();
    assert_eq!(surface.focused(), Some(41));

    modal_trap.deactivate();
    assert_eq!(surface.focused(), Some(31));
    drawer_trap.deactivate();
    assert_eq!(surface.focused(), Some(1));
}

#[test]
fn unmount_while_open_tears_everything_down() {
    let (surface, container) = page();
    surface.focus(1);
    let open = Signal::new(false);
    let closed = Rc::new(Cell::new(0u32));

    {
        let mut trap = FocusTrap::new(surface.clone(), container.clone());
        trap.bind_active(&open);
        let closed_clone = Rc::clone(&closed);
        let _watcher = OutsideClickWatcher::install(
            surface.clone(),
            container.clone(),
            move || closed_clone.set(closed_clone.get() + 1),
            None,
        );

        open.set(true);
        surface.flush_deferred();
        assert_eq!(surface.focused(), Some(21));
        // Component unmounts here with the overlay still open.
    }

    // Trap released focus, watcher released its listener.
    assert_eq!(surface.focused(), Some(1));
    surface.dispatch_pointer_down(PointerEvent::primary(1));
    assert_eq!(closed.get(), 0);

    // And a signal flip after teardown is inert.
    open.set(false);
    open.set(true);
    surface.flush_deferred();
    assert_eq!(surface.focused(), Some(1));
}
