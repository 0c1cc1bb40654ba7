#![forbid(unsafe_code)]

//! Focus trap: confine Tab navigation to a container and restore prior
//! focus on release.
//!
//! One trap serves one overlay (modal, drawer) for one activation cycle at a
//! time. The trap owns exactly two resources while engaged: a surface-wide
//! key listener and the focus state captured at activation. Both are
//! released by [`FocusTrap::deactivate`], which is idempotent, and forced on
//! drop.
//!
//! # Invariants
//!
//! 1. Prior focus is captured before any focus moves into the container and
//!    restored at most once per activation cycle.
//! 2. The focusable set is recomputed from the live tree on every Tab press;
//!    content changes between presses are always observed.
//! 3. A deferred activation queued before a deactivation never re-engages
//!    the trap (epoch check).
//!
//! # Failure Modes
//!
//! Everything degrades to a no-op: an unset container, an empty focusable
//! set, a restore target that has left the tree. Focus management never
//! raises an error toward the host.

use std::cell::RefCell;
use std::rc::Rc;

use focuskit_core::event::{EventFlow, KeyEvent};
use focuskit_core::signal::{Signal, Subscription};
use focuskit_core::surface::{InputSurface, ListenerGuard};
use focuskit_core::tree::{NodeId, NodeRef};

struct TrapInner {
    surface: InputSurface,
    container: NodeRef,
    active: bool,
    /// `Some(prior)` while an activation cycle holds captured focus state;
    /// the inner option is the focus at capture time (possibly nothing).
    /// Taken exactly once on deactivation.
    restore_to: Option<Option<NodeId>>,
    key_guard: Option<ListenerGuard>,
    /// Bumped on every deactivation; a queued deferred activation carries
    /// the epoch it was scheduled under and aborts on mismatch.
    epoch: u64,
}

/// Confines Tab navigation to a container while active.
///
/// Activation can be driven manually ([`FocusTrap::activate`] /
/// [`FocusTrap::deactivate`]) or bound to the overlay's open state with
/// [`FocusTrap::bind_active`], which defers engagement to the next
/// [`InputSurface::flush_deferred`] so the container's children are mounted
/// before the focusable set is computed.
pub struct FocusTrap {
    inner: Rc<RefCell<TrapInner>>,
    lifecycle: Option<Subscription>,
}

impl std::fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FocusTrap")
            .field("container", &inner.container.get())
            .field("active", &inner.active)
            .finish_non_exhaustive()
    }
}

impl FocusTrap {
    /// Create an inactive trap for `container` on `surface`.
    #[must_use]
    pub fn new(surface: InputSurface, container: NodeRef) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TrapInner {
                surface,
                container,
                active: false,
                restore_to: None,
                key_guard: None,
                epoch: 0,
            })),
            lifecycle: None,
        }
    }

    /// Engage the trap now.
    ///
    /// Captures the currently focused element for later restoration, starts
    /// intercepting Tab surface-wide, and moves focus to the container's
    /// first focusable descendant (if any; otherwise focus is left alone).
    /// No-op when already active.
    pub fn activate(&self) {
        activate(&self.inner);
    }

    /// Release the trap and restore focus to whatever held it at
    /// activation time (including "nothing"). Idempotent: the captured
    /// state is consumed on the first call, so repeat calls change nothing.
    pub fn deactivate(&self) {
        deactivate(&self.inner);
    }

    /// Whether the trap is currently engaged.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    /// Drive the trap from the overlay's open state.
    ///
    /// A `false -> true` edge schedules activation through the surface's
    /// deferred queue; a `true -> false` edge deactivates synchronously and
    /// invalidates any still-queued activation. Rebinding replaces the
    /// previous binding.
    pub fn bind_active(&mut self, active: &Signal<bool>) {
        let weak = Rc::downgrade(&self.inner);
        self.lifecycle = Some(active.subscribe(move |prev, now| {
            let Some(inner) = weak.upgrade() else { return };
            match (*prev, *now) {
                (false, true) => schedule_activate(&inner),
                (true, false) => deactivate(&inner),
                _ => {}
            }
        }));
    }
}

impl Drop for FocusTrap {
    // Cleanup-on-teardown: a trap dropped while engaged must not leave the
    // listener installed or the prior focus unrestored.
    fn drop(&mut self) {
        deactivate(&self.inner);
    }
}

fn activate(inner: &Rc<RefCell<TrapInner>>) {
    let (surface, container) = {
        let mut t = inner.borrow_mut();
        if t.active {
            return;
        }
        t.active = true;
        // Captured before focus moves into the container.
        t.restore_to = Some(t.surface.focused());
        let weak = Rc::downgrade(inner);
        t.key_guard = Some(t.surface.on_key(move |event, flow| {
            if let Some(trap) = weak.upgrade() {
                on_key(&trap, event, flow);
            }
        }));
        (t.surface.clone(), t.container.get())
    };
    tracing::debug!(container = ?container, "focus trap engaged");
    if let Some(container) = container {
        let first = surface.tree(|tree| tree.focusable_descendants(container).first().copied());
        if let Some(first) = first {
            surface.focus(first);
        }
    }
}

fn deactivate(inner: &Rc<RefCell<TrapInner>>) {
    let (surface, restore) = {
        let mut t = inner.borrow_mut();
        // Invalidate any queued activation even when not yet active.
        t.epoch = t.epoch.wrapping_add(1);
        if !t.active {
            return;
        }
        t.active = false;
        t.key_guard = None;
        (t.surface.clone(), t.restore_to.take())
    };
    tracing::debug!("focus trap released");
    if let Some(prior) = restore {
        match prior {
            // Fail-soft: the target may have left the tree or lost
            // focusability, in which case focus stays where it is.
            Some(id) => {
                let _ = surface.focus(id);
            }
            None => surface.blur(),
        }
    }
}

fn schedule_activate(inner: &Rc<RefCell<TrapInner>>) {
    let (surface, epoch) = {
        let t = inner.borrow();
        (t.surface.clone(), t.epoch)
    };
    let weak = Rc::downgrade(inner);
    surface.defer(move || {
        let Some(inner) = weak.upgrade() else { return };
        if inner.borrow().epoch != epoch {
            // Deactivated after this was queued; stale.
            return;
        }
        activate(&inner);
    });
}

fn on_key(inner: &Rc<RefCell<TrapInner>>, event: &KeyEvent, flow: &mut EventFlow) {
    let (surface, container, active) = {
        let t = inner.borrow();
        (t.surface.clone(), t.container.get(), t.active)
    };
    if !active || !event.is_tab() {
        return;
    }
    let Some(container) = container else { return };

    // Fresh set on every press; overlay content may have changed.
    let order = surface.tree(|tree| tree.focusable_descendants(container));
    if order.is_empty() {
        return;
    }
    let first = order[0];
    let last = *order.last().unwrap();
    let current = surface.focused();

    if event.shift() {
        if current == Some(first) {
            flow.prevent_default();
            surface.focus(last);
        }
    } else if current == Some(last) {
        flow.prevent_default();
        surface.focus(first);
    }
    // Intermediate positions fall through to native tab order.
}

// =========================================================================
// Tests
// =========================================================================
