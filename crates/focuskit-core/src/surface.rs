#![forbid(unsafe_code)]

//! The input surface: process-wide focus, global listener registries, and
//! the deferred task queue.
//!
//! [`InputSurface`] is the single shared object every controller instance
//! attaches to — the analogue of the host document. Listeners are registered
//! surface-wide (not per container) on purpose: detecting "outside" a
//! container requires seeing every event, and each controller filters to its
//! own scope. Dispatch is single-threaded; handlers never run concurrently,
//! only interleaved in registration order.
//!
//! # Invariants
//!
//! 1. Listeners run in registration order; a dead [`ListenerGuard`] entry
//!    is pruned on the next dispatch.
//! 2. Focus only ever rests on an element that was focusable at the moment
//!    it was focused. Restoration re-checks against the live tree.
//! 3. Deferred tasks are single-shot and run in FIFO order on
//!    [`InputSurface::flush_deferred`]; tasks queued during a flush run in
//!    the same flush.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::event::{EventFlow, KeyEvent, PointerEvent};
use crate::tree::{ElementTree, NodeId};

type KeyCallbackRc = Rc<dyn Fn(&KeyEvent, &mut EventFlow)>;
type KeyCallbackWeak = Weak<dyn Fn(&KeyEvent, &mut EventFlow)>;
type PointerCallbackRc = Rc<dyn Fn(&PointerEvent)>;
type PointerCallbackWeak = Weak<dyn Fn(&PointerEvent)>;
type DeferredTask = Box<dyn FnOnce()>;

struct SurfaceInner {
    tree: ElementTree,
    focused: Option<NodeId>,
    key_listeners: Vec<KeyCallbackWeak>,
    pointer_listeners: Vec<PointerCallbackWeak>,
    deferred: VecDeque<DeferredTask>,
}

/// Cloneable handle to the shared input surface.
///
/// All clones refer to the same tree, focus state, and listener registries.
pub struct InputSurface {
    inner: Rc<RefCell<SurfaceInner>>,
}

impl Clone for InputSurface {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for InputSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("InputSurface")
            .field("elements", &inner.tree.len())
            .field("focused", &inner.focused)
            .field("key_listeners", &inner.key_listeners.len())
            .field("pointer_listeners", &inner.pointer_listeners.len())
            .field("deferred", &inner.deferred.len())
            .finish()
    }
}

impl Default for InputSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SurfaceInner {
                tree: ElementTree::new(),
                focused: None,
                key_listeners: Vec::new(),
                pointer_listeners: Vec::new(),
                deferred: VecDeque::new(),
            })),
        }
    }

    /// Read the element tree.
    pub fn tree<R>(&self, f: impl FnOnce(&ElementTree) -> R) -> R {
        f(&self.inner.borrow().tree)
    }

    /// Mutate the element tree.
    ///
    /// If the focused element disappears, focus is cleared.
    pub fn tree_mut<R>(&self, f: impl FnOnce(&mut ElementTree) -> R) -> R {
        let mut inner = self.inner.borrow_mut();
        let out = f(&mut inner.tree);
        if let Some(id) = inner.focused
            && inner.tree.get(id).is_none()
        {
            inner.focused = None;
        }
        out
    }

    /// Currently focused element, if any.
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().focused
    }

    /// Move focus to `id`. Returns `false` (focus unchanged) when the
    /// element does not exist or is not focusable.
    pub fn focus(&self, id: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.tree.get(id).is_some_and(|e| e.is_focusable()) {
            return false;
        }
        if inner.focused != Some(id) {
            tracing::trace!(from = ?inner.focused, to = id, "focus moved");
            inner.focused = Some(id);
        }
        true
    }

    /// Clear focus.
    pub fn blur(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.focused.is_some() {
            tracing::trace!(from = ?inner.focused, "focus cleared");
            inner.focused = None;
        }
    }

    /// Register a surface-wide key-down listener.
    ///
    /// The listener stays registered for the lifetime of the returned guard.
    #[must_use = "dropping the guard unregisters the listener"]
    pub fn on_key(&self, callback: impl Fn(&KeyEvent, &mut EventFlow) + 'static) -> ListenerGuard {
        let strong: KeyCallbackRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .key_listeners
            .push(Rc::downgrade(&strong));
        ListenerGuard {
            _guard: Box::new(strong),
        }
    }

    /// Register a surface-wide pointer-down listener.
    #[must_use = "dropping the guard unregisters the listener"]
    pub fn on_pointer_down(&self, callback: impl Fn(&PointerEvent) + 'static) -> ListenerGuard {
        let strong: PointerCallbackRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .pointer_listeners
            .push(Rc::downgrade(&strong));
        ListenerGuard {
            _guard: Box::new(strong),
        }
    }

    /// Dispatch a key-down event.
    ///
    /// Listeners run first, in registration order, sharing one [`EventFlow`].
    /// If none prevented the default and the key is Tab, native tab
    /// navigation moves focus through the surface-wide tab order.
    pub fn dispatch_key(&self, event: KeyEvent) {
        let callbacks: Vec<KeyCallbackRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.key_listeners.retain(|w| w.strong_count() > 0);
            inner.key_listeners.iter().filter_map(Weak::upgrade).collect()
        };
        let mut flow = EventFlow::new();
        for cb in &callbacks {
            cb(&event, &mut flow);
        }
        if !flow.default_prevented() && event.is_tab() {
            self.native_tab_move(event.shift());
        }
    }

    /// Dispatch a pointer-down event to all live pointer listeners.
    pub fn dispatch_pointer_down(&self, event: PointerEvent) {
        let callbacks: Vec<PointerCallbackRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.pointer_listeners.retain(|w| w.strong_count() > 0);
            inner
                .pointer_listeners
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        for cb in &callbacks {
            cb(&event);
        }
    }

    /// Queue a single-shot task for the next [`InputSurface::flush_deferred`].
    ///
    /// The host calls `flush_deferred` once per render pass, so a deferred
    /// task observes a fully mounted tree.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.borrow_mut().deferred.push_back(Box::new(task));
    }

    /// Run all queued deferred tasks in FIFO order.
    ///
    /// Tasks queued by a running task are drained in the same flush.
    pub fn flush_deferred(&self) {
        loop {
            let task = self.inner.borrow_mut().deferred.pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Pending deferred task count.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.inner.borrow().deferred.len()
    }

    /// Native tab-order navigation across the whole surface, wrapping at
    /// both ends. No-op when nothing is focusable.
    fn native_tab_move(&self, backward: bool) {
        let (order, current) = {
            let inner = self.inner.borrow();
            (inner.tree.focusables(), inner.focused)
        };
        if order.is_empty() {
            return;
        }
        let next = match current.and_then(|id| order.iter().position(|c| *c == id)) {
            None => {
                if backward {
                    *order.last().unwrap()
                } else {
                    order[0]
                }
            }
            Some(idx) if backward => {
                if idx > 0 {
                    order[idx - 1]
                } else {
                    *order.last().unwrap()
                }
            }
            Some(idx) => {
                if idx + 1 < order.len() {
                    order[idx + 1]
                } else {
                    order[0]
                }
            }
        };
        self.focus(next);
    }
}

/// RAII guard for a surface listener.
///
/// Holds the only strong reference to the callback; dropping the guard
/// makes the registry's weak entry dead, so the listener never fires again.
pub struct ListenerGuard {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
