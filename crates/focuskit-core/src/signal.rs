#![forbid(unsafe_code)]

//! Shared reactive value with edge-aware change notification.
//!
//! [`Signal<T>`] is the contract between an overlay component and its
//! controllers: the component owns a `Signal<bool>` ("is open"), the
//! controllers subscribe and dispatch on each transition. Subscribers are
//! handed **both the previous and the new value**, so lifecycle handling is
//! explicit edge detection rather than value observation — exactly one
//! dispatch per edge, none when `set` is a no-op.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: calling `set()` from within a subscriber callback
//!   panics (`RefCell` borrow rules). Re-entrant mutation of the same signal
//!   indicates a design bug in the subscriber graph.
//! - **Dangling subscribers**: dropping a [`Subscription`] guard silences its
//!   callback; the dead entry is pruned on the next notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Subscriber callback: `(previous, new)`.
type CallbackRc<T> = Rc<dyn Fn(&T, &T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T, &T)>;

struct SignalInner<T> {
    value: T,
    /// Weak so a dropped [`Subscription`] guard silences its callback.
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared value with change notification.
///
/// Cloning a `Signal` creates another handle to the **same** state; all
/// handles see the same value and share subscribers.
///
/// # Invariants
///
/// 1. `set(v)` where `v == current` notifies nobody.
/// 2. Subscribers run in registration order.
/// 3. Each value change notifies each live subscriber exactly once.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Create a signal holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Set a new value. No-op (no notification) when equal to the current
    /// value by `PartialEq`.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within a subscriber callback.
    pub fn set(&self, value: T) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            std::mem::replace(&mut inner.value, value)
        };
        self.notify(&previous);
    }

    /// Subscribe to transitions. The callback receives `(previous, new)` on
    /// every value change.
    ///
    /// Returns a [`Subscription`] guard; dropping it unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner.borrow_mut().subscribers.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Number of registered subscribers (dead guards included until the
    /// next notification prunes them).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self, previous: &T) {
        // Collect live callbacks first so none runs under the borrow.
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        let current = self.inner.borrow().value.clone();
        for cb in &callbacks {
            cb(previous, &current);
        }
    }
}

/// RAII guard for a signal subscriber.
///
/// Holds the only strong reference to the callback; dropping the guard makes
/// the signal's weak entry dead, so the callback never runs again.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
