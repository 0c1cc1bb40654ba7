#![forbid(unsafe_code)]

//! Core: element tree, input events, focus state, and reactive signals.
//!
//! # Role in focuskit
//! `focuskit-core` is the substrate overlay controllers operate on. It owns
//! the shared [`InputSurface`] (tree + process-wide focus + global listener
//! registries + deferred task queue) and the [`Signal`] primitive overlay
//! components drive their controllers with.
//!
//! # Primary responsibilities
//! - **ElementTree**: DOM-like arena with live containment and focusability
//!   queries, recomputed per call.
//! - **InputSurface**: single-threaded event dispatch, focus ownership, and
//!   the post-render deferred queue.
//! - **Signal**: edge-notifying reactive value with RAII subscriptions.
//!
//! # How it fits in the system
//! `focuskit-overlay` consumes these types to implement the focus trap and
//! outside-click watcher; host components own the surface and signals.

pub mod event;
pub mod signal;
pub mod surface;
pub mod tree;

pub use event::{EventFlow, KeyCode, KeyEvent, Modifiers, PointerButton, PointerEvent};
pub use signal::{Signal, Subscription};
pub use surface::{InputSurface, ListenerGuard};
pub use tree::{Element, ElementKind, ElementTree, NodeId, NodeRef};
