#![forbid(unsafe_code)]

//! Overlay controllers: focus trapping and outside-click detection.
//!
//! These are the two behaviors every overlay component (modal, drawer,
//! popover) needs and none should reimplement:
//!
//! - [`FocusTrap`] confines Tab navigation to a container while the overlay
//!   is open and restores prior focus when it closes.
//! - [`OutsideClickWatcher`] invokes a callback when a pointer-down lands
//!   outside the overlay's container.
//!
//! Both attach to a shared [`focuskit_core::InputSurface`], hold their
//! listeners as RAII guards, and degrade every missing-precondition case to
//! a no-op — focus management must never take the host down.

pub mod outside;
pub mod trap;

pub use outside::OutsideClickWatcher;
pub use trap::FocusTrap;
