//! Synchronization primitives for pollevent.
//!
//! The current primitives include:
//! - [`SpinLock`] — a busy-waiting mutual exclusion lock.
//!
//! ## Design notes
//!
//! - Critical sections guarded by these locks are a handful of
//!   non-blocking syscalls, never a blocking wait.
//! - Locks are safe to share between threads using `Arc` or plain
//!   references.

mod spin;

pub use spin::{SpinLock, SpinLockGuard};
