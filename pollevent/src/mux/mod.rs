//! Wait-multiplexers over wait-capable handles.
//!
//! This module provides blocking calls that wait on a set of file
//! descriptors at once and report which of them became ready. A
//! [`PollableEvent`](crate::PollableEvent) takes part in such a wait by
//! registering its read handle next to sockets, pipes or any other
//! descriptor.
//!
//! Two backends share one interface:
//! - [`PollSet`] — built on `poll(2)`, available on every Unix target,
//! - [`EpollPoller`] — built on `epoll(7)`, Linux only.
//!
//! [`Poller`] names the preferred backend for the current target.

mod poll;

#[cfg(target_os = "linux")]
mod epoll;

pub use poll::PollSet;

#[cfg(target_os = "linux")]
pub use epoll::EpollPoller;

#[cfg(target_os = "linux")]
pub type Poller = EpollPoller;

#[cfg(not(target_os = "linux"))]
pub type Poller = PollSet;

/// Readiness a registered descriptor is waited on for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

impl Interest {
    /// Wait for the descriptor to become readable.
    pub const READABLE: Interest = Interest {
        read: true,
        write: false,
    };

    /// Wait for the descriptor to become writable.
    pub const WRITABLE: Interest = Interest {
        read: false,
        write: true,
    };

    /// Wait for either direction.
    pub const BOTH: Interest = Interest {
        read: true,
        write: true,
    };
}

/// An I/O event reported by a multiplexer.
///
/// An `Event` represents readiness information for a registered
/// file descriptor. Hang-up and error conditions are reported as
/// readable, so that the owner discovers them on its next read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Token associated with the registered file descriptor.
    pub token: usize,

    /// Indicates that the file descriptor is readable.
    pub readable: bool,

    /// Indicates that the file descriptor is writable.
    pub writable: bool,
}

/// Appends an event for `token`, merging it with an event already
/// reported for the same token in this wait.
pub(crate) fn push_event(events: &mut Vec<Event>, token: usize, readable: bool, writable: bool) {
    if let Some(e) = events.iter_mut().find(|e| e.token == token) {
        e.readable |= readable;
        e.writable |= writable;
    } else {
        events.push(Event {
            token,
            readable,
            writable,
        });
    }
}
