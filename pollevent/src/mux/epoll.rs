//! Linux `epoll`-based multiplexer.
//!
//! Functionally equivalent to [`PollSet`](super::PollSet) and exposing the
//! same interface, but the interest list lives in the kernel, so a wait
//! costs the number of ready descriptors rather than registered ones.
//!
//! Responsibilities:
//! - Register file descriptors with read/write interests
//! - Block waiting for I/O readiness
//! - Support timed waits via the epoll timeout

use super::{Event, Interest, push_event};
use crate::channel::unix::{sys_close, timeout_ms};

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN,
    EPOLLOUT, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Capacity of the reusable kernel event buffer.
const EVENT_CAPACITY: usize = 64;

/// Linux `epoll` poller.
///
/// This poller owns:
/// - an `epoll` instance,
/// - a reusable event buffer.
///
/// The epoll descriptor is closed when the poller is dropped.
pub struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable buffer for epoll events.
    events: Vec<epoll_event>,

    /// Successful `register` calls minus successful `deregister` calls.
    registered: usize,
}

impl EpollPoller {
    /// Create a new `EpollPoller`.
    pub fn new() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            epoll,
            events: vec![epoll_event { events: 0, u64: 0 }; EVENT_CAPACITY],
            registered: 0,
        })
    }

    /// Register a file descriptor with the poller.
    ///
    /// Fails with `AlreadyExists` if the descriptor is already registered.
    pub fn register(&mut self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, token, interest)?;
        self.registered += 1;
        Ok(())
    }

    /// Update token and interest flags for an already registered descriptor.
    pub fn reregister(&mut self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_MOD, fd, token, interest)
    }

    /// Remove a file descriptor from the poller.
    pub fn deregister(&mut self, fd: RawFd) -> io::Result<()> {
        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        self.registered -= 1;
        Ok(())
    }

    /// Number of registrations made through this poller and not yet
    /// deregistered.
    ///
    /// The kernel drops the entry of a descriptor that is closed while
    /// registered, but this count does not: deregister before closing.
    pub fn len(&self) -> usize {
        self.registered
    }

    /// Returns `true` if no descriptor is registered.
    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// Poll for I/O readiness events.
    ///
    /// Blocks until:
    /// - at least one file descriptor becomes ready,
    /// - or the optional timeout expires.
    ///
    /// `events` is cleared first. An interrupted wait returns with no events.
    pub fn wait(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        events.clear();

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.len() as i32,
                timeout_ms(timeout),
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        for ev in &self.events[..n as usize] {
            let token = ev.u64 as usize;
            let flags = ev.events;

            let readable = flags & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0;
            let writable = flags & (EPOLLOUT as u32) != 0;

            push_event(events, token, readable, writable);
        }

        Ok(())
    }

    fn ctl(&self, op: i32, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        let mut flags = 0;

        if interest.read {
            flags |= EPOLLIN;
        }
        if interest.write {
            flags |= EPOLLOUT;
        }

        let mut event = epoll_event {
            events: flags as u32,
            u64: token as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, op, fd, &mut event) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        if let Err(e) = sys_close(self.epoll) {
            log::error!("failed to close epoll instance {}: {}", self.epoll, e);
        }
    }
}
