//! Portable `poll(2)`-based multiplexer.

use super::{Event, Interest, push_event};
use crate::channel::unix::sys_poll;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, c_short, pollfd};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// A set of descriptors waited on with `poll(2)`.
///
/// Registrations are kept as the `pollfd` array itself; each
/// [`wait`](PollSet::wait) hands it to the kernel as is.
#[derive(Default)]
pub struct PollSet {
    /// Descriptors handed to `poll(2)`.
    fds: Vec<pollfd>,

    /// Token of each entry in `fds`, at the same index.
    tokens: Vec<usize>,
}

impl PollSet {
    /// Creates an empty set.
    pub fn new() -> io::Result<Self> {
        Ok(Self::default())
    }

    /// Register a file descriptor with the set.
    ///
    /// Fails with `AlreadyExists` if the descriptor is already registered.
    pub fn register(&mut self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        if self.position(fd).is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "descriptor already registered",
            ));
        }

        self.fds.push(pollfd {
            fd,
            events: flags(interest),
            revents: 0,
        });
        self.tokens.push(token);

        Ok(())
    }

    /// Update token and interest flags for an already registered descriptor.
    pub fn reregister(&mut self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        let index = self.position(fd).ok_or_else(not_registered)?;

        self.fds[index].events = flags(interest);
        self.tokens[index] = token;

        Ok(())
    }

    /// Remove a file descriptor from the set.
    pub fn deregister(&mut self, fd: RawFd) -> io::Result<()> {
        let index = self.position(fd).ok_or_else(not_registered)?;

        self.fds.swap_remove(index);
        self.tokens.swap_remove(index);

        Ok(())
    }

    /// Number of registrations not yet deregistered.
    ///
    /// A descriptor closed while registered still counts, and is reported
    /// readable by every wait until it is deregistered.
    pub fn len(&self) -> usize {
        self.fds.len()
    }

    /// Returns `true` if no descriptor is registered.
    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
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

        for fd in &mut self.fds {
            fd.revents = 0;
        }

        match sys_poll(&mut self.fds, timeout) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(err) => return Err(err),
        }

        for (fd, &token) in self.fds.iter().zip(&self.tokens) {
            if fd.revents == 0 {
                continue;
            }

            let readable = fd.revents & (POLLIN | POLLERR | POLLHUP | POLLNVAL) != 0;
            let writable = fd.revents & POLLOUT != 0;

            push_event(events, token, readable, writable);
        }

        Ok(())
    }

    fn position(&self, fd: RawFd) -> Option<usize> {
        self.fds.iter().position(|p| p.fd == fd)
    }
}

fn flags(interest: Interest) -> c_short {
    let mut flags = 0;

    if interest.read {
        flags |= POLLIN;
    }
    if interest.write {
        flags |= POLLOUT;
    }

    flags
}

fn not_registered() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "descriptor not registered")
}
