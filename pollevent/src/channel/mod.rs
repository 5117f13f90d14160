//! Wait-capable byte channels.
//!
//! A channel is a connected pair of non-blocking endpoints carrying bytes in
//! one direction. The event layer never transfers payload through it: the
//! presence of a buffered byte is the only information it carries, and it
//! is what makes the read end report "readable" to `poll(2)` or `epoll(7)`.
//!
//! Two kinds of pair are available, see [`ChannelKind`]. Both are created
//! non-blocking so that every single-byte operation on them either completes
//! immediately or reports [`Transfer::WouldBlock`].

pub(crate) mod unix;

use unix::{
    sys_close, sys_pending, sys_pipe, sys_poll, sys_read, sys_shutdown_read, sys_shutdown_write,
    sys_socketpair, sys_write,
};

use libc::{POLLERR, POLLIN, POLLNVAL, pollfd};
use std::io;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::{Duration, Instant};

/// The kind of endpoint pair backing a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelKind {
    /// An anonymous pipe. The read end is the pipe's read end.
    #[default]
    Pipe,

    /// A connected pair of Unix stream sockets, made unidirectional by
    /// shutting down the unused half on each side.
    SocketPair,
}

/// Outcome of a non-blocking single-byte transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// One byte was moved.
    Done,

    /// Nothing could be moved right now: the channel was empty on read,
    /// or had no room on write.
    WouldBlock,

    /// The peer endpoint is gone (end of stream).
    Closed,
}

/// One owned end of a channel.
///
/// The descriptor is closed when the endpoint is dropped. Use
/// [`Endpoint::close`] to observe a failed close.
#[derive(Debug)]
pub struct Endpoint {
    fd: RawFd,
}

impl Endpoint {
    fn from_raw(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Reads at most one byte without blocking.
    pub fn read_byte(&self) -> io::Result<Transfer> {
        let mut byte = [0u8; 1];

        loop {
            let n = sys_read(self.fd, &mut byte);

            if n > 0 {
                return Ok(Transfer::Done);
            }

            if n == 0 {
                return Ok(Transfer::Closed);
            }

            let err = io::Error::last_os_error();

            match err.kind() {
                io::ErrorKind::WouldBlock => return Ok(Transfer::WouldBlock),
                io::ErrorKind::Interrupted => continue,
                _ => return Err(err),
            }
        }
    }

    /// Writes exactly one byte without blocking.
    pub fn write_byte(&self) -> io::Result<Transfer> {
        let byte = [0u8; 1];

        loop {
            let n = sys_write(self.fd, &byte);

            if n > 0 {
                return Ok(Transfer::Done);
            }

            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero));
            }

            let err = io::Error::last_os_error();

            match err.kind() {
                io::ErrorKind::WouldBlock => return Ok(Transfer::WouldBlock),
                io::ErrorKind::Interrupted => continue,
                _ => return Err(err),
            }
        }
    }

    /// Returns whether the endpoint is readable right now.
    pub fn readable_now(&self) -> io::Result<bool> {
        self.wait_readable(Some(Duration::ZERO))
    }

    /// Blocks until the endpoint is readable or `timeout` elapses.
    ///
    /// A hang-up without buffered data is reported as "not readable";
    /// `POLLERR` and `POLLNVAL` are errors. Interrupted waits resume with
    /// the remaining time. A timeout too large to represent as a deadline
    /// waits indefinitely.
    pub fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let mut fds = [pollfd {
                fd: self.fd,
                events: POLLIN,
                revents: 0,
            }];

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));

            match sys_poll(&mut fds, remaining) {
                Ok(0) => return Ok(false),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }

            let revents = fds[0].revents;

            if revents & POLLNVAL != 0 {
                return Err(io::Error::from_raw_os_error(libc::EBADF));
            }

            if revents & POLLERR != 0 {
                return Err(io::Error::other("error condition on channel endpoint"));
            }

            return Ok(revents & POLLIN != 0);
        }
    }

    /// Returns the number of bytes buffered for reading.
    pub fn pending(&self) -> io::Result<usize> {
        sys_pending(self.fd)
    }

    /// Closes the endpoint, reporting failure.
    pub fn close(self) -> io::Result<()> {
        let fd = self.fd;
        mem::forget(self);
        sys_close(fd)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if let Err(e) = sys_close(self.fd) {
            log::error!("failed to close channel endpoint {}: {}", self.fd, e);
        }
    }
}

impl AsRawFd for Endpoint {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl AsFd for Endpoint {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the descriptor stays open for as long as `self` is alive.
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }
}

/// Creates a connected, non-blocking endpoint pair.
///
/// Returns `(read_side, write_side)`. Bytes written to `write_side` become
/// readable on `read_side`. On failure, every descriptor obtained so far is
/// closed.
pub fn pair(kind: ChannelKind, cloexec: bool) -> io::Result<(Endpoint, Endpoint)> {
    match kind {
        ChannelKind::Pipe => {
            let (r, w) = sys_pipe(cloexec)?;
            Ok((Endpoint::from_raw(r), Endpoint::from_raw(w)))
        }

        ChannelKind::SocketPair => {
            let (a, b) = sys_socketpair(cloexec)?;
            let read_side = Endpoint::from_raw(a);
            let write_side = Endpoint::from_raw(b);

            sys_shutdown_write(read_side.fd)?;
            sys_shutdown_read(write_side.fd)?;

            Ok((read_side, write_side))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_after_peer_dropped_is_closed() {
        for kind in [ChannelKind::Pipe, ChannelKind::SocketPair] {
            let (read_side, write_side) = pair(kind, true).expect("Failed to create pair");

            assert_eq!(
                read_side.read_byte().expect("read failed"),
                Transfer::WouldBlock
            );

            drop(write_side);

            assert_eq!(
                read_side.read_byte().expect("read failed"),
                Transfer::Closed,
                "{:?} should report end of stream",
                kind
            );
        }
    }

    #[test]
    fn test_wait_readable_with_unrepresentable_timeout() {
        let (read_side, write_side) = pair(ChannelKind::Pipe, true).expect("Failed to create pair");

        assert_eq!(write_side.write_byte().expect("write failed"), Transfer::Done);
        assert!(
            read_side
                .wait_readable(Some(Duration::MAX))
                .expect("wait failed")
        );
    }
}
