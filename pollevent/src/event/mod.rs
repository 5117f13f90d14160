//! The pollable event.
//!
//! A [`PollableEvent`] is a binary semaphore whose state is mirrored by the
//! readiness of a file descriptor. It owns a one-way byte channel:
//!
//! - SET   ⇔ exactly one byte is buffered, the read side polls readable;
//! - CLEAR ⇔ nothing is buffered, the read side does not poll readable.
//!
//! `set` and `clear` overwrite the state regardless of its current value.
//! Each direction has its own spin lock, so a `set` on one thread and a
//! `clear` on another never contend, while concurrent calls in the same
//! direction are serialized and can never buffer a second byte.

pub mod builder;

use crate::channel::{self, ChannelKind, Endpoint, Transfer};
use crate::error::{Error, Op, Result};
use crate::sync::SpinLock;

use builder::EventBuilder;
use log::{debug, error, trace};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

/// A binary semaphore that can be waited on together with other
/// descriptors.
///
/// # Examples
///
/// ```
/// use pollevent::PollableEvent;
///
/// let event = PollableEvent::new().unwrap();
/// assert!(!event.is_set().unwrap());
///
/// event.set().unwrap();
/// event.set().unwrap();
/// assert_eq!(event.buffered().unwrap(), 1);
///
/// event.clear().unwrap();
/// assert!(!event.is_set().unwrap());
/// ```
#[derive(Debug)]
pub struct PollableEvent {
    /// Endpoint observed by multiplexers. Only ever lent out.
    read_side: Endpoint,

    /// Endpoint the state byte is written to. Never exposed.
    write_side: Endpoint,

    /// Serializes every read from `read_side`.
    read_lock: SpinLock<()>,

    /// Serializes every write to `write_side`.
    write_lock: SpinLock<()>,
}

impl PollableEvent {
    /// Creates a CLEAR event backed by a pipe.
    ///
    /// Fails with [`Error::Exhausted`] if the pipe cannot be allocated.
    pub fn new() -> Result<Self> {
        EventBuilder::new().build()
    }

    /// Returns a builder to configure the event before creation.
    pub fn builder() -> EventBuilder {
        EventBuilder::new()
    }

    pub(crate) fn create(kind: ChannelKind, cloexec: bool) -> Result<Self> {
        let (read_side, write_side) = channel::pair(kind, cloexec).map_err(Error::Exhausted)?;

        debug!(
            "created pollable event over {:?} (read {}, write {})",
            kind,
            read_side.as_raw_fd(),
            write_side.as_raw_fd()
        );

        Ok(Self {
            read_side,
            write_side,
            read_lock: SpinLock::new(()),
            write_lock: SpinLock::new(()),
        })
    }

    /// Releases both endpoints.
    ///
    /// Dropping the event has the same effect; this method only makes the
    /// end of the lifetime explicit. A failure to close an endpoint cannot
    /// be recovered from and is logged.
    pub fn destroy(self) {
        let PollableEvent {
            read_side,
            write_side,
            ..
        } = self;

        let (read_fd, write_fd) = (read_side.as_raw_fd(), write_side.as_raw_fd());

        if let Err(e) = read_side.close() {
            error!("failed to release read side {} of pollable event: {}", read_fd, e);
        }
        if let Err(e) = write_side.close() {
            error!("failed to release write side {} of pollable event: {}", write_fd, e);
        }

        debug!("destroyed pollable event (read {}, write {})", read_fd, write_fd);
    }

    /// Transitions the event to SET.
    ///
    /// Setting an event that is already SET succeeds without effect.
    pub fn set(&self) -> Result<()> {
        let _guard = self.write_lock.lock();

        // Only setters add bytes and they are serialized here, so a byte
        // seen now stays the only one.
        if self.probe()? {
            trace!("pollable event {} already set", self.read_side.as_raw_fd());
            return Ok(());
        }

        match self.write_side.write_byte() {
            Ok(Transfer::Done) => {
                trace!("pollable event {} set", self.read_side.as_raw_fd());
                Ok(())
            }
            Ok(Transfer::WouldBlock) => {
                trace!("pollable event {} already full", self.read_side.as_raw_fd());
                Ok(())
            }
            Ok(Transfer::Closed) => Err(Error::fault(
                Op::Set,
                io::Error::from(io::ErrorKind::BrokenPipe),
            )),
            Err(e) => Err(Error::fault(Op::Set, e)),
        }
    }

    /// Transitions the event to CLEAR.
    ///
    /// Clearing an event that is already CLEAR succeeds without effect.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.read_lock.lock();

        match self.read_side.read_byte() {
            Ok(Transfer::Done) => {
                trace!("pollable event {} cleared", self.read_side.as_raw_fd());
                Ok(())
            }
            Ok(Transfer::WouldBlock) => {
                trace!("pollable event {} already clear", self.read_side.as_raw_fd());
                Ok(())
            }
            Ok(Transfer::Closed) => Err(Error::fault(
                Op::Clear,
                io::Error::from(io::ErrorKind::UnexpectedEof),
            )),
            Err(e) => Err(Error::fault(Op::Clear, e)),
        }
    }

    /// Returns whether the event is SET right now.
    ///
    /// The answer is a snapshot; another thread may change the state
    /// before the caller acts on it.
    pub fn is_set(&self) -> Result<bool> {
        self.probe()
    }

    /// Blocks until the event is SET or `timeout` elapses.
    ///
    /// Returns `true` if the event was observed SET. The event is not
    /// cleared. `None` waits indefinitely.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        self.read_side
            .wait_readable(timeout)
            .map_err(|e| Error::fault(Op::Probe, e))
    }

    /// Returns the number of bytes buffered in the channel.
    ///
    /// This is `1` while the event is SET and `0` while it is CLEAR.
    pub fn buffered(&self) -> Result<usize> {
        self.read_side
            .pending()
            .map_err(|e| Error::fault(Op::Probe, e))
    }

    /// Returns the handle to register with a multiplexer.
    ///
    /// The handle reports readable exactly while the event is SET.
    pub fn read_handle(&self) -> BorrowedFd<'_> {
        self.read_side.as_fd()
    }

    fn probe(&self) -> Result<bool> {
        self.read_side
            .readable_now()
            .map_err(|e| Error::fault(Op::Probe, e))
    }
}

impl AsFd for PollableEvent {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.read_handle()
    }
}

impl AsRawFd for PollableEvent {
    fn as_raw_fd(&self) -> RawFd {
        self.read_side.as_raw_fd()
    }
}
