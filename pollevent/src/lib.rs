//! # pollevent
//!
//! **pollevent** provides a binary semaphore that can be waited on with
//! `poll(2)` or `epoll(7)` next to sockets, pipes and any other descriptor.
//!
//! Hosts that only expose stream-like handles to their blocking wait call
//! have no native event object to mix into that wait. A [`PollableEvent`]
//! builds one from a non-blocking byte channel: one buffered byte means
//! SET, an empty channel means CLEAR, and the channel's read end is the
//! handle handed to the multiplexer.
//!
//! - **Binary semantics**: `set` and `clear` overwrite the state and are
//!   idempotent; the channel never holds more than one byte
//! - **Thread safe**: any thread may call `set` or `clear` concurrently
//! - **Never blocking**: both transitions are bounded non-blocking syscalls
//! - **Multiplexers** over `poll(2)` and `epoll(7)` in [`mux`]
//!
//! ## Quick Start
//!
//! ```rust
//! use pollevent::PollableEvent;
//! use pollevent::mux::{Interest, Poller};
//! use std::os::fd::AsRawFd;
//! use std::time::Duration;
//!
//! let event = PollableEvent::new().unwrap();
//! let mut poller = Poller::new().unwrap();
//! poller.register(event.as_raw_fd(), 0, Interest::READABLE).unwrap();
//!
//! event.set().unwrap();
//!
//! let mut events = Vec::new();
//! poller.wait(&mut events, Some(Duration::from_secs(1))).unwrap();
//! assert_eq!(events.len(), 1);
//! assert!(events[0].readable);
//!
//! event.clear().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`channel`] — Non-blocking endpoint pairs
//! - [`mux`] — Wait-multiplexers
//! - [`sync`] — Spin lock

mod error;
mod event;

pub mod channel;
pub mod mux;
pub mod sync;

pub use channel::ChannelKind;
pub use error::{Error, Op, Result};
pub use event::PollableEvent;
pub use event::builder::EventBuilder;
