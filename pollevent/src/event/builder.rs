use super::PollableEvent;
use crate::channel::ChannelKind;
use crate::error::Result;

/// Builder for configuring and creating a pollable event.
///
/// # Examples
///
/// ```
/// use pollevent::{ChannelKind, PollableEvent};
///
/// let event = PollableEvent::builder()
///     .channel(ChannelKind::SocketPair)
///     .initially_set(true)
///     .build()
///     .unwrap();
///
/// assert!(event.is_set().unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct EventBuilder {
    /// Kind of endpoint pair backing the event.
    channel: ChannelKind,

    /// Whether both descriptors carry `FD_CLOEXEC`.
    cloexec: bool,

    /// Whether the event is SET when `build` returns.
    initially_set: bool,
}

impl EventBuilder {
    /// Creates a new `EventBuilder` with default configuration.
    ///
    /// By default the event is backed by a close-on-exec pipe and starts
    /// CLEAR.
    pub fn new() -> Self {
        Self {
            channel: ChannelKind::Pipe,
            cloexec: true,
            initially_set: false,
        }
    }

    /// Sets the kind of endpoint pair backing the event.
    pub fn channel(mut self, kind: ChannelKind) -> Self {
        self.channel = kind;
        self
    }

    /// Sets whether the descriptors are closed on `exec`.
    pub fn cloexec(mut self, cloexec: bool) -> Self {
        self.cloexec = cloexec;
        self
    }

    /// Sets whether the event starts SET.
    pub fn initially_set(mut self, set: bool) -> Self {
        self.initially_set = set;
        self
    }

    /// Builds the event with the configured options.
    ///
    /// If the initial `set` fails, the endpoints are released and the
    /// error is returned.
    pub fn build(self) -> Result<PollableEvent> {
        let event = PollableEvent::create(self.channel, self.cloexec)?;

        if self.initially_set {
            event.set()?;
        }

        Ok(event)
    }
}

impl Default for EventBuilder {
    /// Creates a default `EventBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
