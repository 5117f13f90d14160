use std::fmt;
use std::io;

/// The state transition or probe during which a fault was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Set,
    Clear,
    Probe,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Set => f.write_str("set"),
            Op::Clear => f.write_str("clear"),
            Op::Probe => f.write_str("probe"),
        }
    }
}

/// Errors reported by a [`PollableEvent`](crate::PollableEvent).
///
/// "Would block", "already full" and "empty" conditions on the channel are
/// never errors; they are the idempotent branches of `set` and `clear`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The endpoint pair could not be allocated.
    #[error("failed to allocate endpoint pair: {0}")]
    Exhausted(#[source] io::Error),

    /// A genuine I/O fault on an otherwise valid endpoint.
    #[error("{op} failed on channel endpoint: {source}")]
    Fault {
        op: Op,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn fault(op: Op, source: io::Error) -> Self {
        Error::Fault { op, source }
    }

    /// Returns the OS error code underlying this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Exhausted(e) => e.raw_os_error(),
            Error::Fault { source, .. } => source.raw_os_error(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
