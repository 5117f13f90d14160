//! Creation under descriptor exhaustion.
//!
//! Kept in a binary of its own: the test lowers the process descriptor
//! limit and fills the table, which would break any test running next to it.

use pollevent::{ChannelKind, Error, PollableEvent};
use std::io;
use std::os::fd::AsRawFd;

/// Lowers the soft descriptor limit, returning the previous limits.
fn lower_nofile_limit(soft: libc::rlim_t) -> libc::rlimit {
    let mut previous = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut previous) };
    assert_eq!(rc, 0, "getrlimit failed: {}", io::Error::last_os_error());

    let lowered = libc::rlimit {
        rlim_cur: soft.min(previous.rlim_cur),
        rlim_max: previous.rlim_max,
    };
    let rc = unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &lowered) };
    assert_eq!(rc, 0, "setrlimit failed: {}", io::Error::last_os_error());

    previous
}

/// Duplicates `fd` until the descriptor table is full.
fn fill_descriptor_table(fd: i32) -> Vec<i32> {
    let mut filler = Vec::new();

    loop {
        let dup = unsafe { libc::dup(fd) };
        if dup < 0 {
            let err = io::Error::last_os_error();
            assert_eq!(err.raw_os_error(), Some(libc::EMFILE), "dup failed: {}", err);
            return filler;
        }
        filler.push(dup);
    }
}

#[test]
fn test_create_reports_exhaustion() {
    let anchor = PollableEvent::new().expect("Failed to create event");
    let previous = lower_nofile_limit(256);

    let filler = fill_descriptor_table(anchor.as_raw_fd());

    for kind in [ChannelKind::Pipe, ChannelKind::SocketPair] {
        let result = PollableEvent::builder().channel(kind).build();

        match &result {
            Err(Error::Exhausted(source)) => {
                assert_eq!(source.raw_os_error(), Some(libc::EMFILE));
            }
            other => panic!("{:?}: expected exhaustion, got {:?}", kind, other),
        }

        let err = result.expect_err("creation must fail");
        assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
    }

    for fd in filler {
        unsafe { libc::close(fd) };
    }
    let rc = unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &previous) };
    assert_eq!(rc, 0, "setrlimit failed: {}", io::Error::last_os_error());

    let event = PollableEvent::new().expect("creation must succeed once descriptors are free");
    event.set().expect("set failed");
    assert!(event.is_set().expect("is_set failed"));
}
