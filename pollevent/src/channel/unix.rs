use libc::{
    AF_UNIX, FIONREAD, SHUT_RD, SHUT_WR, SOCK_STREAM, c_int, close, ioctl, pollfd, read, shutdown,
    socketpair, write,
};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Reads from a file descriptor into the given buffer.
///
/// Returns the number of bytes read, or a negative value on error.
/// The file descriptor **must** be non-blocking.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> isize {
    unsafe { read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) }
}

/// Writes the buffer to a file descriptor.
///
/// Returns the number of bytes written, or a negative value on error.
/// The file descriptor **must** be non-blocking.
pub(crate) fn sys_write(fd: RawFd, buffer: &[u8]) -> isize {
    unsafe { write(fd, buffer.as_ptr() as *const _, buffer.len()) }
}

/// Closes a file descriptor, reporting any failure.
pub(crate) fn sys_close(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { close(fd) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Sets a file descriptor to non-blocking mode.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_set_nonblocking(fd: RawFd) -> io::Result<()> {
    use libc::{F_GETFL, F_SETFL, O_NONBLOCK, fcntl};

    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Sets the close-on-exec flag of a file descriptor.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_set_cloexec(fd: RawFd) -> io::Result<()> {
    use libc::{F_GETFD, F_SETFD, FD_CLOEXEC, fcntl};

    let flags = unsafe { fcntl(fd, F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFD, flags | FD_CLOEXEC) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Creates a non-blocking pipe.
///
/// Returns `(read_end, write_end)`. Both flags are applied atomically by
/// `pipe2(2)`.
#[cfg(target_os = "linux")]
pub(crate) fn sys_pipe(cloexec: bool) -> io::Result<(RawFd, RawFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    let mut flags = libc::O_NONBLOCK;
    if cloexec {
        flags |= libc::O_CLOEXEC;
    }

    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), flags) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((fds[0], fds[1]))
}

/// Creates a non-blocking pipe.
///
/// Returns `(read_end, write_end)`.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_pipe(cloexec: bool) -> io::Result<(RawFd, RawFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = configure_pair(fds, cloexec) {
        close_pair(fds);
        return Err(e);
    }

    Ok((fds[0], fds[1]))
}

/// Creates a connected pair of non-blocking Unix stream sockets.
///
/// Both flags are applied atomically through the socket type.
#[cfg(target_os = "linux")]
pub(crate) fn sys_socketpair(cloexec: bool) -> io::Result<(RawFd, RawFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    let mut ty = SOCK_STREAM | libc::SOCK_NONBLOCK;
    if cloexec {
        ty |= libc::SOCK_CLOEXEC;
    }

    let rc = unsafe { socketpair(AF_UNIX, ty, 0, fds.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((fds[0], fds[1]))
}

/// Creates a connected pair of non-blocking Unix stream sockets.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_socketpair(cloexec: bool) -> io::Result<(RawFd, RawFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    let rc = unsafe { socketpair(AF_UNIX, SOCK_STREAM, 0, fds.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = configure_pair(fds, cloexec) {
        close_pair(fds);
        return Err(e);
    }

    Ok((fds[0], fds[1]))
}

/// Applies the flags that cannot be set at creation on this target.
#[cfg(not(target_os = "linux"))]
fn configure_pair(fds: [c_int; 2], cloexec: bool) -> io::Result<()> {
    for fd in fds {
        sys_set_nonblocking(fd)?;
        if cloexec {
            sys_set_cloexec(fd)?;
        }
    }
    Ok(())
}

/// Closes both ends of a half-initialized pair, ignoring errors.
#[cfg(not(target_os = "linux"))]
fn close_pair(fds: [c_int; 2]) {
    for fd in fds {
        let _ = sys_close(fd);
    }
}

/// Shuts down the reading half of a socket.
pub(crate) fn sys_shutdown_read(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { shutdown(fd, SHUT_RD) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Shuts down the writing half of a socket.
pub(crate) fn sys_shutdown_write(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { shutdown(fd, SHUT_WR) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Returns the number of bytes that can be read without blocking.
pub(crate) fn sys_pending(fd: RawFd) -> io::Result<usize> {
    let mut n: c_int = 0;

    let rc = unsafe { ioctl(fd, FIONREAD, &mut n as *mut c_int) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Waits on a set of descriptors with `poll(2)`.
///
/// `None` blocks indefinitely. Returns the number of descriptors with
/// non-zero `revents`.
pub(crate) fn sys_poll(fds: &mut [pollfd], timeout: Option<Duration>) -> io::Result<usize> {
    let n = unsafe {
        libc::poll(
            fds.as_mut_ptr(),
            fds.len() as libc::nfds_t,
            timeout_ms(timeout),
        )
    };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Converts an optional timeout to the millisecond form `poll(2)` and
/// `epoll_wait(2)` expect.
///
/// Sub-millisecond remainders round up.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> c_int {
    match timeout {
        None => -1,
        Some(t) => {
            let mut ms = t.as_millis();
            if t.as_nanos() > ms * 1_000_000 {
                ms += 1;
            }
            ms.min(c_int::MAX as u128) as c_int
        }
    }
}
