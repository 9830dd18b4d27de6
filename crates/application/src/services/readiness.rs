use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Blocks until `fd` is readable or `timeout` elapses.
///
/// Returns `Ok(false)` on timeout and when the wait was interrupted by a
/// signal, so callers simply go round their loop again.
pub fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    // SAFETY: `pfd` is a valid pollfd for the duration of the call and nfds is 1.
    let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }

    // hangup and error conditions also wake the loop so the engine sees them
    Ok(ready > 0 && pfd.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0)
}
