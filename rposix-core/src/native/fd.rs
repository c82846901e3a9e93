//! Descriptor-scoped primitives. Descriptors are bare integers; opening and closing them
//! is the caller's business.

use libc::{c_int, gid_t, mode_t, uid_t};

use crate::error::{sentinel, NativeResult};

pub fn dup(fd: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::dup(fd) })
}

pub fn close(fd: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::close(fd) })
}

pub fn fchmod(fd: c_int, mode: mode_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::fchmod(fd, mode) })
}

pub fn fchown(fd: c_int, owner: uid_t, group: gid_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::fchown(fd, owner, group) })
}

pub fn fsync(fd: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::fsync(fd) })
}

pub fn flock(fd: c_int, operation: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::flock(fd, operation) })
}

/// 1 when `fd` refers to a terminal, 0 otherwise.
pub fn isatty(fd: c_int) -> c_int {
    unsafe { libc::isatty(fd) }
}

pub fn fcntl(fd: c_int, cmd: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::fcntl(fd, cmd) })
}

pub fn fcntl_int(fd: c_int, cmd: c_int, arg: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::fcntl(fd, cmd, arg) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Errno;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn dup_yields_a_distinct_descriptor() {
        let file = tempfile::tempfile().unwrap();
        let fd = file.as_raw_fd();
        let copy = dup(fd).unwrap();
        assert_ne!(copy, fd);
        assert_eq!(close(copy), Ok(0));
        assert_eq!(close(-1), Err(Errno(libc::EBADF)));
    }

    #[test]
    fn fcntl_reads_descriptor_flags() {
        let file = tempfile::tempfile().unwrap();
        let fd = file.as_raw_fd();
        assert_eq!(fcntl_int(fd, libc::F_SETFD, libc::FD_CLOEXEC), Ok(0));
        let flags = fcntl(fd, libc::F_GETFD).unwrap();
        assert_eq!(flags & libc::FD_CLOEXEC, libc::FD_CLOEXEC);
    }
}
