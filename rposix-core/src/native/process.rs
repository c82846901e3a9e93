//! Identity, priority, resource limits and the bits of process state that are plain integers.

use libc::{c_int, gid_t, id_t, mode_t, pid_t, rlimit, uid_t};

use crate::error::{sentinel, Errno, NativeResult};

pub fn getuid() -> uid_t {
    unsafe { libc::getuid() }
}

pub fn geteuid() -> uid_t {
    unsafe { libc::geteuid() }
}

pub fn getgid() -> gid_t {
    unsafe { libc::getgid() }
}

pub fn getegid() -> gid_t {
    unsafe { libc::getegid() }
}

pub fn getpid() -> pid_t {
    unsafe { libc::getpid() }
}

pub fn getppid() -> pid_t {
    unsafe { libc::getppid() }
}

pub fn getpgrp() -> pid_t {
    unsafe { libc::getpgrp() }
}

pub fn getpgid(pid: pid_t) -> NativeResult<pid_t> {
    sentinel(unsafe { libc::getpgid(pid) })
}

pub fn setsid() -> NativeResult<pid_t> {
    sentinel(unsafe { libc::setsid() })
}

pub fn setuid(uid: uid_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::setuid(uid) })
}

pub fn seteuid(uid: uid_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::seteuid(uid) })
}

pub fn setgid(gid: gid_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::setgid(gid) })
}

/// Returns the previous mask.
pub fn umask(mask: mode_t) -> mode_t {
    unsafe { libc::umask(mask) }
}

/// Raw priority. -1 is a legitimate priority here, so no error is derived from it.
pub fn getpriority(which: c_int, who: id_t) -> c_int {
    unsafe { libc::getpriority(which as _, who) }
}

pub fn setpriority(which: c_int, who: id_t, prio: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::setpriority(which as _, who, prio) })
}

/// # Safety
/// `limit` must be valid for writes of one `rlimit`.
pub unsafe fn getrlimit(resource: c_int, limit: *mut rlimit) -> NativeResult<c_int> {
    sentinel(libc::getrlimit(resource as _, limit))
}

/// # Safety
/// `limit` must point at an initialised `rlimit`.
pub unsafe fn setrlimit(resource: c_int, limit: *const rlimit) -> NativeResult<c_int> {
    sentinel(libc::setrlimit(resource as _, limit))
}

/// Supplementary group ids of the calling process.
pub fn getgroups() -> NativeResult<Vec<gid_t>> {
    let count = sentinel(unsafe { libc::getgroups(0, std::ptr::null_mut()) })?;
    let mut groups = vec![0 as gid_t; count as usize];
    let filled = sentinel(unsafe { libc::getgroups(count, groups.as_mut_ptr()) })?;
    groups.truncate(filled as usize);
    Ok(groups)
}

/// Device major number of a 32-bit device id laid out as `major << 24 | minor`.
pub fn major(dev: i32) -> i32 {
    (dev >> 24) & 0xff
}

/// Device minor number, the low 24 bits.
pub fn minor(dev: i32) -> i32 {
    dev & 0x00ff_ffff
}

/// The calling thread's last-error state.
pub fn errno() -> c_int {
    Errno::last().raw()
}

pub fn set_errno(value: c_int) {
    Errno(value).restore()
}
