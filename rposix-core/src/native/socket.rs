//! Socket lifecycle, options and address resolution.
//!
//! Address structures are opaque here: they are only passed through as pointers.

use std::ffi::CStr;
use std::ptr;

use libc::{addrinfo, c_char, c_int, c_void, sockaddr, socklen_t};

use crate::error::{sentinel, NativeResult};

pub fn socket(domain: c_int, ty: c_int, protocol: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::socket(domain, ty, protocol) })
}

pub fn listen(fd: c_int, backlog: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::listen(fd, backlog) })
}

pub fn shutdown(fd: c_int, how: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::shutdown(fd, how) })
}

/// Blocks until the connection completes or fails; there is no timeout.
///
/// # Safety
/// `addr` must be valid for reads of `len` bytes.
pub unsafe fn connect(fd: c_int, addr: *const sockaddr, len: socklen_t) -> NativeResult<c_int> {
    sentinel(libc::connect(fd, addr, len))
}

/// # Safety
/// `addr` must be valid for reads of `len` bytes.
pub unsafe fn bind(fd: c_int, addr: *const sockaddr, len: socklen_t) -> NativeResult<c_int> {
    sentinel(libc::bind(fd, addr, len))
}

/// # Safety
/// `value` must be valid for reads of `len` bytes.
pub unsafe fn setsockopt(
    fd: c_int,
    level: c_int,
    name: c_int,
    value: *const c_void,
    len: socklen_t,
) -> NativeResult<c_int> {
    sentinel(libc::setsockopt(fd, level, name, value, len))
}

/// # Safety
/// `len` must point at a `socklen_t` holding the capacity of `value`.
pub unsafe fn getsockopt(
    fd: c_int,
    level: c_int,
    name: c_int,
    value: *mut c_void,
    len: *mut socklen_t,
) -> NativeResult<c_int> {
    sentinel(libc::getsockopt(fd, level, name, value, len))
}

/// # Safety
/// `addr` must be writable for the capacity stored behind `len`.
pub unsafe fn getpeername(fd: c_int, addr: *mut sockaddr, len: *mut socklen_t) -> NativeResult<c_int> {
    sentinel(libc::getpeername(fd, addr, len))
}

/// # Safety
/// `addr` must be writable for the capacity stored behind `len`.
pub unsafe fn getsockname(fd: c_int, addr: *mut sockaddr, len: *mut socklen_t) -> NativeResult<c_int> {
    sentinel(libc::getsockname(fd, addr, len))
}

/// # Safety
/// `name` must be valid for writes of `len` bytes.
pub unsafe fn gethostname(name: *mut c_char, len: usize) -> NativeResult<c_int> {
    sentinel(libc::gethostname(name, len))
}

/// Resolve `host`/`service`. Returns the `EAI_*` status; 0 means `*res` now owns a chain
/// that must be released with [`freeaddrinfo`].
///
/// # Safety
/// `hints` must be null or point at an `addrinfo`; `res` must be writable.
pub unsafe fn getaddrinfo(
    host: &CStr,
    service: Option<&CStr>,
    hints: *const addrinfo,
    res: *mut *mut addrinfo,
) -> c_int {
    let service = service.map_or(ptr::null(), CStr::as_ptr);
    libc::getaddrinfo(host.as_ptr(), service, hints, res)
}

/// # Safety
/// `chain` must have come from [`getaddrinfo`] and not have been freed.
pub unsafe fn freeaddrinfo(chain: *mut addrinfo) {
    libc::freeaddrinfo(chain)
}

/// Reverse resolution. Either output may be null (with a zero length) to skip it.
/// Returns the `EAI_*` status.
///
/// # Safety
/// `addr` must be readable for `addr_len` bytes; non-null outputs writable for their length.
#[allow(clippy::too_many_arguments)]
pub unsafe fn getnameinfo(
    addr: *const sockaddr,
    addr_len: socklen_t,
    host: *mut c_char,
    host_len: socklen_t,
    serv: *mut c_char,
    serv_len: socklen_t,
    flags: c_int,
) -> c_int {
    libc::getnameinfo(addr, addr_len, host, host_len as _, serv, serv_len as _, flags)
}

/// `SOL_*` levels reachable by name.
const LEVELS: &[(&str, c_int)] = &[
    ("SOCKET", libc::SOL_SOCKET),
    ("IP", libc::IPPROTO_IP),
    ("TCP", libc::IPPROTO_TCP),
    ("UDP", libc::IPPROTO_UDP),
    ("IPV6", libc::IPPROTO_IPV6),
];

/// `SO_*` options reachable by name.
const OPTIONS: &[(&str, c_int)] = &[
    ("ACCEPTCONN", libc::SO_ACCEPTCONN),
    ("BROADCAST", libc::SO_BROADCAST),
    ("DEBUG", libc::SO_DEBUG),
    ("DONTROUTE", libc::SO_DONTROUTE),
    ("ERROR", libc::SO_ERROR),
    ("KEEPALIVE", libc::SO_KEEPALIVE),
    ("LINGER", libc::SO_LINGER),
    ("OOBINLINE", libc::SO_OOBINLINE),
    ("RCVBUF", libc::SO_RCVBUF),
    ("RCVLOWAT", libc::SO_RCVLOWAT),
    ("RCVTIMEO", libc::SO_RCVTIMEO),
    ("REUSEADDR", libc::SO_REUSEADDR),
    ("REUSEPORT", libc::SO_REUSEPORT),
    ("SNDBUF", libc::SO_SNDBUF),
    ("SNDLOWAT", libc::SO_SNDLOWAT),
    ("SNDTIMEO", libc::SO_SNDTIMEO),
    ("TYPE", libc::SO_TYPE),
];

/// Look up a socket constant such as `SOL_SOCKET` or `SO_REUSEADDR` by its full name.
pub fn socket_constant(name: &str) -> Option<c_int> {
    let (table, short) = if let Some(short) = name.strip_prefix("SOL_") {
        (LEVELS, short)
    } else if let Some(short) = name.strip_prefix("SO_") {
        (OPTIONS, short)
    } else {
        return None;
    };
    table.iter().find(|(n, _)| *n == short).map(|&(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn constants_resolve_by_full_name() {
        assert_eq!(socket_constant("SOL_SOCKET"), Some(libc::SOL_SOCKET));
        assert_eq!(socket_constant("SO_REUSEADDR"), Some(libc::SO_REUSEADDR));
        assert_eq!(socket_constant("SO_NOPE"), None);
        assert_eq!(socket_constant("REUSEADDR"), None);
    }

    #[test]
    fn socket_option_round_trip() {
        let fd = socket(libc::AF_INET, libc::SOCK_STREAM, 0).unwrap();
        let on: c_int = 1;
        let set = unsafe {
            setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &on as *const c_int as *const c_void,
                mem::size_of::<c_int>() as socklen_t,
            )
        };
        assert_eq!(set, Ok(0));

        let mut value: c_int = 0;
        let mut len = mem::size_of::<c_int>() as socklen_t;
        let got = unsafe {
            getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &mut value as *mut c_int as *mut c_void,
                &mut len,
            )
        };
        assert_eq!(got, Ok(0));
        assert_ne!(value, 0);
        assert_eq!(crate::native::fd::close(fd), Ok(0));
    }
}
