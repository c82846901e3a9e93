//! Error translation.
//!
//! Sentinel-convention shims capture `errno` on the line right after the native call and
//! return it as an [`Errno`]. The registry then turns it into a [`PosixError::Os`] or hands it
//! back to the caller as `-1`, depending on the operation's policy.

use std::fmt;
use std::io;
use std::panic::Location;

use crate::memory::MemoryError;

/// A raw OS error code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl Errno {
    /// Read the calling thread's last-error state.
    ///
    /// Must be called before any other native call on this thread, or the value may
    /// belong to that later call.
    #[inline]
    pub fn last() -> Errno {
        Errno(io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    /// Make this the calling thread's last-error state.
    #[inline]
    pub fn restore(self) {
        set_errno(self.0)
    }
}

impl fmt::Debug for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Errno({})", self.0)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", io::Error::from_raw_os_error(self.0), self.0)
    }
}

impl From<Errno> for io::Error {
    fn from(e: Errno) -> Self {
        io::Error::from_raw_os_error(e.0)
    }
}

/// Result of a native call following the sentinel-failure convention.
pub type NativeResult<T> = Result<T, Errno>;

/// Map a `-1` return to the error captured from `errno`.
#[inline]
pub fn sentinel<T>(ret: T) -> NativeResult<T>
where
    T: Copy + PartialEq + From<i8>,
{
    if ret == T::from(-1) {
        Err(Errno::last())
    } else {
        Ok(ret)
    }
}

pub fn errno() -> i32 {
    Errno::last().0
}

pub fn set_errno(value: i32) {
    // SAFETY: the location is the calling thread's errno slot and is always valid.
    unsafe { *errno_location() = value }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "emscripten"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__error()
}

#[cfg(any(target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno()
}

#[derive(thiserror::Error, Debug)]
pub enum PosixError {
    #[error("{op} failed: {errno} (called at {location})")]
    Os {
        op: &'static str,
        errno: Errno,
        location: &'static Location<'static>,
    },

    #[error("{op} is not supported on this platform")]
    Unsupported { op: &'static str },

    #[error("no arm of {op} accepts arguments ({shapes})")]
    NoMatchingArm { op: &'static str, shapes: String },

    #[error("{op} expects {expected} arguments, got {got}")]
    ArityMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unknown operation {name:?}")]
    UnknownOperation { name: String },

    #[error("{op}: argument {index}: {source}")]
    Memory {
        op: &'static str,
        index: usize,
        source: MemoryError,
    },

    #[error("{op}: argument {index} contains an interior NUL byte")]
    InteriorNul { op: &'static str, index: usize },

    #[error("{op}: argument {index} out of range: {value}")]
    OutOfRange {
        op: &'static str,
        index: usize,
        value: i64,
    },

    #[error("{op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    #[error("{op} called while {active} is still inside a native span")]
    Reentrant {
        op: &'static str,
        active: &'static str,
    },

    #[error("unknown constant {name}")]
    UnknownConstant { name: String },

    #[error("invalid operation table: {reason}")]
    InvalidTable { reason: String },
}

impl PosixError {
    /// Defects in the calling layer, as opposed to OS rejections or missing features.
    pub fn is_binding_misuse(&self) -> bool {
        !matches!(self, PosixError::Os { .. } | PosixError::Unsupported { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, PosixError::Unsupported { .. })
    }

    /// The OS error code, when the OS rejected the call.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            PosixError::Os { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Name of the operation the error belongs to, when there is one.
    pub fn operation(&self) -> Option<&str> {
        match self {
            PosixError::Os { op, .. }
            | PosixError::Unsupported { op }
            | PosixError::NoMatchingArm { op, .. }
            | PosixError::ArityMismatch { op, .. }
            | PosixError::Memory { op, .. }
            | PosixError::InteriorNul { op, .. }
            | PosixError::OutOfRange { op, .. }
            | PosixError::InvalidArgument { op, .. }
            | PosixError::Reentrant { op, .. } => Some(op),
            PosixError::UnknownOperation { name } => Some(name),
            PosixError::UnknownConstant { .. } | PosixError::InvalidTable { .. } => None,
        }
    }
}

pub type Result<T, E = PosixError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_round_trips_through_the_thread_slot() {
        set_errno(libc::EAGAIN);
        assert_eq!(errno(), libc::EAGAIN);
        Errno(libc::ENOENT).restore();
        assert_eq!(Errno::last(), Errno(libc::ENOENT));
    }

    #[test]
    fn sentinel_captures_errno() {
        set_errno(libc::EBADF);
        assert_eq!(sentinel(-1i32), Err(Errno(libc::EBADF)));
        assert_eq!(sentinel(3i32), Ok(3));
    }

    #[test]
    fn taxonomy_is_disjoint() {
        let os = PosixError::Os {
            op: "unlink",
            errno: Errno(libc::ENOENT),
            location: Location::caller(),
        };
        let unsupported = PosixError::Unsupported { op: "putenv" };
        let misuse = PosixError::ArityMismatch {
            op: "dup",
            expected: 1,
            got: 2,
        };
        assert!(!os.is_binding_misuse() && !os.is_unsupported());
        assert!(!unsupported.is_binding_misuse() && unsupported.is_unsupported());
        assert!(misuse.is_binding_misuse());
        assert_eq!(os.errno(), Some(Errno(libc::ENOENT)));
        assert_eq!(os.operation(), Some("unlink"));
    }
}
