//! Environment table access.

use std::ffi::CStr;

use libc::{c_char, c_int};

use crate::error::{sentinel, NativeResult};

/// Copy of the value of `name`, or `None` when unset.
pub fn getenv(name: &CStr) -> Option<String> {
    let value = unsafe { libc::getenv(name.as_ptr()) };
    if value.is_null() {
        return None;
    }
    // SAFETY: getenv returns a NUL-terminated string that stays valid until the next
    // modification of the environment; it is copied out before returning.
    let value = unsafe { CStr::from_ptr(value) };
    Some(value.to_string_lossy().into_owned())
}

pub fn setenv(name: &CStr, value: &CStr, overwrite: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::setenv(name.as_ptr(), value.as_ptr(), overwrite) })
}

pub fn unsetenv(name: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::unsetenv(name.as_ptr()) })
}

/// Base of the process environment table (`char **`), not copied.
pub fn environ() -> *const *const c_char {
    environ_base()
}

#[cfg(target_vendor = "apple")]
fn environ_base() -> *const *const c_char {
    // SAFETY: _NSGetEnviron always returns a valid pointer to the environ slot.
    unsafe { *libc::_NSGetEnviron() as *const *const c_char }
}

#[cfg(not(target_vendor = "apple"))]
fn environ_base() -> *const *const c_char {
    extern "C" {
        static environ: *const *const c_char;
    }
    // SAFETY: reading the slot itself; entries are only dereferenced by the caller.
    unsafe { environ }
}
