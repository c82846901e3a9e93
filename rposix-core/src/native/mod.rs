//! One-to-one shims over OS primitives.
//!
//! Every shim takes already-decoded native values. Shims for primitives that follow the
//! sentinel-failure convention return [`NativeResult`](crate::error::NativeResult) and read
//! `errno` themselves, immediately after the call; the others return the raw value.

use std::cell::Cell;
use std::ffi::CString;

use crate::error::{PosixError, Result};

pub mod env;
pub mod fd;
pub mod fs;
pub mod process;
pub mod socket;

thread_local! {
    static ACTIVE_SPAN: Cell<Option<&'static str>> = const { Cell::new(None) };
}

/// Marks the calling thread as inside a native call.
///
/// Spans do not nest: while one is open on a thread, entering another is refused. The
/// registry opens a span around the native path of every call and closes it before any
/// host hook runs.
#[derive(Debug)]
pub struct NativeSpan {
    _open: (),
}

impl NativeSpan {
    pub fn enter(op: &'static str) -> Result<NativeSpan> {
        ACTIVE_SPAN.with(|active| match active.get() {
            Some(outer) => Err(PosixError::Reentrant { op, active: outer }),
            None => {
                active.set(Some(op));
                Ok(NativeSpan { _open: () })
            }
        })
    }

    /// Name of the operation whose span is open on this thread, if any.
    pub fn active() -> Option<&'static str> {
        ACTIVE_SPAN.with(Cell::get)
    }
}

impl Drop for NativeSpan {
    fn drop(&mut self) {
        ACTIVE_SPAN.with(|active| active.set(None));
    }
}

/// Encode a managed string for a native call.
pub(crate) fn c_string(op: &'static str, index: usize, s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| PosixError::InteriorNul { op, index })
}
