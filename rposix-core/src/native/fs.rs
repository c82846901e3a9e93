//! Path-in primitives: filesystem metadata and structure.

use std::ffi::CStr;

use libc::{c_char, c_int, gid_t, mode_t, timeval, uid_t};

use crate::error::{sentinel, Errno, NativeResult};

pub fn access(path: &CStr, mode: c_int) -> NativeResult<c_int> {
    sentinel(unsafe { libc::access(path.as_ptr(), mode) })
}

pub fn chmod(path: &CStr, mode: mode_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::chmod(path.as_ptr(), mode) })
}

pub fn chown(path: &CStr, owner: uid_t, group: gid_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::chown(path.as_ptr(), owner, group) })
}

pub fn link(existing: &CStr, new: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::link(existing.as_ptr(), new.as_ptr()) })
}

pub fn symlink(target: &CStr, link: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::symlink(target.as_ptr(), link.as_ptr()) })
}

pub fn unlink(path: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::unlink(path.as_ptr()) })
}

pub fn rename(from: &CStr, to: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::rename(from.as_ptr(), to.as_ptr()) })
}

pub fn mkdir(path: &CStr, mode: mode_t) -> NativeResult<c_int> {
    sentinel(unsafe { libc::mkdir(path.as_ptr(), mode) })
}

pub fn rmdir(path: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::rmdir(path.as_ptr()) })
}

/// Changes the process working directory. Nothing else: updating the host's view of the
/// cwd is the registry's post-success hook.
pub fn chdir(path: &CStr) -> NativeResult<c_int> {
    sentinel(unsafe { libc::chdir(path.as_ptr()) })
}

/// Write the current directory into `buf`.
///
/// # Safety
/// `buf` must be valid for writes of `size` bytes.
pub unsafe fn getcwd(buf: *mut c_char, size: usize) -> NativeResult<()> {
    if libc::getcwd(buf, size).is_null() {
        Err(Errno::last())
    } else {
        Ok(())
    }
}

/// Read the target of the link at `path` into `buf`; returns the number of bytes written
/// (not NUL-terminated).
///
/// # Safety
/// `buf` must be valid for writes of `size` bytes.
pub unsafe fn readlink(path: &CStr, buf: *mut c_char, size: usize) -> NativeResult<isize> {
    sentinel(libc::readlink(path.as_ptr(), buf, size))
}

/// # Safety
/// `times` must point at two `timeval`s.
pub unsafe fn utimes(path: &CStr, times: *const timeval) -> NativeResult<c_int> {
    sentinel(libc::utimes(path.as_ptr(), times))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    fn c(path: &std::path::Path) -> CString {
        CString::new(path.as_os_str().as_bytes()).unwrap()
    }

    #[test]
    fn access_reports_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(access(&c(dir.path()), libc::F_OK), Ok(0));
        let missing = dir.path().join("missing");
        assert_eq!(access(&c(&missing), libc::F_OK), Err(Errno(libc::ENOENT)));
    }

    #[test]
    fn mkdir_rename_rmdir() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        assert_eq!(mkdir(&c(&a), 0o755), Ok(0));
        assert_eq!(mkdir(&c(&a), 0o755), Err(Errno(libc::EEXIST)));
        assert_eq!(rename(&c(&a), &c(&b)), Ok(0));
        assert!(b.is_dir() && !a.exists());
        assert_eq!(rmdir(&c(&b)), Ok(0));
        assert_eq!(rmdir(&c(&b)), Err(Errno(libc::ENOENT)));
    }

    #[test]
    fn readlink_fills_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("l");
        assert_eq!(symlink(&CString::new("target-name").unwrap(), &c(&link)), Ok(0));
        let mut buf = [0 as c_char; 64];
        let n = unsafe { readlink(&c(&link), buf.as_mut_ptr(), buf.len()) }.unwrap();
        let bytes: Vec<u8> = buf[..n as usize].iter().map(|&b| b as u8).collect();
        assert_eq!(bytes, b"target-name");
    }
}
