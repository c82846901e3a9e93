//! Call paths: decode an [`Invocation`], call the native shim, hand back an [`Outcome`].

use libc::{addrinfo, c_char, c_void, gid_t, mode_t, rlimit, sockaddr, socklen_t, timeval, uid_t};

use crate::dispatch::{Invocation, Outcome};
use crate::error::{PosixError, Result};
use crate::memory::NativePointer;
use crate::native::{env, fd, fs, process, socket};
use crate::variant::Variant;

/// Address substituted when address resolution is asked for no particular host.
pub const WILDCARD_HOST: &str = "0.0.0.0";

// filesystem

pub fn access(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::access(&inv.c_string(0)?, inv.c_int(1)?)))
}

pub fn chmod(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::chmod(&inv.c_string(0)?, inv.c_int(1)? as mode_t)))
}

pub fn chown(inv: &Invocation<'_>) -> Result<Outcome> {
    let path = inv.c_string(0)?;
    let (owner, group) = (inv.c_int(1)? as uid_t, inv.c_int(2)? as gid_t);
    Ok(Outcome::status(fs::chown(&path, owner, group)))
}

pub fn link(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::link(&inv.c_string(0)?, &inv.c_string(1)?)))
}

pub fn symlink(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::symlink(&inv.c_string(0)?, &inv.c_string(1)?)))
}

pub fn unlink(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::unlink(&inv.c_string(0)?)))
}

pub fn rename(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::rename(&inv.c_string(0)?, &inv.c_string(1)?)))
}

pub fn mkdir(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::mkdir(&inv.c_string(0)?, inv.c_int(1)? as mode_t)))
}

pub fn rmdir(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::rmdir(&inv.c_string(0)?)))
}

pub fn chdir(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fs::chdir(&inv.c_string(0)?)))
}

/// Runs after a successful `chdir`, outside the native span.
pub fn chdir_succeeded(host: &mut dyn crate::host::HostRuntime, args: &[Variant]) {
    if let Some(path) = args.first().and_then(Variant::as_str) {
        host.set_current_directory(path);
    }
}

pub fn getcwd_into_buffer(inv: &Invocation<'_>) -> Result<Outcome> {
    let handle = *inv.pointer(0)?;
    let view = inv.view(0)?;
    let max = inv.len(1)?;
    inv.memory(0, view.check(0, max))?;
    let r = unsafe { fs::getcwd(view.as_mut_ptr::<c_char>(), max) };
    Ok(Outcome::Value(r.map(|()| Variant::Pointer(handle))))
}

/// The runtime's own cwd, returned as a new string. The length limit does not apply to
/// managed strings.
pub fn getcwd_from_host(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::value(inv.host().current_directory()))
}

pub fn readlink(inv: &Invocation<'_>) -> Result<Outcome> {
    let path = inv.c_string(0)?;
    let view = inv.view(1)?;
    let size = inv.len(2)?;
    inv.memory(1, view.check(0, size))?;
    let r = unsafe { fs::readlink(&path, view.as_mut_ptr::<c_char>(), size) };
    Ok(Outcome::Status(r.map(|n| n as i64)))
}

pub fn utimes(inv: &Invocation<'_>) -> Result<Outcome> {
    let path = inv.c_string(0)?;
    let view = inv.view(1)?;
    let times = inv.memory(1, view.require::<[timeval; 2]>())?;
    Ok(Outcome::status(unsafe { fs::utimes(&path, times.cast::<timeval>()) }))
}

// descriptors

pub fn dup(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::dup(inv.c_int(0)?)))
}

pub fn close(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::close(inv.c_int(0)?)))
}

pub fn fchmod(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::fchmod(inv.c_int(0)?, inv.c_int(1)? as mode_t)))
}

pub fn fchown(inv: &Invocation<'_>) -> Result<Outcome> {
    let (owner, group) = (inv.c_int(1)? as uid_t, inv.c_int(2)? as gid_t);
    Ok(Outcome::status(fd::fchown(inv.c_int(0)?, owner, group)))
}

pub fn fsync(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::fsync(inv.c_int(0)?)))
}

pub fn flock(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::flock(inv.c_int(0)?, inv.c_int(1)?)))
}

pub fn isatty(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(fd::isatty(inv.c_int(0)?)))
}

pub fn fcntl(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::fcntl(inv.c_int(0)?, inv.c_int(1)?)))
}

pub fn fcntl_int(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(fd::fcntl_int(inv.c_int(0)?, inv.c_int(1)?, inv.c_int(2)?)))
}

// identity and limits

pub fn getuid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getuid()))
}

pub fn geteuid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::geteuid()))
}

pub fn getgid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getgid()))
}

pub fn getegid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getegid()))
}

pub fn getpid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getpid()))
}

pub fn getppid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getppid()))
}

pub fn getpgrp(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::getpgrp()))
}

pub fn getpgid(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(process::getpgid(inv.c_int(0)?)))
}

pub fn setsid(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(process::setsid()))
}

pub fn setuid(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(process::setuid(inv.c_int(0)? as uid_t)))
}

pub fn seteuid(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(process::seteuid(inv.c_int(0)? as uid_t)))
}

pub fn setgid(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(process::setgid(inv.c_int(0)? as gid_t)))
}

/// For primitives this binding deliberately does not provide.
pub fn unsupported(inv: &Invocation<'_>) -> Result<Outcome> {
    Err(inv.unsupported())
}

pub fn getpriority(inv: &Invocation<'_>) -> Result<Outcome> {
    let who = inv.c_int(1)? as libc::id_t;
    Ok(Outcome::info(process::getpriority(inv.c_int(0)?, who)))
}

pub fn setpriority(inv: &Invocation<'_>) -> Result<Outcome> {
    let who = inv.c_int(1)? as libc::id_t;
    Ok(Outcome::status(process::setpriority(inv.c_int(0)?, who, inv.c_int(2)?)))
}

pub fn umask(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::umask(inv.c_int(0)? as mode_t) as i64))
}

pub fn getrlimit(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(1)?;
    let limit = inv.memory(1, view.require::<rlimit>())?;
    Ok(Outcome::status(unsafe { process::getrlimit(inv.c_int(0)?, limit) }))
}

pub fn setrlimit(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(1)?;
    let limit = inv.memory(1, view.require::<rlimit>())?;
    Ok(Outcome::status(unsafe { process::setrlimit(inv.c_int(0)?, limit) }))
}

/// Group count only; the buffer argument is nil.
pub fn getgroups_count(inv: &Invocation<'_>) -> Result<Outcome> {
    inv.len(0)?;
    Ok(Outcome::Status(process::getgroups().map(|g| g.len() as i64)))
}

/// Writes at most `max` ids and returns the total number of groups.
pub fn getgroups_fill(inv: &Invocation<'_>) -> Result<Outcome> {
    let max = inv.len(0)?;
    let view = inv.view(1)?;
    let groups = match process::getgroups() {
        Ok(groups) => groups,
        Err(errno) => return Ok(Outcome::Status(Err(errno))),
    };
    inv.memory(1, view.write_ids(&groups, max))?;
    Ok(Outcome::Status(Ok(groups.len() as i64)))
}

pub fn major(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::major(inv.int(0)? as i32)))
}

pub fn minor(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::minor(inv.int(0)? as i32)))
}

pub fn errno(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::info(process::errno()))
}

pub fn set_errno(inv: &Invocation<'_>) -> Result<Outcome> {
    process::set_errno(inv.c_int(0)?);
    Ok(Outcome::Info(0))
}

// environment and raw memory

pub fn getenv(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::value(env::getenv(&inv.c_string(0)?)))
}

pub fn setenv(inv: &Invocation<'_>) -> Result<Outcome> {
    let (name, value) = (inv.c_string(0)?, inv.c_string(1)?);
    Ok(Outcome::status(env::setenv(&name, &value, inv.c_int(2)?)))
}

pub fn unsetenv(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(env::unsetenv(&inv.c_string(0)?)))
}

pub fn environ(_: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::value(NativePointer::from_raw(env::environ(), None)))
}

/// Fill and hand the same pointer back.
pub fn memset(inv: &Invocation<'_>) -> Result<Outcome> {
    let handle = *inv.pointer(0)?;
    let view = inv.view(0)?;
    // converted to unsigned char, as memset(3) does
    let byte = inv.int(1)? as u8;
    let len = inv.len(2)?;
    inv.memory(0, view.fill(byte, len))?;
    Ok(Outcome::value(handle))
}

// sockets

pub fn socket(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(socket::socket(inv.c_int(0)?, inv.c_int(1)?, inv.c_int(2)?)))
}

pub fn listen(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(socket::listen(inv.c_int(0)?, inv.c_int(1)?)))
}

pub fn shutdown(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::status(socket::shutdown(inv.c_int(0)?, inv.c_int(1)?)))
}

pub fn connect(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(1)?;
    let len = inv.socklen(2)?;
    inv.memory(1, view.check(0, len as usize))?;
    let addr = view.as_mut_ptr::<sockaddr>();
    Ok(Outcome::status(unsafe { socket::connect(inv.c_int(0)?, addr, len) }))
}

pub fn bind(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(1)?;
    let len = inv.socklen(2)?;
    inv.memory(1, view.check(0, len as usize))?;
    let addr = view.as_mut_ptr::<sockaddr>();
    Ok(Outcome::status(unsafe { socket::bind(inv.c_int(0)?, addr, len) }))
}

pub fn setsockopt(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(3)?;
    let len = inv.socklen(4)?;
    inv.memory(3, view.check(0, len as usize))?;
    let (fd, level, name) = (inv.c_int(0)?, inv.c_int(1)?, inv.c_int(2)?);
    let value = view.as_mut_ptr::<c_void>();
    Ok(Outcome::status(unsafe { socket::setsockopt(fd, level, name, value, len) }))
}

pub fn getsockopt(inv: &Invocation<'_>) -> Result<Outcome> {
    sockopt_into(inv, inv.c_int(1)?, inv.c_int(2)?)
}

/// Level and option given as symbols, resolved as `SOL_<level>` and `SO_<name>`.
pub fn getsockopt_symbols(inv: &Invocation<'_>) -> Result<Outcome> {
    let level = constant(inv, "SOL_", inv.symbol(1)?)?;
    let name = constant(inv, "SO_", inv.symbol(2)?)?;
    sockopt_into(inv, level, name)
}

fn constant(inv: &Invocation<'_>, prefix: &str, symbol: &str) -> Result<libc::c_int> {
    let name = format!("{prefix}{symbol}");
    inv.host()
        .socket_constant(&name)
        .ok_or(PosixError::UnknownConstant { name })
}

fn sockopt_into(inv: &Invocation<'_>, level: libc::c_int, name: libc::c_int) -> Result<Outcome> {
    let value = inv.view(3)?;
    let len_view = inv.view(4)?;
    let len = inv.memory(4, len_view.require::<socklen_t>())?;
    let capacity = inv.memory(4, len_view.read_uint(0, std::mem::size_of::<socklen_t>()))?;
    inv.memory(3, value.check(0, capacity as usize))?;
    let fd = inv.c_int(0)?;
    Ok(Outcome::status(unsafe {
        socket::getsockopt(fd, level, name, value.as_mut_ptr::<c_void>(), len)
    }))
}

pub fn gethostname(inv: &Invocation<'_>) -> Result<Outcome> {
    let view = inv.view(0)?;
    let len = inv.len(1)?;
    inv.memory(0, view.check(0, len))?;
    Ok(Outcome::status(unsafe { socket::gethostname(view.as_mut_ptr::<c_char>(), len) }))
}

pub fn getpeername(inv: &Invocation<'_>) -> Result<Outcome> {
    let (addr, len) = address_out(inv)?;
    Ok(Outcome::status(unsafe { socket::getpeername(inv.c_int(0)?, addr, len) }))
}

pub fn getsockname(inv: &Invocation<'_>) -> Result<Outcome> {
    let (addr, len) = address_out(inv)?;
    Ok(Outcome::status(unsafe { socket::getsockname(inv.c_int(0)?, addr, len) }))
}

/// `(sockaddr out, socklen_t in/out)` pair at argument positions 1 and 2.
fn address_out(inv: &Invocation<'_>) -> Result<(*mut sockaddr, *mut socklen_t)> {
    let addr = inv.view(1)?;
    let len_view = inv.view(2)?;
    let len = inv.memory(2, len_view.require::<socklen_t>())?;
    let capacity = inv.memory(2, len_view.read_uint(0, std::mem::size_of::<socklen_t>()))?;
    inv.memory(1, addr.check(0, capacity as usize))?;
    Ok((addr.as_mut_ptr(), len))
}

/// No host: resolve the wildcard address instead of passing a null host.
pub fn getaddrinfo_any_host(inv: &Invocation<'_>) -> Result<Outcome> {
    let mut args = inv.args().to_vec();
    args[0] = Variant::from(WILDCARD_HOST);
    Ok(Outcome::Redispatch(args))
}

pub fn getaddrinfo(inv: &Invocation<'_>) -> Result<Outcome> {
    let service = inv.c_string(1)?;
    resolve(inv, Some(&service))
}

pub fn getaddrinfo_no_service(inv: &Invocation<'_>) -> Result<Outcome> {
    resolve(inv, None)
}

fn resolve(inv: &Invocation<'_>, service: Option<&std::ffi::CStr>) -> Result<Outcome> {
    let host = inv.c_string(0)?;
    let hints = inv.nullable_view(2)?;
    if let Some(hints) = &hints {
        inv.memory(2, hints.check(0, std::mem::size_of::<addrinfo>()))?;
    }
    let hints = hints.map_or(std::ptr::null(), |v| v.as_mut_ptr::<addrinfo>() as *const addrinfo);
    let results = inv.view(3)?;
    let results = inv.memory(3, results.require::<*mut addrinfo>())?;
    Ok(Outcome::info(unsafe { socket::getaddrinfo(&host, service, hints, results) }))
}

pub fn freeaddrinfo(inv: &Invocation<'_>) -> Result<Outcome> {
    let chain = inv.view(0)?;
    unsafe { socket::freeaddrinfo(chain.as_mut_ptr::<addrinfo>()) };
    Ok(Outcome::value(Variant::Nil))
}

/// Shared by the three `_getnameinfo` arms; a nil output is skipped and must come with a
/// zero length, a present one with a positive length.
pub fn getnameinfo(inv: &Invocation<'_>) -> Result<Outcome> {
    let addr = inv.view(0)?;
    let addr_len = inv.socklen(1)?;
    inv.memory(0, addr.check(0, addr_len as usize))?;
    let (host, host_len) = name_out(inv, 2, "host")?;
    let (serv, serv_len) = name_out(inv, 4, "service")?;
    let flags = inv.c_int(6)?;
    let status = unsafe {
        socket::getnameinfo(
            addr.as_mut_ptr::<sockaddr>(),
            addr_len,
            host,
            host_len,
            serv,
            serv_len,
            flags,
        )
    };
    Ok(Outcome::info(status))
}

fn name_out(inv: &Invocation<'_>, index: usize, what: &str) -> Result<(*mut c_char, socklen_t)> {
    let len = inv.socklen(index + 1)?;
    match inv.nullable_view(index)? {
        None if len == 0 => Ok((std::ptr::null_mut(), 0)),
        None => Err(inv.misuse(format!("{what} length must be 0 without a {what} buffer"))),
        Some(_) if len == 0 => Err(inv.misuse(format!("{what} length must be positive"))),
        Some(view) => {
            inv.memory(index, view.check(0, len as usize))?;
            Ok((view.as_mut_ptr(), len))
        }
    }
}
