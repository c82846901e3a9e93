use crate::dispatch::{Arm, Shape};
use crate::registry::paths;
use crate::registry::{ErrorPolicy, OperationDescriptor, SuccessHook};

use ErrorPolicy::{Informational as I, PassThrough as P, Raise as R, Unsupported as U};

macro_rules! arm {
    ($path:path $(, $shape:ident)*) => {
        Arm {
            guard: &[$(Shape::$shape),*],
            path: $path,
        }
    };
}

const fn op(
    name: &'static str,
    arity: usize,
    policy: ErrorPolicy,
    arms: &'static [Arm],
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        arity,
        policy,
        arms,
        on_success: None,
    }
}

const fn hooked(desc: OperationDescriptor, hook: SuccessHook) -> OperationDescriptor {
    OperationDescriptor {
        on_success: Some(hook),
        ..desc
    }
}

/// Every operation the binding exposes. Arms are tried top to bottom.
pub static OPERATIONS: &[OperationDescriptor] = &[
    // filesystem
    op("access", 2, P, &[arm!(paths::access, Str, Int)]),
    op("chmod", 2, P, &[arm!(paths::chmod, Str, Int)]),
    op("chown", 3, P, &[arm!(paths::chown, Str, Int, Int)]),
    op("link", 2, P, &[arm!(paths::link, Str, Str)]),
    op("unlink", 1, P, &[arm!(paths::unlink, Str)]),
    op("symlink", 2, P, &[arm!(paths::symlink, Str, Str)]),
    op("rename", 2, P, &[arm!(paths::rename, Str, Str)]),
    op("mkdir", 2, P, &[arm!(paths::mkdir, Str, Int)]),
    op("rmdir", 1, P, &[arm!(paths::rmdir, Str)]),
    hooked(
        op("chdir", 1, P, &[arm!(paths::chdir, Str)]),
        paths::chdir_succeeded,
    ),
    op(
        "getcwd",
        2,
        P,
        &[
            arm!(paths::getcwd_into_buffer, Pointer, Int),
            arm!(paths::getcwd_from_host, Str, Int),
        ],
    ),
    op("readlink", 3, R, &[arm!(paths::readlink, Str, Pointer, Int)]),
    op("utimes", 2, R, &[arm!(paths::utimes, Str, Pointer)]),
    // descriptors
    op("dup", 1, P, &[arm!(paths::dup, Int)]),
    op("fchmod", 2, P, &[arm!(paths::fchmod, Int, Int)]),
    op("fchown", 3, P, &[arm!(paths::fchown, Int, Int, Int)]),
    op("fsync", 1, P, &[arm!(paths::fsync, Int)]),
    op("close", 1, P, &[arm!(paths::close, Int)]),
    op("flock", 2, P, &[arm!(paths::flock, Int, Int)]),
    op("isatty", 1, I, &[arm!(paths::isatty, Int)]),
    op(
        "fcntl",
        3,
        P,
        &[
            arm!(paths::fcntl, Int, Int, Nil),
            arm!(paths::fcntl_int, Int, Int, Int),
        ],
    ),
    // identity
    op("getegid", 0, I, &[arm!(paths::getegid)]),
    op("geteuid", 0, I, &[arm!(paths::geteuid)]),
    op("getgid", 0, I, &[arm!(paths::getgid)]),
    op("getuid", 0, I, &[arm!(paths::getuid)]),
    op("getppid", 0, I, &[arm!(paths::getppid)]),
    op("getpgrp", 0, I, &[arm!(paths::getpgrp)]),
    op("getpid", 0, I, &[arm!(paths::getpid)]),
    op("setsid", 0, P, &[arm!(paths::setsid)]),
    op("getpgid", 1, P, &[arm!(paths::getpgid, Int)]),
    op("setgid", 1, P, &[arm!(paths::setgid, Int)]),
    op("setuid", 1, P, &[arm!(paths::setuid, Int)]),
    op("seteuid", 1, P, &[arm!(paths::seteuid, Int)]),
    op("setresuid", 3, U, &[arm!(paths::unsupported, Any, Any, Any)]),
    op("setreuid", 2, U, &[arm!(paths::unsupported, Any, Any)]),
    op("setruid", 1, U, &[arm!(paths::unsupported, Any)]),
    op(
        "getgroups",
        2,
        P,
        &[
            arm!(paths::getgroups_count, Int, Nil),
            arm!(paths::getgroups_fill, Int, Pointer),
        ],
    ),
    // limits and scheduling
    op("getrlimit", 2, R, &[arm!(paths::getrlimit, Int, Pointer)]),
    op("setrlimit", 2, R, &[arm!(paths::setrlimit, Int, Pointer)]),
    op("getpriority", 2, I, &[arm!(paths::getpriority, Int, Int)]),
    op("setpriority", 3, P, &[arm!(paths::setpriority, Int, Int, Int)]),
    op("umask", 1, I, &[arm!(paths::umask, Int)]),
    // environment
    op("getenv", 1, I, &[arm!(paths::getenv, Str)]),
    op("setenv", 3, P, &[arm!(paths::setenv, Str, Str, Int)]),
    op("unsetenv", 1, P, &[arm!(paths::unsetenv, Str)]),
    op("putenv", 1, U, &[arm!(paths::unsupported, Any)]),
    op("environ", 0, I, &[arm!(paths::environ)]),
    // memory and devices
    op("memset", 3, I, &[arm!(paths::memset, Pointer, Int, Int)]),
    op("major", 1, I, &[arm!(paths::major, Int)]),
    op("minor", 1, I, &[arm!(paths::minor, Int)]),
    // address resolution
    op(
        "_getaddrinfo",
        4,
        I,
        &[
            arm!(paths::getaddrinfo_any_host, Nil, Str, Any, Any),
            arm!(paths::getaddrinfo, Str, Str, Any, Pointer),
            arm!(paths::getaddrinfo_no_service, Str, Nil, Any, Pointer),
        ],
    ),
    op("freeaddrinfo", 1, I, &[arm!(paths::freeaddrinfo, Pointer)]),
    op(
        "_getnameinfo",
        7,
        I,
        &[
            arm!(paths::getnameinfo, Pointer, Int, Pointer, Int, Pointer, Int, Int),
            arm!(paths::getnameinfo, Pointer, Int, Nil, Int, Pointer, Int, Int),
            arm!(paths::getnameinfo, Pointer, Int, Pointer, Int, Nil, Int, Int),
        ],
    ),
    // sockets
    op("_connect", 3, P, &[arm!(paths::connect, Int, Pointer, Int)]),
    op("_bind", 3, P, &[arm!(paths::bind, Int, Pointer, Int)]),
    op("socket", 3, P, &[arm!(paths::socket, Int, Int, Int)]),
    op("listen", 2, P, &[arm!(paths::listen, Int, Int)]),
    op("shutdown", 2, P, &[arm!(paths::shutdown, Int, Int)]),
    op(
        "setsockopt",
        5,
        P,
        &[arm!(paths::setsockopt, Int, Int, Int, Pointer, Int)],
    ),
    op(
        "_getsockopt",
        5,
        P,
        &[
            arm!(paths::getsockopt, Int, Int, Int, Pointer, Pointer),
            arm!(paths::getsockopt_symbols, Int, Symbol, Symbol, Pointer, Pointer),
        ],
    ),
    op("gethostname", 2, P, &[arm!(paths::gethostname, Pointer, Int)]),
    op("_getpeername", 3, P, &[arm!(paths::getpeername, Int, Pointer, Pointer)]),
    op("_getsockname", 3, P, &[arm!(paths::getsockname, Int, Pointer, Pointer)]),
    // last-error state
    op("errno", 0, I, &[arm!(paths::errno)]),
    op("errno=", 1, I, &[arm!(paths::set_errno, Int)]),
];
