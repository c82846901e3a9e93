use std::path::{Path, PathBuf};

use crate::native::socket::socket_constant;

/// The embedding runtime, as seen by the binding layer.
///
/// Implement this on whatever owns the runtime's process-level state. Queries
/// (`current_directory`, `socket_constant`) may run while a native span is open, so they
/// must not call back into the binding. `set_current_directory` runs after the span closes.
pub trait HostRuntime {
    /// The runtime's notion of the current working directory.
    fn current_directory(&self) -> String;

    /// Called after a successful `chdir`, with the path exactly as the caller passed it.
    fn set_current_directory(&mut self, path: &str);

    /// Resolve a named constant (`SOL_SOCKET`, `SO_TYPE`, ...).
    fn socket_constant(&self, name: &str) -> Option<i32> {
        socket_constant(name)
    }
}

/// A host that tracks the process cwd in canonical form.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    cwd: PathBuf,
}

impl ProcessHost {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|e| {
            log::warn!("ProcessHost: current directory unavailable: {}", e);
            PathBuf::from("/")
        });
        Self { cwd }
    }

    pub fn with_directory(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl Default for ProcessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for ProcessHost {
    fn current_directory(&self) -> String {
        self.cwd.to_string_lossy().into_owned()
    }

    fn set_current_directory(&mut self, path: &str) {
        // the native chdir already succeeded, so the process cwd is the authority
        let joined = self.cwd.join(path);
        self.cwd = std::env::current_dir()
            .or_else(|_| joined.canonicalize())
            .unwrap_or(joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constants_come_from_libc() {
        let host = ProcessHost::with_directory("/");
        assert_eq!(host.socket_constant("SO_TYPE"), Some(libc::SO_TYPE));
        assert_eq!(host.current_directory(), "/");
    }
}
