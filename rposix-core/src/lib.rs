//! rposix-core
//!
//! Native-call binding layer that exposes POSIX primitives to a managed runtime as a flat
//! table of named operations. Each call is dispatched on the shapes of its arguments,
//! forwarded to one OS primitive, and its failure (if any) is either raised as a
//! [`PosixError`] or passed back with `errno` intact, depending on the operation.
//!
//! The runtime's own process-level state (its working directory, named constants) stays
//! behind the [`HostRuntime`] trait.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod memory;
pub mod native;
pub mod registry;
pub mod variant;

pub use config::{BindingConfig, BindingConfigBuilder, LoggerConfig};
pub use dispatch::{Arm, Outcome, Shape};
pub use error::{Errno, PosixError, Result};
pub use host::{HostRuntime, ProcessHost};
pub use memory::{MemoryView, NativeBuffer, NativePointer};
pub use registry::{BoundOperation, ErrorPolicy, OperationDescriptor, OperationRegistry};
pub use variant::{ArgKind, Variant};
