//! The named-operation table exposed to the managed runtime.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;

use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::config::BindingConfig;
use crate::dispatch::{dispatch, Arm, Outcome};
use crate::error::{Errno, PosixError, Result};
use crate::host::HostRuntime;
use crate::native::NativeSpan;
use crate::variant::Variant;

pub mod paths;
mod table;

pub use table::OPERATIONS;

/// What happens when an operation's native call reports a sentinel failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ErrorPolicy {
    /// Raise [`PosixError::Os`].
    #[strum(serialize = "raise")]
    Raise,
    /// Return `-1` (or nil) and leave the errno in the thread's last-error state.
    #[strum(serialize = "pass-through")]
    PassThrough,
    /// Results are informational and never error-translated.
    #[strum(serialize = "informational")]
    Informational,
    /// Every call fails with [`PosixError::Unsupported`].
    #[strum(serialize = "unsupported")]
    Unsupported,
}

/// Runs on the host after a successful call, once the native span is closed.
pub type SuccessHook = fn(&mut dyn HostRuntime, &[Variant]);

pub struct OperationDescriptor {
    pub name: &'static str,
    pub arity: usize,
    pub policy: ErrorPolicy,
    pub arms: &'static [Arm],
    pub on_success: Option<SuccessHook>,
}

impl OperationDescriptor {
    /// Arm guards in evaluation order, e.g. `(int, int, nil); (int, int, int)`.
    pub fn signatures(&self) -> String {
        self.arms.iter().map(Arm::signature).join("; ")
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("policy", &self.policy)
            .field("arms", &self.arms)
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}

static GLOBAL: Lazy<OperationRegistry> = Lazy::new(|| {
    OperationRegistry::new(BindingConfig::default())
        .unwrap_or_else(|e| panic!("built-in operation table rejected: {e}"))
});

/// Named operations by name, with the runtime switches that apply to every call.
#[derive(Debug)]
pub struct OperationRegistry {
    ops: HashMap<&'static str, &'static OperationDescriptor>,
    config: BindingConfig,
}

impl OperationRegistry {
    /// The process-wide registry over the built-in table, with default configuration.
    pub fn global() -> &'static OperationRegistry {
        &GLOBAL
    }

    /// A registry over the built-in table.
    pub fn new(config: BindingConfig) -> Result<Self> {
        Self::from_table(OPERATIONS, config)
    }

    /// Build a registry over `table`, rejecting duplicate names, operations without arms,
    /// and guards whose length differs from the declared arity.
    pub fn from_table(table: &'static [OperationDescriptor], config: BindingConfig) -> Result<Self> {
        let mut ops = HashMap::with_capacity(table.len());
        for desc in table {
            if desc.arms.is_empty() {
                return Err(PosixError::InvalidTable {
                    reason: format!("{} has no arms", desc.name),
                });
            }
            if let Some(arm) = desc.arms.iter().find(|arm| arm.guard.len() != desc.arity) {
                return Err(PosixError::InvalidTable {
                    reason: format!(
                        "{}: arm {} does not have {} shapes",
                        desc.name,
                        arm.signature(),
                        desc.arity
                    ),
                });
            }
            if ops.insert(desc.name, desc).is_some() {
                return Err(PosixError::InvalidTable {
                    reason: format!("{} is declared twice", desc.name),
                });
            }
        }
        log::debug!("operation registry: {} operations", ops.len());
        Ok(Self { ops, config })
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn describe(&self, name: &str) -> Option<&'static OperationDescriptor> {
        self.ops.get(name).copied()
    }

    /// All descriptors, sorted by name.
    pub fn operations(&self) -> Vec<&'static OperationDescriptor> {
        self.ops
            .values()
            .copied()
            .sorted_by_key(|desc| desc.name)
            .collect()
    }

    /// Resolve `name` for calls with `argc` arguments.
    pub fn bind(&self, name: &str, argc: usize) -> Result<BoundOperation<'_>> {
        let descriptor = self.describe(name).ok_or_else(|| {
            misuse(PosixError::UnknownOperation {
                name: name.to_owned(),
            })
        })?;
        if descriptor.arity != argc {
            return Err(misuse(PosixError::ArityMismatch {
                op: descriptor.name,
                expected: descriptor.arity,
                got: argc,
            }));
        }
        Ok(BoundOperation {
            registry: self,
            descriptor,
        })
    }

    /// Bind and invoke in one step.
    #[track_caller]
    pub fn call(&self, host: &mut dyn HostRuntime, name: &str, args: &[Variant]) -> Result<Variant> {
        self.bind(name, args.len())?.call(host, args)
    }
}

/// An operation resolved at bind time.
#[derive(Clone, Copy, Debug)]
pub struct BoundOperation<'r> {
    registry: &'r OperationRegistry,
    descriptor: &'static OperationDescriptor,
}

impl BoundOperation<'_> {
    pub fn descriptor(&self) -> &'static OperationDescriptor {
        self.descriptor
    }

    /// Invoke the operation.
    ///
    /// The thread's errno is left as the native call set it: logging done here never
    /// leaks into what a following `errno` call observes.
    #[track_caller]
    pub fn call(&self, host: &mut dyn HostRuntime, args: &[Variant]) -> Result<Variant> {
        let location = Location::caller();
        let desc = self.descriptor;
        let config = &self.registry.config;

        if args.len() != desc.arity {
            return Err(misuse(PosixError::ArityMismatch {
                op: desc.name,
                expected: desc.arity,
                got: args.len(),
            }));
        }
        if desc.policy == ErrorPolicy::Unsupported {
            log::warn!("{}: not supported", desc.name);
            return Err(PosixError::Unsupported { op: desc.name });
        }

        let entry = Errno::last();
        if config.trace_calls {
            log::trace!("{}({}) at {}", desc.name, args.iter().join(", "), location);
        }

        let outcome = {
            let _span = NativeSpan::enter(desc.name).map_err(misuse)?;
            entry.restore();
            dispatch(desc.name, desc.arms, &*host, args)
        };
        let exit = Errno::last();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = if e.is_unsupported() {
                    log::warn!("{}: not supported", desc.name);
                    e
                } else {
                    misuse(e)
                };
                exit.restore();
                return Err(e);
            }
        };

        let (result, failure) = match outcome {
            Outcome::Info(v) | Outcome::Status(Ok(v)) => (Variant::Int(v), None),
            Outcome::Value(Ok(v)) => (v, None),
            Outcome::Status(Err(errno)) => (Variant::Int(-1), Some(errno)),
            Outcome::Value(Err(errno)) => (Variant::Nil, Some(errno)),
            Outcome::Redispatch(_) => {
                exit.restore();
                return Err(misuse(PosixError::InvalidTable {
                    reason: format!("{}: substitution escaped dispatch", desc.name),
                }));
            }
        };

        match failure {
            Some(errno) => {
                if config.log_os_errors {
                    log::debug!("{}: {}", desc.name, errno);
                }
                errno.restore();
                match desc.policy {
                    ErrorPolicy::Raise => Err(PosixError::Os {
                        op: desc.name,
                        errno,
                        location,
                    }),
                    _ => Ok(result),
                }
            }
            None => {
                if let Some(hook) = desc.on_success {
                    hook(host, args);
                }
                if config.trace_calls {
                    log::trace!("{} -> {}", desc.name, result);
                }
                exit.restore();
                Ok(result)
            }
        }
    }
}

fn misuse(e: PosixError) -> PosixError {
    log::error!("binding misuse: {}", e);
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Invocation, Shape};

    fn zero(_: &Invocation<'_>) -> Result<Outcome> {
        Ok(Outcome::Info(0))
    }

    #[test]
    fn builtin_table_validates() {
        let registry = OperationRegistry::global();
        assert_eq!(registry.operations().len(), OPERATIONS.len());
        assert!(registry.describe("errno=").is_some());
        assert!(registry.describe("execve").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        static TABLE: &[OperationDescriptor] = &[
            OperationDescriptor {
                name: "x",
                arity: 0,
                policy: ErrorPolicy::Informational,
                arms: &[Arm { guard: &[], path: zero }],
                on_success: None,
            },
            OperationDescriptor {
                name: "x",
                arity: 0,
                policy: ErrorPolicy::Informational,
                arms: &[Arm { guard: &[], path: zero }],
                on_success: None,
            },
        ];
        let err = OperationRegistry::from_table(TABLE, BindingConfig::default()).unwrap_err();
        assert!(matches!(err, PosixError::InvalidTable { .. }));
    }

    #[test]
    fn guard_length_must_equal_arity() {
        static TABLE: &[OperationDescriptor] = &[OperationDescriptor {
            name: "x",
            arity: 2,
            policy: ErrorPolicy::PassThrough,
            arms: &[Arm { guard: &[Shape::Int], path: zero }],
            on_success: None,
        }];
        let err = OperationRegistry::from_table(TABLE, BindingConfig::default()).unwrap_err();
        assert!(err.to_string().contains("does not have 2 shapes"));
    }

    #[test]
    fn unsupported_policy_wins_over_the_arm() {
        static TABLE: &[OperationDescriptor] = &[OperationDescriptor {
            name: "setruid",
            arity: 1,
            policy: ErrorPolicy::Unsupported,
            arms: &[Arm { guard: &[Shape::Any], path: zero }],
            on_success: None,
        }];
        let registry = OperationRegistry::from_table(TABLE, BindingConfig::default()).unwrap();
        let mut host = crate::host::ProcessHost::with_directory("/");
        let err = registry.call(&mut host, "setruid", &[Variant::Int(0)]).unwrap_err();
        assert!(matches!(err, PosixError::Unsupported { op: "setruid" }));
    }

    #[test]
    fn descriptors_render_their_arms() {
        let fcntl = OperationRegistry::global().describe("fcntl").unwrap();
        assert_eq!(fcntl.signatures(), "(int, int, nil); (int, int, int)");
        assert_eq!(fcntl.policy.to_string(), "pass-through");
    }
}
