//! Argument-shape dispatch.
//!
//! An operation lists its arms in declaration order. Each arm carries one [`Shape`] per
//! argument; the first arm whose shapes all accept the classified arguments is invoked.
//! No match is a defect in the calling layer and is reported, never defaulted.

use std::ffi::CString;

use itertools::Itertools;
use libc::c_int;

use crate::error::{NativeResult, PosixError, Result};
use crate::host::HostRuntime;
use crate::memory::{MemoryView, NativePointer};
use crate::native;
use crate::variant::{ArgKind, Variant};

/// What an arm's guard accepts at one argument position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Shape {
    #[strum(serialize = "any")]
    Any,
    #[strum(serialize = "nil")]
    Nil,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "string")]
    Str,
    #[strum(serialize = "symbol")]
    Symbol,
    #[strum(serialize = "pointer")]
    Pointer,
}

impl Shape {
    pub fn accepts(self, arg: ArgKind<'_>) -> bool {
        matches!(
            (self, arg),
            (Shape::Any, _)
                | (Shape::Nil, ArgKind::Nil)
                | (Shape::Int, ArgKind::Int(_))
                | (Shape::Str, ArgKind::Str(_))
                | (Shape::Symbol, ArgKind::Symbol(_))
                | (Shape::Pointer, ArgKind::Pointer(_))
        )
    }
}

/// Native call path of an arm.
pub type NativePath = fn(&Invocation<'_>) -> Result<Outcome>;

/// One alternative call path of an operation.
#[derive(Clone, Copy)]
pub struct Arm {
    pub guard: &'static [Shape],
    pub path: NativePath,
}

impl Arm {
    pub fn matches(&self, args: &[Variant]) -> bool {
        self.guard.len() == args.len()
            && self
                .guard
                .iter()
                .zip(args)
                .all(|(shape, arg)| shape.accepts(arg.kind()))
    }

    /// `(string, int)` style rendering of the guard.
    pub fn signature(&self) -> String {
        format!("({})", self.guard.iter().join(", "))
    }
}

impl std::fmt::Debug for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Arm{}", self.signature())
    }
}

/// Raw result of a call path, before the operation's error policy is applied.
#[derive(Debug)]
pub enum Outcome {
    /// Integer result of a sentinel-convention call.
    Status(NativeResult<i64>),
    /// Managed value produced by a sentinel-convention call.
    Value(NativeResult<Variant>),
    /// Informational integer; never an error, even when negative.
    Info(i64),
    /// Dispatch again with substituted arguments.
    Redispatch(Vec<Variant>),
}

impl Outcome {
    pub fn status<T: Into<i64>>(r: NativeResult<T>) -> Outcome {
        Outcome::Status(r.map(Into::into))
    }

    pub fn value(v: impl Into<Variant>) -> Outcome {
        Outcome::Value(Ok(v.into()))
    }

    pub fn info<T: Into<i64>>(v: T) -> Outcome {
        Outcome::Info(v.into())
    }
}

/// The arguments of one call, with typed accessors for call paths.
///
/// Accessors re-check the shape they decode, so a path that disagrees with its guard
/// fails as binding misuse instead of reading garbage.
pub struct Invocation<'a> {
    op: &'static str,
    args: &'a [Variant],
    host: &'a dyn HostRuntime,
}

impl<'a> Invocation<'a> {
    pub fn new(op: &'static str, args: &'a [Variant], host: &'a dyn HostRuntime) -> Self {
        Self { op, args, host }
    }

    pub fn args(&self) -> &'a [Variant] {
        self.args
    }

    pub fn host(&self) -> &'a dyn HostRuntime {
        self.host
    }

    fn arg(&self, index: usize) -> Result<&'a Variant> {
        self.args.get(index).ok_or_else(|| PosixError::ArityMismatch {
            op: self.op,
            expected: index + 1,
            got: self.args.len(),
        })
    }

    fn unexpected(&self, index: usize, expected: Shape) -> PosixError {
        let got = self.args.get(index).map_or("nothing", Variant::type_name);
        PosixError::InvalidArgument {
            op: self.op,
            reason: format!("argument {index}: expected {expected}, got {got}"),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        self.arg(index)?
            .as_int()
            .ok_or_else(|| self.unexpected(index, Shape::Int))
    }

    /// Integer argument narrowed to a C `int`, as the native prototypes take it.
    pub fn c_int(&self, index: usize) -> Result<c_int> {
        let value = self.int(index)?;
        c_int::try_from(value).map_err(|_| PosixError::OutOfRange {
            op: self.op,
            index,
            value,
        })
    }

    /// Non-negative integer argument (lengths, counts).
    pub fn len(&self, index: usize) -> Result<usize> {
        let value = self.int(index)?;
        usize::try_from(value).map_err(|_| PosixError::OutOfRange {
            op: self.op,
            index,
            value,
        })
    }

    pub fn socklen(&self, index: usize) -> Result<libc::socklen_t> {
        let value = self.int(index)?;
        libc::socklen_t::try_from(value).map_err(|_| PosixError::OutOfRange {
            op: self.op,
            index,
            value,
        })
    }

    pub fn str(&self, index: usize) -> Result<&'a str> {
        self.arg(index)?
            .as_str()
            .ok_or_else(|| self.unexpected(index, Shape::Str))
    }

    pub fn c_string(&self, index: usize) -> Result<CString> {
        native::c_string(self.op, index, self.str(index)?)
    }

    pub fn symbol(&self, index: usize) -> Result<&'a str> {
        match self.arg(index)? {
            Variant::Symbol(s) => Ok(s),
            _ => Err(self.unexpected(index, Shape::Symbol)),
        }
    }

    pub fn pointer(&self, index: usize) -> Result<&'a NativePointer> {
        self.arg(index)?
            .as_pointer()
            .ok_or_else(|| self.unexpected(index, Shape::Pointer))
    }

    /// View of a pointer argument that must be populated.
    pub fn view(&self, index: usize) -> Result<MemoryView<'a>> {
        MemoryView::acquire(self.pointer(index)?).map_err(|source| PosixError::Memory {
            op: self.op,
            index,
            source,
        })
    }

    /// View of a pointer argument that may be nil or a null pointer.
    pub fn nullable_view(&self, index: usize) -> Result<Option<MemoryView<'a>>> {
        match self.arg(index)? {
            Variant::Nil => Ok(None),
            Variant::Pointer(p) if p.is_null() => Ok(None),
            _ => self.view(index).map(Some),
        }
    }

    /// Attach the operation name and argument position to a memory error.
    pub fn memory<T>(&self, index: usize, r: std::result::Result<T, crate::memory::MemoryError>) -> Result<T> {
        r.map_err(|source| PosixError::Memory {
            op: self.op,
            index,
            source,
        })
    }

    pub fn misuse(&self, reason: impl Into<String>) -> PosixError {
        PosixError::InvalidArgument {
            op: self.op,
            reason: reason.into(),
        }
    }

    pub fn unsupported(&self) -> PosixError {
        PosixError::Unsupported { op: self.op }
    }
}

/// First arm, in declaration order, whose guard accepts `args`.
pub fn select<'t>(op: &'static str, arms: &'t [Arm], args: &[Variant]) -> Result<&'t Arm> {
    arms.iter()
        .find(|arm| arm.matches(args))
        .ok_or_else(|| no_match(op, args))
}

fn no_match(op: &'static str, args: &[Variant]) -> PosixError {
    PosixError::NoMatchingArm {
        op,
        shapes: args.iter().map(Variant::type_name).join(", "),
    }
}

/// Select an arm and run its path. A path may substitute arguments once and ask for the
/// populated-argument arm; a second substitution is a defect in the table.
pub fn dispatch(
    op: &'static str,
    arms: &[Arm],
    host: &dyn HostRuntime,
    args: &[Variant],
) -> Result<Outcome> {
    let arm = select(op, arms, args)?;
    match (arm.path)(&Invocation::new(op, args, host))? {
        Outcome::Redispatch(substituted) => {
            // report what the caller passed, not the substitution
            let arm = select(op, arms, &substituted).map_err(|_| no_match(op, args))?;
            match (arm.path)(&Invocation::new(op, &substituted, host))? {
                Outcome::Redispatch(_) => Err(PosixError::InvalidTable {
                    reason: format!("{op}: arm {} substituted twice", arm.signature()),
                }),
                outcome => Ok(outcome),
            }
        }
        outcome => Ok(outcome),
    }
}
