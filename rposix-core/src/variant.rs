use std::fmt;

use crate::memory::NativePointer;

/// A managed value as it crosses into the binding layer.
///
/// The embedding runtime converts its own objects into `Variant`s before calling an
/// operation, and converts the returned `Variant` back. Only the shapes the binding
/// cares about are represented:
/// - `Nil`: the runtime's absent marker
/// - `Int`: any integer that fits in 64 bits
/// - `Str`: a textual value, decoded as UTF-8 by the runtime
/// - `Symbol`: an interned name (`:SOCKET`)
/// - `Pointer`: a native memory handle owned by the runtime
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Pointer(NativePointer),
}

/// Shape of an argument, as seen by the dispatcher.
///
/// This is the decoded form of a [`Variant`]: everything the guard of an arm can
/// look at, with the payload borrowed from the argument slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArgKind<'a> {
    Nil,
    Int(i64),
    Str(&'a str),
    Symbol(&'a str),
    Pointer(&'a NativePointer),
    /// Values no arm can accept (booleans, floats).
    Opaque,
}

impl Variant {
    /// Classify the value for dispatch.
    pub fn kind(&self) -> ArgKind<'_> {
        match self {
            Variant::Nil => ArgKind::Nil,
            Variant::Int(v) => ArgKind::Int(*v),
            Variant::Str(s) => ArgKind::Str(s),
            Variant::Symbol(s) => ArgKind::Symbol(s),
            Variant::Pointer(p) => ArgKind::Pointer(p),
            Variant::Bool(_) | Variant::Float(_) => ArgKind::Opaque,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&NativePointer> {
        match self {
            Variant::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Nil => "nil",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Str(_) => "string",
            Variant::Symbol(_) => "symbol",
            Variant::Pointer(_) => "pointer",
        }
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int(v as i64)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::Int(v as i64)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::Str(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::Str(v)
    }
}

impl From<NativePointer> for Variant {
    fn from(p: NativePointer) -> Self {
        Variant::Pointer(p)
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(v: Option<T>) -> Self {
        v.map_or(Variant::Nil, Into::into)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil => write!(f, "nil"),
            Variant::Bool(b) => write!(f, "{}", b),
            Variant::Int(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Str(s) => write!(f, "{s:?}"),
            Variant::Symbol(s) => write!(f, ":{s}"),
            Variant::Pointer(p) => write!(f, "{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_none_to_nil() {
        assert_eq!(Variant::from(None::<String>), Variant::Nil);
        assert_eq!(Variant::from(Some("x")), Variant::Str("x".into()));
    }

    #[test]
    fn floats_are_opaque_to_dispatch() {
        assert_eq!(Variant::Float(1.5).kind(), ArgKind::Opaque);
        assert_eq!(Variant::Int(-1).kind(), ArgKind::Int(-1));
    }
}
