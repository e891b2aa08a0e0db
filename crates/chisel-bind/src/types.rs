//! Target type system
//!
//! This module provides `CsType`, the C# type representation used by the
//! generated tree. It covers the small slice of C# needed for P/Invoke
//! surfaces: primitives, named value types, by-reference wrappers with a
//! direction, fixed buffers, raw pointers, and marshalled types carrying an
//! explicit unmanaged wire size.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive C# types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CsPrimitive {
    /// `void`
    Void,
    /// `bool`
    Bool,
    /// `byte`
    Byte,
    /// `sbyte`
    SByte,
    /// `short`
    Short,
    /// `ushort`
    UShort,
    /// `int`
    Int,
    /// `uint`
    UInt,
    /// `long`
    Long,
    /// `ulong`
    ULong,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `string`
    String,
    /// `IntPtr`
    IntPtr,
}

impl CsPrimitive {
    /// Convert to C# type keyword
    pub fn to_csharp(&self) -> &'static str {
        match self {
            CsPrimitive::Void => "void",
            CsPrimitive::Bool => "bool",
            CsPrimitive::Byte => "byte",
            CsPrimitive::SByte => "sbyte",
            CsPrimitive::Short => "short",
            CsPrimitive::UShort => "ushort",
            CsPrimitive::Int => "int",
            CsPrimitive::UInt => "uint",
            CsPrimitive::Long => "long",
            CsPrimitive::ULong => "ulong",
            CsPrimitive::Float => "float",
            CsPrimitive::Double => "double",
            CsPrimitive::String => "string",
            CsPrimitive::IntPtr => "IntPtr",
        }
    }
}

impl fmt::Display for CsPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_csharp())
    }
}

/// Unmanaged wire representation for marshalled types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnmanagedKind {
    /// 1-byte unsigned
    U1,
    /// 4-byte unsigned
    U4,
    /// 8-byte unsigned
    U8,
}

impl UnmanagedKind {
    /// Convert to the `UnmanagedType` member name
    pub fn to_csharp(&self) -> &'static str {
        match self {
            UnmanagedKind::U1 => "U1",
            UnmanagedKind::U4 => "U4",
            UnmanagedKind::U8 => "U8",
        }
    }
}

/// Parameter passing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefKind {
    /// Passed by value.
    #[default]
    Value,
    /// Read-only reference; the callee does not mutate it observably.
    In,
    /// Pure output; the caller need not initialize it, the callee always
    /// writes it.
    Out,
    /// Mutated and must be initialized by the caller. The conservative
    /// default for by-reference parameters.
    InOut,
}

impl RefKind {
    /// Whether this is any by-reference direction.
    pub fn is_by_ref(&self) -> bool {
        !matches!(self, RefKind::Value)
    }

    /// The C# parameter modifier, with trailing space, or "" for values.
    pub fn modifier(&self) -> &'static str {
        match self {
            RefKind::Value => "",
            RefKind::In => "in ",
            RefKind::Out => "out ",
            RefKind::InOut => "ref ",
        }
    }
}

/// C# type reference in the generated tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CsType {
    /// Primitive keyword type
    Primitive {
        /// Which primitive.
        primitive: CsPrimitive,
    },
    /// Reference to a generated struct or enum by display name
    Named {
        /// Target type name.
        name: String,
    },
    /// Unsafe pointer
    Pointer {
        /// Pointee type.
        inner: Box<CsType>,
    },
    /// Fixed-size inline buffer, always single-dimension
    FixedBuffer {
        /// Element type.
        element: Box<CsType>,
        /// Total element count.
        length: usize,
    },
    /// A type marshalled with an explicit unmanaged wire size
    Marshalled {
        /// The managed-side type.
        inner: Box<CsType>,
        /// Wire representation.
        unmanaged: UnmanagedKind,
    },
    /// Free-text type the mapper could not resolve; rules are expected to
    /// rewrite these before emission
    Free {
        /// Raw type text.
        text: String,
    },
}

impl CsType {
    /// Primitive shorthand
    pub fn primitive(primitive: CsPrimitive) -> Self {
        CsType::Primitive { primitive }
    }

    /// `bool` shorthand
    pub fn bool() -> Self {
        Self::primitive(CsPrimitive::Bool)
    }

    /// `uint` shorthand
    pub fn uint() -> Self {
        Self::primitive(CsPrimitive::UInt)
    }

    /// `int` shorthand
    pub fn int() -> Self {
        Self::primitive(CsPrimitive::Int)
    }

    /// `float` shorthand
    pub fn float() -> Self {
        Self::primitive(CsPrimitive::Float)
    }

    /// `IntPtr` shorthand
    pub fn intptr() -> Self {
        Self::primitive(CsPrimitive::IntPtr)
    }

    /// Named type shorthand
    pub fn named(name: impl Into<String>) -> Self {
        CsType::Named { name: name.into() }
    }

    /// Fixed-buffer shorthand
    pub fn fixed_buffer(element: CsType, length: usize) -> Self {
        CsType::FixedBuffer {
            element: Box::new(element),
            length,
        }
    }

    /// Marshalled-type shorthand
    pub fn marshalled(inner: CsType, unmanaged: UnmanagedKind) -> Self {
        CsType::Marshalled {
            inner: Box::new(inner),
            unmanaged,
        }
    }

    /// Free-text shorthand
    pub fn free(text: impl Into<String>) -> Self {
        CsType::Free { text: text.into() }
    }

    /// The explicit wire size annotation, if any.
    pub fn unmanaged_kind(&self) -> Option<UnmanagedKind> {
        match self {
            CsType::Marshalled { unmanaged, .. } => Some(*unmanaged),
            _ => None,
        }
    }

    /// Whether this is an unresolved free-text type.
    pub fn is_free(&self) -> bool {
        matches!(self, CsType::Free { .. })
    }

    /// Render the C# source text for this type.
    pub fn to_csharp(&self) -> String {
        match self {
            CsType::Primitive { primitive } => primitive.to_csharp().to_string(),
            CsType::Named { name } => name.clone(),
            CsType::Pointer { inner } => format!("{}*", inner.to_csharp()),
            CsType::FixedBuffer { element, .. } => element.to_csharp(),
            CsType::Marshalled { inner, .. } => inner.to_csharp(),
            CsType::Free { text } => text.clone(),
        }
    }
}

impl fmt::Display for CsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_csharp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitive_rendering() {
        assert_eq!(CsType::uint().to_csharp(), "uint");
        assert_eq!(CsType::intptr().to_csharp(), "IntPtr");
    }

    #[test]
    fn test_marshalled_renders_inner() {
        let ty = CsType::marshalled(CsType::bool(), UnmanagedKind::U4);
        assert_eq!(ty.to_csharp(), "bool");
        assert_eq!(ty.unmanaged_kind(), Some(UnmanagedKind::U4));
    }

    #[test]
    fn test_ref_kind_modifiers() {
        assert_eq!(RefKind::Value.modifier(), "");
        assert_eq!(RefKind::In.modifier(), "in ");
        assert_eq!(RefKind::Out.modifier(), "out ");
        assert_eq!(RefKind::InOut.modifier(), "ref ");
        assert!(RefKind::Out.is_by_ref());
        assert!(!RefKind::Value.is_by_ref());
    }

    #[test]
    fn test_fixed_buffer() {
        let ty = CsType::fixed_buffer(CsType::float(), 16);
        assert_eq!(ty.to_csharp(), "float");
        assert!(matches!(ty, CsType::FixedBuffer { length: 16, .. }));
    }
}
