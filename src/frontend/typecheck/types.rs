//! Semantic types

use serde::Serialize;
use std::fmt;

/// Integer widths and signedness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    /// Whether values live in a 64-bit slot
    pub fn is_wide(self) -> bool {
        self.bits() == 64
    }

    /// Inclusive value range
    pub fn range(self) -> (i128, i128) {
        let bits = self.bits();
        if self.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }

    pub fn contains(
        self,
        value: i128,
    ) -> bool {
        let (lo, hi) = self.range();
        value >= lo && value <= hi
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

/// A checked type.
///
/// Compound types compare structurally, structs and enums by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Void,
    Bool,
    Int(IntKind),
    Float,
    Str,
    Bytes,
    Array(Box<Type>),
    Result(Box<Type>, Box<Type>),
    Promise(Box<Type>),
    Fn(Vec<Type>, Box<Type>),
    Struct(String),
    Enum(String),
    /// Type of expressions that never produce a value (diverging blocks)
    Never,
}

impl Type {
    pub const I32: Type = Type::Int(IntKind::I32);

    /// Resolve a primitive type name
    pub fn primitive(name: &str) -> Option<Type> {
        let ty = match name {
            "void" => Type::Void,
            "bool" => Type::Bool,
            "i8" => Type::Int(IntKind::I8),
            "i16" => Type::Int(IntKind::I16),
            "i32" => Type::Int(IntKind::I32),
            "i64" => Type::Int(IntKind::I64),
            "u8" => Type::Int(IntKind::U8),
            "u16" => Type::Int(IntKind::U16),
            "u32" => Type::Int(IntKind::U32),
            "u64" => Type::Int(IntKind::U64),
            "f64" | "float" => Type::Float,
            "string" => Type::Str,
            "bytes" => Type::Bytes,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int(_) | Type::Float)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    /// Whether the type occupies a 64-bit value slot (i64/u64/f64)
    pub fn is_wide(&self) -> bool {
        match self {
            Type::Int(kind) => kind.is_wide(),
            Type::Float => true,
            _ => false,
        }
    }

    /// Whether a value of type `actual` may flow where `self` is expected
    pub fn accepts(
        &self,
        actual: &Type,
    ) -> bool {
        *actual == Type::Never || self == actual
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn result(
        ok: Type,
        err: Type,
    ) -> Type {
        Type::Result(Box::new(ok), Box::new(err))
    }

    pub fn promise(inner: Type) -> Type {
        Type::Promise(Box::new(inner))
    }
}

impl fmt::Display for Type {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int(kind) => write!(f, "{}", kind.name()),
            Type::Float => write!(f, "f64"),
            Type::Str => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::Array(elem) => write!(f, "[{}]", elem),
            Type::Result(ok, err) => write!(f, "Result<{}, {}>", ok, err),
            Type::Promise(inner) => write!(f, "Promise<{}>", inner),
            Type::Fn(params, ret) => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Struct(name) | Type::Enum(name) => write!(f, "{}", name),
            Type::Never => write!(f, "!"),
        }
    }
}
