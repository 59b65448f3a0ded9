//! Type checker
//!
//! Two passes over one translation unit:
//! 1. signature collection: struct and enum shapes, function and method
//!    signatures go into the [`SymbolTable`] before any body is looked at,
//!    so forward and mutually recursive references resolve;
//! 2. body checking: every function, method, function literal and the
//!    script body is checked against a [`ScopeChain`].
//!
//! The result is a [`TypedProgram`]: the AST plus side tables keyed by
//! [`NodeId`] that the code generator reads instead of re-deriving types.

mod check;
mod errors;
mod expr;
mod pattern;
mod stmt;
pub mod symbols;
pub mod types;

pub use check::TypeChecker;
pub use errors::{TypeError, TypeResult};
pub use symbols::{
    BindingId, BindingInfo, Builtin, EnumShape, FunctionKind, FunctionSig, MethodInfo,
    ScopeChain, StructShape, SymbolTable, VariantShape,
};
pub use types::{IntKind, Type};

use crate::frontend::parser::ast::{NodeId, Program};
use crate::util::config::CompileConfig;
use std::collections::HashMap;
use tracing::debug;

/// How a call expression is dispatched
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// Direct call of a function declared in source
    Function(String),
    /// Direct call of an `extern fn` import
    Extern(String),
    /// Prelude function implemented by the host
    Builtin(Builtin),
    /// `value.method(..)`; the receiver is passed first
    Method { struct_name: String, slot: usize },
    /// `Struct::method(..)` without receiver
    StaticMethod { struct_name: String, slot: usize },
    /// Call through a function value
    Indirect,
    /// `Enum::Variant(payload)`
    Variant { enum_name: String, tag: usize },
    ArrayPush,
    ArrayPop,
    ArrayLen,
    /// `len()` of a string or bytes value
    StrLen,
}

/// What an identifier expression refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Binding of the enclosing function
    Local(BindingId),
    /// Binding of an outer function, read through the closure environment
    Captured(BindingId),
    /// Named function used as a value
    Function(String),
}

/// Function-like bodies that own parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FnKey {
    Function(String),
    Method(String, String),
    Lambda(NodeId),
}

/// Checked program: the AST and everything code generation needs to know
/// about it
#[derive(Debug)]
pub struct TypedProgram<'p> {
    pub program: &'p Program,
    pub symbols: SymbolTable,
    /// Type of every expression
    pub types: HashMap<NodeId, Type>,
    /// Dispatch of every call and method call
    pub calls: HashMap<NodeId, CallTarget>,
    /// Identifier resolution
    pub resolutions: HashMap<NodeId, Resolution>,
    /// `Enum::Variant` path expressions: enum name and tag
    pub variants: HashMap<NodeId, (String, usize)>,
    /// Binding introduced by a `let` (keyed by statement id), a `for`
    /// (keyed by statement id) or a match arm (keyed by the arm body id)
    pub bindings: HashMap<NodeId, BindingId>,
    /// Binding table indexed by [`BindingId`]
    pub binding_info: Vec<BindingInfo>,
    /// Parameter bindings of every function-like body
    pub params: HashMap<FnKey, Vec<BindingId>>,
    /// Captured bindings of every function literal, in environment order
    pub captures: HashMap<NodeId, Vec<BindingId>>,
}

impl TypedProgram<'_> {
    /// Checked type of an expression
    pub fn type_of(
        &self,
        id: NodeId,
    ) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn binding(
        &self,
        id: BindingId,
    ) -> Option<&BindingInfo> {
        self.binding_info.get(id as usize)
    }
}

/// Type-check a parsed program
pub fn check<'p>(
    program: &'p Program,
    config: &CompileConfig,
) -> TypeResult<TypedProgram<'p>> {
    let typed = TypeChecker::new(program, config).run()?;
    debug!(
        "type-checked {} functions, {} structs, {} enums",
        typed.symbols.functions.len(),
        typed.symbols.structs.len(),
        typed.symbols.enums.len()
    );
    Ok(typed)
}

#[cfg(test)]
mod tests;
