//! Type errors

use super::types::Type;
use crate::util::span::Span;
use thiserror::Error;

/// Type error
///
/// Checking stops at the first one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    /// Type mismatch
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: String,
        found: String,
        span: Span,
    },

    /// Name not in scope
    #[error("cannot find {what} '{name}'")]
    Undefined {
        what: &'static str,
        name: String,
        span: Span,
    },

    /// Name declared twice
    #[error("'{name}' is defined more than once")]
    Duplicate { name: String, span: Span },

    /// Wrong number of arguments
    #[error("'{name}' takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// Assignment or mutation of a binding that does not allow it
    #[error("cannot assign to '{name}': {reason}")]
    NotAssignable {
        name: String,
        reason: &'static str,
        span: Span,
    },

    /// Operator or construct applied to unsupported types
    #[error("{message}")]
    InvalidOperation { message: String, span: Span },

    /// `await` on something that is not a promise
    #[error("cannot await a value of type {found}")]
    AwaitNonPromise { found: Type, span: Span },

    /// `?` misuse
    #[error("the '?' operator {message}")]
    InvalidTry { message: String, span: Span },

    /// `break`/`continue` outside a loop
    #[error("'{keyword}' outside of a loop")]
    OutsideLoop { keyword: &'static str, span: Span },

    /// Non-void function that can finish without returning
    #[error("function '{name}' may finish without returning a value of type {ty}")]
    MissingReturn { name: String, ty: Type, span: Span },

    /// Match that misses a variant and has no catch-all arm
    #[error("non-exhaustive match: {missing} not covered")]
    NonExhaustive { missing: String, span: Span },

    /// Expression whose type cannot be determined without a hint
    #[error("type annotations needed for {what}")]
    AnnotationNeeded { what: &'static str, span: Span },

    /// Integer literal that does not fit its type
    #[error("literal {value} does not fit in {ty}")]
    LiteralOutOfRange { value: i128, ty: Type, span: Span },
}

impl TypeError {
    pub fn mismatch(
        expected: &Type,
        found: &Type,
        span: Span,
    ) -> Self {
        TypeError::Mismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    pub fn invalid(
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        TypeError::InvalidOperation {
            message: message.into(),
            span,
        }
    }

    /// Get the error location
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::Undefined { span, .. }
            | TypeError::Duplicate { span, .. }
            | TypeError::ArgumentCount { span, .. }
            | TypeError::NotAssignable { span, .. }
            | TypeError::InvalidOperation { span, .. }
            | TypeError::AwaitNonPromise { span, .. }
            | TypeError::InvalidTry { span, .. }
            | TypeError::OutsideLoop { span, .. }
            | TypeError::MissingReturn { span, .. }
            | TypeError::NonExhaustive { span, .. }
            | TypeError::AnnotationNeeded { span, .. }
            | TypeError::LiteralOutOfRange { span, .. } => *span,
        }
    }

    /// What the checker expected instead, when there is something useful
    /// to say
    pub fn help(&self) -> Option<String> {
        match self {
            TypeError::Mismatch { expected, .. } => {
                Some(format!("this expression must have type {}", expected))
            }
            TypeError::AwaitNonPromise { .. } => {
                Some("only values of type Promise<T> can be awaited".to_string())
            }
            TypeError::NonExhaustive { .. } => {
                Some("add the missing arms or a '_' arm".to_string())
            }
            TypeError::AnnotationNeeded { .. } => {
                Some("add a type annotation to the binding".to_string())
            }
            TypeError::LiteralOutOfRange { .. } => {
                Some("annotate a wider integer type or use 'as'".to_string())
            }
            TypeError::MissingReturn { .. } => {
                Some("end every path with a 'return' statement".to_string())
            }
            _ => None,
        }
    }
}

/// Checker result
pub type TypeResult<T> = Result<T, TypeError>;
