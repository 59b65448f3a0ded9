//! Unified diagnostics
//!
//! Every pipeline stage reports its first failure as a [`Diagnostic`]:
//! a kind, a rendered message, an optional expectation hint and the
//! source span it refers to.
//!
//! # Example
//!
//! ```ignore
//! let diagnostic = wavelet::compile("fn main( {").unwrap_err();
//! println!("{}", diagnostic.render(&SourceFile::new("main.wv", source)));
//! ```

pub mod emitter;

pub use emitter::{EmitterConfig, TextEmitter};

use crate::util::span::{SourceFile, Span};
use serde::Serialize;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which stage produced the diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Lexical error
    Lex,
    /// Syntax error
    Parse,
    /// Static type error
    Type,
    /// Checker/generator mismatch; never caused by user code alone
    Internal,
}

impl DiagnosticKind {
    /// Short error code printed in the header
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "E0001",
            DiagnosticKind::Parse => "E0002",
            DiagnosticKind::Type => "E0003",
            DiagnosticKind::Internal => "E9999",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            DiagnosticKind::Lex => write!(f, "lex error"),
            DiagnosticKind::Parse => write!(f, "parse error"),
            DiagnosticKind::Type => write!(f, "type error"),
            DiagnosticKind::Internal => write!(f, "internal compiler error"),
        }
    }
}

/// A rendered compiler diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Producing stage
    pub kind: DiagnosticKind,
    /// Main message
    pub message: String,
    /// What the compiler expected instead, if known
    pub help: Option<String>,
    /// Location
    pub span: Span,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            help: None,
            span,
        }
    }

    /// Attach a help line
    pub fn with_help(
        mut self,
        help: impl Into<String>,
    ) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with the default text emitter
    pub fn render(
        &self,
        source: &SourceFile,
    ) -> String {
        TextEmitter::new().render(self, Some(source))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.span, self.message)
    }
}

impl std::error::Error for Diagnostic {}
