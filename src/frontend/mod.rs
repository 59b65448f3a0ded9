//! Frontend compilation pipeline
//!
//! This module contains the lexer, parser, and type checker, and the
//! [`Compiler`] that drives them and hands the checked program to the code
//! generator. Every stage stops at its first error, which is reported as a
//! [`Diagnostic`].

use crate::middle::codegen::{self, Module};
use crate::util::config::CompileConfig;
use crate::util::diagnostic::{Diagnostic, DiagnosticKind};
use tracing::debug;

pub mod lexer;
pub mod parser;
pub mod typecheck;

use lexer::LexError;
use parser::ast::Program;
use parser::ParseError;
use typecheck::TypeError;

/// Compiler context
#[derive(Debug, Default, Clone)]
pub struct Compiler {
    config: CompileConfig,
}

impl Compiler {
    /// Create a new compiler with the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Lex and parse source code
    pub fn parse(
        &self,
        source: &str,
    ) -> Result<Program, Diagnostic> {
        debug!("Compiling source code ({} bytes)", source.len());
        let tokens = lexer::tokenize(source)?;
        let program = parser::parse(&tokens)?;
        debug!("Parsing successful, got {} items", program.items.len());
        Ok(program)
    }

    /// Compile source code to a module
    pub fn compile(
        &self,
        source: &str,
    ) -> Result<Module, Diagnostic> {
        let program = self.parse(source)?;
        let typed = typecheck::check(&program, &self.config)?;
        let module = codegen::generate(&typed, &self.config)?;
        debug!(
            "Generated {} functions, {} imports, {} data bytes",
            module.functions.len(),
            module.imports.len(),
            module.data_size()
        );
        Ok(module)
    }
}

impl From<LexError> for Diagnostic {
    fn from(error: LexError) -> Self {
        Diagnostic::error(DiagnosticKind::Lex, error.to_string(), error.span())
            .with_help(format!("expected {}", error.expectation()))
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic::error(DiagnosticKind::Parse, error.to_string(), error.span)
    }
}

impl From<TypeError> for Diagnostic {
    fn from(error: TypeError) -> Self {
        let diagnostic = Diagnostic::error(DiagnosticKind::Type, error.to_string(), error.span());
        match error.help() {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_becomes_diagnostic() {
        let err = Compiler::new().compile("let s = \"open;").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lex);
        assert!(err.help.is_some());
    }

    #[test]
    fn test_parse_error_becomes_diagnostic() {
        let err = Compiler::new().compile("fn main( {").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Parse);
        assert!(err.message.starts_with("expected"));
    }

    #[test]
    fn test_type_error_stops_before_codegen() {
        let err = Compiler::new()
            .compile("fn add(a: i32, b: i32) -> i32 { return a + b; } let x = add(1);")
            .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Type);
        assert_eq!(err.span.start.line, 1);
    }

    #[test]
    fn test_compile_success() {
        let module = Compiler::new()
            .compile("fn main() -> i32 { return 1; }")
            .unwrap();
        assert!(module.function_index("main").is_some());
    }
}
