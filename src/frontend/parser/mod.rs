//! Parser module
//!
//! Recursive descent for items and statements, Pratt parsing for
//! expressions. The parser stops at the first error.

pub mod ast;
mod expr;
mod patterns;
mod state;
mod stmt;
mod types;

pub use state::{ParserState, BP_LOWEST};

use crate::frontend::lexer::tokens::*;
use crate::util::span::Span;
use ast::*;
use tracing::debug;

/// Parse error: what was expected, what was found, and where
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub span: Span,
}

/// Parse tokens into a program
///
/// # Arguments
/// * `tokens` - Token stream from the lexer, ending in `Eof`
///
/// # Returns
/// Parsed program or the first parse error
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut state = ParserState::new(tokens);
    let mut items = Vec::new();

    while !state.at_end() {
        if state.skip(&TokenKind::Semicolon) {
            continue;
        }
        items.push(state.parse_item()?);
    }

    let span = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => Span::dummy(),
    };
    debug!("parsed {} items", items.len());

    Ok(Program {
        items,
        node_count: state.node_count(),
        span,
    })
}

/// Parse a single expression
pub fn parse_expression(tokens: &[Token]) -> Result<Expr, ParseError> {
    let mut state = ParserState::new(tokens);
    let expr = state.parse_expression(BP_LOWEST)?;
    if !state.at_end() {
        return Err(state.error("end of input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests;
