//! Parser state and token stream management

use super::ast::NodeId;
use super::ParseError;
use crate::frontend::lexer::tokens::*;
use crate::util::span::Span;

/// Binding power levels for the Pratt parser
pub const BP_LOWEST: u8 = 0;
pub const BP_OR: u8 = 1;
pub const BP_AND: u8 = 2;
pub const BP_EQ: u8 = 3;
pub const BP_CMP: u8 = 4;
pub const BP_ADD: u8 = 5;
pub const BP_MUL: u8 = 6;
pub const BP_CAST: u8 = 7;
pub const BP_UNARY: u8 = 8;
pub const BP_TRY: u8 = 9;
pub const BP_CALL: u8 = 10;

/// Parser state for tracking position
#[derive(Debug)]
pub struct ParserState<'a> {
    /// Token stream, terminated by `Eof`
    tokens: &'a [Token],
    /// Current position in token stream
    pos: usize,
    /// Next node id
    next_id: NodeId,
    /// Set while parsing an `if`/`while` condition, a `for` iterable or a
    /// `match` scrutinee: `Name {` opens the body, not a struct literal
    no_struct_literal: bool,
}

impl<'a> ParserState<'a> {
    /// Create a new parser state
    #[inline]
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 0,
            no_struct_literal: false,
        }
    }

    /// Check if at end of token stream
    #[inline]
    pub fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Get current token kind
    #[inline]
    pub fn kind(&self) -> &TokenKind {
        self.peek_kind(0)
    }

    /// Peek at the kind `n` tokens ahead
    #[inline]
    pub fn peek_kind(
        &self,
        n: usize,
    ) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Span of the current token
    #[inline]
    pub fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(Span::dummy)
    }

    /// Span of the previously consumed token
    #[inline]
    pub fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map(|t| t.span)
            .unwrap_or_else(|| self.span())
    }

    /// Span from `start` to the end of the previous token
    #[inline]
    pub fn span_from(
        &self,
        start: Span,
    ) -> Span {
        start.merge(self.prev_span())
    }

    /// Check the current token kind
    #[inline]
    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    /// Advance to next token, returning the consumed one
    #[inline]
    pub fn bump(&mut self) -> TokenKind {
        let kind = self.kind().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        kind
    }

    /// Skip a specific token
    #[inline]
    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> Result<Span, ParseError> {
        if self.at(kind) {
            let span = self.span();
            self.bump();
            Ok(span)
        } else {
            Err(self.error(format!("'{}'", kind)))
        }
    }

    /// Expect an identifier and return its name
    pub fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.span();
                self.bump();
                Ok((name, span))
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// Build an error against the current token
    pub fn error(
        &self,
        expected: impl Into<String>,
    ) -> ParseError {
        ParseError {
            expected: expected.into(),
            found: self.kind().describe(),
            span: self.span(),
        }
    }

    /// Allocate a fresh node id
    #[inline]
    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn node_count(&self) -> u32 {
        self.next_id
    }

    /// Whether struct literals are currently disallowed
    #[inline]
    pub fn struct_literal_allowed(&self) -> bool {
        !self.no_struct_literal
    }

    /// Run `f` with struct literals disallowed (`true`) or re-allowed
    /// (`false`), restoring the previous setting afterwards
    pub fn restricted<T>(
        &mut self,
        no_struct_literal: bool,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = std::mem::replace(&mut self.no_struct_literal, no_struct_literal);
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }
}
