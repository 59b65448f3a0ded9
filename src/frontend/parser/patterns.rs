//! Match pattern parsing

use super::ast::{Pattern, PatternKind};
use super::state::ParserState;
use super::ParseError;
use crate::frontend::lexer::tokens::TokenKind;

impl ParserState<'_> {
    /// Parse a single match pattern
    pub fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.span();
        let kind = match self.kind().clone() {
            TokenKind::Underscore => {
                self.bump();
                PatternKind::Wildcard
            }
            TokenKind::IntLiteral(n) => {
                self.bump();
                PatternKind::Int(n)
            }
            TokenKind::FloatLiteral(f) => {
                self.bump();
                PatternKind::Float(f)
            }
            TokenKind::Minus => {
                self.bump();
                match self.kind().clone() {
                    TokenKind::IntLiteral(n) => {
                        self.bump();
                        PatternKind::Int(-n)
                    }
                    TokenKind::FloatLiteral(f) => {
                        self.bump();
                        PatternKind::Float(-f)
                    }
                    _ => return Err(self.error("numeric literal after '-' in pattern")),
                }
            }
            TokenKind::BoolLiteral(b) => {
                self.bump();
                PatternKind::Bool(b)
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                PatternKind::Str(s)
            }
            TokenKind::Identifier(first) => {
                self.bump();
                let (qualifier, name) = if self.skip(&TokenKind::ColonColon) {
                    let (name, _) = self.expect_ident()?;
                    (Some(first), name)
                } else {
                    (None, first)
                };
                if self.skip(&TokenKind::LParen) {
                    let inner = self.parse_pattern()?;
                    self.expect(&TokenKind::RParen)?;
                    PatternKind::Variant {
                        qualifier,
                        name,
                        payload: Some(Box::new(inner)),
                    }
                } else if qualifier.is_some() {
                    PatternKind::Variant {
                        qualifier,
                        name,
                        payload: None,
                    }
                } else {
                    PatternKind::Binding(name)
                }
            }
            _ => return Err(self.error("pattern")),
        };
        Ok(Pattern {
            kind,
            span: self.span_from(start),
        })
    }
}
