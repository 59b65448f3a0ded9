//! Type annotation parsing

use super::ast::{TypeExpr, TypeExprKind};
use super::state::ParserState;
use super::ParseError;
use crate::frontend::lexer::tokens::TokenKind;

impl ParserState<'_> {
    /// `[T]`, `Result<T, E>`, `Promise<T>`, `fn(T, ...) -> R`, or a name
    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.span();
        let kind = match self.kind().clone() {
            TokenKind::LBracket => {
                self.bump();
                let elem = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                TypeExprKind::Array(Box::new(elem))
            }
            TokenKind::KwFn => {
                self.bump();
                self.expect(&TokenKind::LParen)?;
                let mut params = Vec::new();
                while !self.at(&TokenKind::RParen) {
                    params.push(self.parse_type()?);
                    if !self.skip(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen)?;
                let ret = if self.skip(&TokenKind::Arrow) {
                    self.parse_type()?
                } else {
                    TypeExpr {
                        kind: TypeExprKind::Named("void".to_string()),
                        span: self.prev_span(),
                    }
                };
                TypeExprKind::Fn(params, Box::new(ret))
            }
            TokenKind::Identifier(name) if name == "Result" => {
                self.bump();
                self.expect(&TokenKind::Lt)?;
                let ok = self.parse_type()?;
                self.expect(&TokenKind::Comma)?;
                let err = self.parse_type()?;
                self.expect(&TokenKind::Gt)?;
                TypeExprKind::Result(Box::new(ok), Box::new(err))
            }
            TokenKind::Identifier(name) if name == "Promise" => {
                self.bump();
                self.expect(&TokenKind::Lt)?;
                let inner = self.parse_type()?;
                self.expect(&TokenKind::Gt)?;
                TypeExprKind::Promise(Box::new(inner))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                TypeExprKind::Named(name)
            }
            _ => return Err(self.error("type")),
        };
        Ok(TypeExpr {
            kind,
            span: self.span_from(start),
        })
    }
}
