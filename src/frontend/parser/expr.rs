//! Expression parsing (Pratt)

use super::ast::*;
use super::state::*;
use super::ParseError;
use crate::frontend::lexer::tokens::TokenKind;
use crate::util::span::Span;

/// What an infix/postfix token does once its binding power allows it
enum Infix {
    Binary(BinaryOp),
    Cast,
    Try,
    Call,
    Member,
    Index,
}

fn infix_binding_power(kind: &TokenKind) -> Option<(u8, Infix)> {
    let entry = match kind {
        TokenKind::Or => (BP_OR, Infix::Binary(BinaryOp::Or)),
        TokenKind::And => (BP_AND, Infix::Binary(BinaryOp::And)),
        TokenKind::EqEq => (BP_EQ, Infix::Binary(BinaryOp::Eq)),
        TokenKind::Neq => (BP_EQ, Infix::Binary(BinaryOp::Neq)),
        TokenKind::Lt => (BP_CMP, Infix::Binary(BinaryOp::Lt)),
        TokenKind::Le => (BP_CMP, Infix::Binary(BinaryOp::Le)),
        TokenKind::Gt => (BP_CMP, Infix::Binary(BinaryOp::Gt)),
        TokenKind::Ge => (BP_CMP, Infix::Binary(BinaryOp::Ge)),
        TokenKind::Plus => (BP_ADD, Infix::Binary(BinaryOp::Add)),
        TokenKind::Minus => (BP_ADD, Infix::Binary(BinaryOp::Sub)),
        TokenKind::Star => (BP_MUL, Infix::Binary(BinaryOp::Mul)),
        TokenKind::Slash => (BP_MUL, Infix::Binary(BinaryOp::Div)),
        TokenKind::Percent => (BP_MUL, Infix::Binary(BinaryOp::Rem)),
        TokenKind::KwAs => (BP_CAST, Infix::Cast),
        TokenKind::Question => (BP_TRY, Infix::Try),
        TokenKind::LParen => (BP_CALL, Infix::Call),
        TokenKind::Dot => (BP_CALL, Infix::Member),
        TokenKind::LBracket => (BP_CALL, Infix::Index),
        _ => return None,
    };
    Some(entry)
}

impl ParserState<'_> {
    /// Parse an expression whose operators all bind tighter than `min_bp`
    pub fn parse_expression(
        &mut self,
        min_bp: u8,
    ) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        while let Some((bp, infix)) = infix_binding_power(self.kind()) {
            if bp <= min_bp {
                break;
            }
            let start = lhs.span;
            self.bump();
            let kind = match infix {
                Infix::Binary(op) => {
                    let rhs = self.parse_expression(bp)?;
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    }
                }
                Infix::Cast => {
                    let ty = self.parse_type()?;
                    ExprKind::Cast {
                        expr: Box::new(lhs),
                        ty,
                    }
                }
                Infix::Try => ExprKind::Try(Box::new(lhs)),
                Infix::Call => {
                    let args = self.parse_call_args()?;
                    ExprKind::Call {
                        callee: Box::new(lhs),
                        args,
                    }
                }
                Infix::Member => {
                    let (name, _) = self.expect_ident()?;
                    if self.skip(&TokenKind::LParen) {
                        let args = self.parse_call_args()?;
                        ExprKind::MethodCall {
                            receiver: Box::new(lhs),
                            method: name,
                            args,
                        }
                    } else {
                        ExprKind::Field {
                            object: Box::new(lhs),
                            field: name,
                        }
                    }
                }
                Infix::Index => {
                    let index = self.restricted(false, |p| p.parse_expression(BP_LOWEST))?;
                    self.expect(&TokenKind::RBracket)?;
                    ExprKind::Index {
                        object: Box::new(lhs),
                        index: Box::new(index),
                    }
                }
            };
            lhs = self.make_expr(kind, self.span_from(start));
        }

        Ok(lhs)
    }

    /// Parse an expression in a context where `Name {` opens a block
    pub fn parse_expression_no_struct(&mut self) -> Result<Expr, ParseError> {
        self.restricted(true, |p| p.parse_expression(BP_LOWEST))
    }

    fn make_expr(
        &mut self,
        kind: ExprKind,
        span: Span,
    ) -> Expr {
        Expr {
            id: self.next_id(),
            kind,
            span,
        }
    }

    /// Arguments after an already consumed `(`
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.restricted(false, |p| {
            let mut args = Vec::new();
            while !p.at(&TokenKind::RParen) {
                args.push(p.parse_expression(BP_LOWEST)?);
                if !p.skip(&TokenKind::Comma) {
                    break;
                }
            }
            p.expect(&TokenKind::RParen)?;
            Ok(args)
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let kind = match self.kind() {
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_expression(BP_UNARY)?;
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                }
            }
            TokenKind::Not => {
                self.bump();
                let operand = self.parse_expression(BP_UNARY)?;
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                }
            }
            // The operand stops before `?`, so `await f()?` is `(await f())?`
            TokenKind::KwAwait => {
                self.bump();
                let operand = self.parse_expression(BP_TRY)?;
                ExprKind::Await(Box::new(operand))
            }
            _ => return self.parse_primary(),
        };
        Ok(self.make_expr(kind, self.span_from(start)))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let kind = match self.kind().clone() {
            TokenKind::IntLiteral(n) => {
                self.bump();
                ExprKind::Int(n)
            }
            TokenKind::FloatLiteral(f) => {
                self.bump();
                ExprKind::Float(f)
            }
            TokenKind::BoolLiteral(b) => {
                self.bump();
                ExprKind::Bool(b)
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                ExprKind::Str(s)
            }
            TokenKind::BytesLiteral(b) => {
                self.bump();
                ExprKind::Bytes(b)
            }
            TokenKind::StringStart(text) => {
                self.bump();
                self.parse_interpolation(text)?
            }
            TokenKind::Identifier(name) => {
                self.bump();
                self.parse_identifier_expr(name)?
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.restricted(false, |p| p.parse_expression(BP_LOWEST))?;
                self.expect(&TokenKind::RParen)?;
                return Ok(Expr {
                    span: self.span_from(start),
                    ..inner
                });
            }
            TokenKind::LBracket => {
                self.bump();
                let elements = self.restricted(false, |p| {
                    let mut elements = Vec::new();
                    while !p.at(&TokenKind::RBracket) {
                        elements.push(p.parse_expression(BP_LOWEST)?);
                        if !p.skip(&TokenKind::Comma) {
                            break;
                        }
                    }
                    Ok(elements)
                })?;
                self.expect(&TokenKind::RBracket)?;
                ExprKind::Array(elements)
            }
            TokenKind::KwMatch => {
                self.bump();
                self.parse_match()?
            }
            TokenKind::KwFn => {
                self.bump();
                self.parse_lambda()?
            }
            _ => return Err(self.error("expression")),
        };
        Ok(self.make_expr(kind, self.span_from(start)))
    }

    /// Identifier-led primaries: paths, `Ok`/`Err`, struct literals, names
    fn parse_identifier_expr(
        &mut self,
        name: String,
    ) -> Result<ExprKind, ParseError> {
        if self.skip(&TokenKind::ColonColon) {
            let (member, _) = self.expect_ident()?;
            return Ok(ExprKind::Path {
                qualifier: name,
                name: member,
            });
        }

        if (name == "Ok" || name == "Err") && self.at(&TokenKind::LParen) {
            self.bump();
            let value = self.restricted(false, |p| p.parse_expression(BP_LOWEST))?;
            self.expect(&TokenKind::RParen)?;
            return Ok(ExprKind::ResultCtor {
                is_ok: name == "Ok",
                value: Box::new(value),
            });
        }

        if self.at(&TokenKind::LBrace) && self.struct_literal_allowed() {
            self.bump();
            let fields = self.restricted(false, |p| {
                let mut fields = Vec::new();
                while !p.at(&TokenKind::RBrace) {
                    let (field, field_span) = p.expect_ident()?;
                    p.expect(&TokenKind::Colon)?;
                    let value = p.parse_expression(BP_LOWEST)?;
                    fields.push(FieldInit {
                        name: field,
                        span: p.span_from(field_span),
                        value,
                    });
                    if !p.skip(&TokenKind::Comma) {
                        break;
                    }
                }
                Ok(fields)
            })?;
            self.expect(&TokenKind::RBrace)?;
            return Ok(ExprKind::StructLit { name, fields });
        }

        Ok(ExprKind::Ident(name))
    }

    /// Interpolated string after its `StringStart`
    fn parse_interpolation(
        &mut self,
        head: String,
    ) -> Result<ExprKind, ParseError> {
        let mut parts = Vec::new();
        if !head.is_empty() {
            parts.push(InterpPart::Text(head));
        }
        loop {
            let expr = self.restricted(false, |p| p.parse_expression(BP_LOWEST))?;
            parts.push(InterpPart::Expr(expr));
            match self.kind().clone() {
                TokenKind::StringMiddle(text) => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(InterpPart::Text(text));
                    }
                }
                TokenKind::StringEnd(text) => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(InterpPart::Text(text));
                    }
                    return Ok(ExprKind::Interp(parts));
                }
                _ => return Err(self.error("'}' closing the interpolated expression")),
            }
        }
    }

    /// `match` after the keyword
    fn parse_match(&mut self) -> Result<ExprKind, ParseError> {
        let scrutinee = self.parse_expression_no_struct()?;
        self.expect(&TokenKind::LBrace)?;
        let arms = self.restricted(false, |p| {
            let mut arms = Vec::new();
            while !p.at(&TokenKind::RBrace) {
                let start = p.span();
                let pattern = p.parse_pattern()?;
                p.expect(&TokenKind::FatArrow)?;
                let body = if p.at(&TokenKind::LBrace) {
                    let block = p.parse_block()?;
                    let span = block.span;
                    p.skip(&TokenKind::Comma);
                    p.make_expr(ExprKind::Block(block), span)
                } else {
                    let body = p.parse_expression(BP_LOWEST)?;
                    if !p.skip(&TokenKind::Comma) && !p.at(&TokenKind::RBrace) {
                        return Err(p.error("',' or '}' after match arm"));
                    }
                    body
                };
                arms.push(MatchArm {
                    pattern,
                    body,
                    span: p.span_from(start),
                });
            }
            Ok(arms)
        })?;
        self.expect(&TokenKind::RBrace)?;
        Ok(ExprKind::Match {
            scrutinee: Box::new(scrutinee),
            arms,
        })
    }

    /// Function literal after `fn`: `fn(x: T) -> R => expr` or
    /// `fn(x: T) -> R { ... }`
    fn parse_lambda(&mut self) -> Result<ExprKind, ParseError> {
        let params = self.parse_params()?;
        let return_type = if self.skip(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = if self.skip(&TokenKind::FatArrow) {
            let expr = self.restricted(false, |p| p.parse_expression(BP_LOWEST))?;
            LambdaBody::Expr(Box::new(expr))
        } else if self.at(&TokenKind::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            return Err(self.error("'=>' or '{' after function literal signature"));
        };
        Ok(ExprKind::Lambda {
            params,
            return_type,
            body,
        })
    }
}
