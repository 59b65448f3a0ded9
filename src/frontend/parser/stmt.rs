//! Item and statement parsing

use super::ast::*;
use super::state::*;
use super::ParseError;
use crate::frontend::lexer::tokens::TokenKind;
use crate::util::span::Span;

impl ParserState<'_> {
    /// Parse one top-level item
    pub fn parse_item(&mut self) -> Result<Item, ParseError> {
        let start = self.span();
        match self.kind() {
            TokenKind::KwExport => {
                self.bump();
                let is_async = self.skip(&TokenKind::KwAsync);
                self.expect(&TokenKind::KwFn)?;
                let mut decl = self.parse_function(start, is_async, None)?;
                decl.is_export = true;
                Ok(Item::Function(decl))
            }
            TokenKind::KwAsync => {
                self.bump();
                self.expect(&TokenKind::KwFn)?;
                Ok(Item::Function(self.parse_function(start, true, None)?))
            }
            TokenKind::KwFn if matches!(self.peek_kind(1), TokenKind::Identifier(_)) => {
                self.bump();
                Ok(Item::Function(self.parse_function(start, false, None)?))
            }
            TokenKind::KwExtern => {
                self.bump();
                self.expect(&TokenKind::KwFn)?;
                let (name, _) = self.expect_ident()?;
                let (params, _) = self.parse_param_list(None)?;
                let return_type = self.parse_return_type()?;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Item::Function(FunctionDecl {
                    name,
                    params,
                    return_type,
                    body: None,
                    is_async: false,
                    is_extern: true,
                    is_export: false,
                    has_self: false,
                    span: self.span_from(start),
                }))
            }
            TokenKind::KwStruct => {
                self.bump();
                Ok(Item::Struct(self.parse_struct(start)?))
            }
            TokenKind::KwEnum => {
                self.bump();
                Ok(Item::Enum(self.parse_enum(start)?))
            }
            _ => Ok(Item::Stmt(self.parse_stmt()?)),
        }
    }

    /// Function after `fn`; `owner` names the struct for methods
    fn parse_function(
        &mut self,
        start: Span,
        is_async: bool,
        owner: Option<&str>,
    ) -> Result<FunctionDecl, ParseError> {
        let (name, _) = self.expect_ident()?;
        let (params, has_self) = self.parse_param_list(owner)?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body: Some(body),
            is_async,
            is_extern: false,
            is_export: false,
            has_self,
            span: self.span_from(start),
        })
    }

    fn parse_return_type(&mut self) -> Result<Option<TypeExpr>, ParseError> {
        if self.skip(&TokenKind::Arrow) {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    /// Parameter list of a function literal
    pub fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.parse_param_list(None).map(|(params, _)| params)
    }

    /// `( [self,] name: T, ... )`. `self` is accepted only as the first
    /// parameter of a method and is typed as the owning struct.
    fn parse_param_list(
        &mut self,
        owner: Option<&str>,
    ) -> Result<(Vec<Param>, bool), ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut has_self = false;
        while !self.at(&TokenKind::RParen) {
            let (name, span) = self.expect_ident()?;
            if name == "self" {
                match owner {
                    Some(owner) if params.is_empty() => {
                        has_self = true;
                        params.push(Param {
                            name,
                            ty: TypeExpr {
                                kind: TypeExprKind::Named(owner.to_string()),
                                span,
                            },
                            span,
                        });
                    }
                    _ => {
                        return Err(ParseError {
                            expected: "parameter name".to_string(),
                            found: "'self'".to_string(),
                            span,
                        })
                    }
                }
            } else {
                self.expect(&TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name,
                    ty,
                    span: self.span_from(span),
                });
            }
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok((params, has_self))
    }

    fn parse_struct(
        &mut self,
        start: Span,
    ) -> Result<StructDecl, ParseError> {
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let member_start = self.span();
            if self.at(&TokenKind::KwFn) || self.at(&TokenKind::KwAsync) {
                let is_async = self.skip(&TokenKind::KwAsync);
                self.expect(&TokenKind::KwFn)?;
                methods.push(self.parse_function(member_start, is_async, Some(&name))?);
                self.skip(&TokenKind::Comma);
                continue;
            }
            let (field, _) = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl {
                name: field,
                ty,
                span: self.span_from(member_start),
            });
            if !self.skip(&TokenKind::Comma) && !self.at(&TokenKind::RBrace) {
                // fields run straight into methods without a comma
                if !(self.at(&TokenKind::KwFn) || self.at(&TokenKind::KwAsync)) {
                    return Err(self.error("',' or '}' after struct field"));
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(StructDecl {
            name,
            fields,
            methods,
            span: self.span_from(start),
        })
    }

    fn parse_enum(
        &mut self,
        start: Span,
    ) -> Result<EnumDecl, ParseError> {
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let (variant, variant_span) = self.expect_ident()?;
            let payload = if self.skip(&TokenKind::LParen) {
                let ty = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Some(ty)
            } else {
                None
            };
            variants.push(VariantDecl {
                name: variant,
                payload,
                span: self.span_from(variant_span),
            });
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(EnumDecl {
            name,
            variants,
            span: self.span_from(start),
        })
    }

    /// `{ stmt* }`
    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?;
        let stmts = self.restricted(false, |p| {
            let mut stmts = Vec::new();
            while !p.at(&TokenKind::RBrace) {
                if p.at_end() {
                    return Err(p.error("'}'"));
                }
                if p.skip(&TokenKind::Semicolon) {
                    continue;
                }
                stmts.push(p.parse_stmt()?);
            }
            Ok(stmts)
        })?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    /// Parse one statement
    pub fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        let kind = match self.kind() {
            TokenKind::KwLet | TokenKind::KwConst => {
                let is_const = self.bump() == TokenKind::KwConst;
                let (name, _) = self.expect_ident()?;
                let ty = if self.skip(&TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                self.expect(&TokenKind::Eq)?;
                let init = self.parse_expression(BP_LOWEST)?;
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::Let {
                    id: self.next_id(),
                    name,
                    is_const,
                    ty,
                    init,
                }
            }
            TokenKind::KwIf => {
                self.bump();
                self.parse_if()?
            }
            TokenKind::KwWhile => {
                self.bump();
                let cond = self.parse_expression_no_struct()?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::KwFor => {
                self.bump();
                let (var, _) = self.expect_ident()?;
                self.expect(&TokenKind::KwIn)?;
                let iterable = self.parse_expression_no_struct()?;
                let body = self.parse_block()?;
                StmtKind::For {
                    id: self.next_id(),
                    var,
                    iterable,
                    body,
                }
            }
            TokenKind::KwBreak => {
                self.bump();
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::Break
            }
            TokenKind::KwContinue => {
                self.bump();
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::Continue
            }
            TokenKind::KwReturn => {
                self.bump();
                let value = if self.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(BP_LOWEST)?)
                };
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            _ => self.parse_expr_stmt()?,
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// `if` after the keyword
    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        let cond = self.parse_expression_no_struct()?;
        let then_block = self.parse_block()?;
        let else_block = if self.skip(&TokenKind::KwElse) {
            if self.at(&TokenKind::KwIf) {
                let start = self.span();
                self.bump();
                let nested = self.parse_if()?;
                let span = self.span_from(start);
                Some(Block {
                    stmts: vec![Stmt { kind: nested, span }],
                    span,
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    /// Expression statement, assignment or compound assignment
    fn parse_expr_stmt(&mut self) -> Result<StmtKind, ParseError> {
        let expr = self.parse_expression(BP_LOWEST)?;
        let op = match self.kind() {
            TokenKind::Eq => Some(None),
            TokenKind::PlusEq => Some(Some(BinaryOp::Add)),
            TokenKind::MinusEq => Some(Some(BinaryOp::Sub)),
            TokenKind::StarEq => Some(Some(BinaryOp::Mul)),
            TokenKind::SlashEq => Some(Some(BinaryOp::Div)),
            _ => None,
        };
        if let Some(op) = op {
            if !matches!(
                expr.kind,
                ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. }
            ) {
                return Err(ParseError {
                    expected: "assignable place (variable, field or element)".to_string(),
                    found: "expression".to_string(),
                    span: expr.span,
                });
            }
            self.bump();
            let value = self.parse_expression(BP_LOWEST)?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(StmtKind::Assign {
                target: expr,
                op,
                value,
            });
        }

        // A trailing `match` may omit its semicolon
        if matches!(expr.kind, ExprKind::Match { .. }) {
            self.skip(&TokenKind::Semicolon);
        } else {
            self.expect(&TokenKind::Semicolon)?;
        }
        Ok(StmtKind::Expr(expr))
    }
}
