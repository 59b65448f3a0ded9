//! Statement checking

use super::check::TypeChecker;
use super::errors::{TypeError, TypeResult};
use super::types::Type;
use super::Resolution;
use crate::frontend::parser::ast::*;

impl TypeChecker<'_> {
    /// Check a block in a fresh scope; returns whether it always returns
    pub(super) fn check_block_in_scope(
        &mut self,
        block: &Block,
    ) -> TypeResult<bool> {
        self.scopes.push();
        let mut diverges = false;
        for stmt in &block.stmts {
            diverges |= self.check_stmt(stmt)?;
        }
        self.scopes.pop();
        Ok(diverges)
    }

    /// Check one statement; returns whether it always returns
    pub(super) fn check_stmt(
        &mut self,
        stmt: &Stmt,
    ) -> TypeResult<bool> {
        match &stmt.kind {
            StmtKind::Let {
                id,
                name,
                is_const,
                ty,
                init,
            } => {
                let ty = match ty {
                    Some(annotation) => {
                        let ty = self.resolve_type(annotation)?;
                        self.check_expr_against(init, &ty)?;
                        ty
                    }
                    None => self.check_expr(init, None)?,
                };
                if matches!(ty, Type::Void | Type::Never) {
                    return Err(TypeError::invalid(
                        format!("cannot bind '{}' to a value of type {}", name, ty),
                        init.span,
                    ));
                }
                let binding = self.declare(name, ty, *is_const);
                self.bindings.insert(*id, binding);
                Ok(false)
            }
            StmtKind::Assign { target, op, value } => {
                let place = self.check_expr(target, None)?;
                self.check_assignable(target)?;
                match op {
                    Some(op) => {
                        self.check_expr_against(value, &place)?;
                        self.arithmetic_result(*op, &place, value.span)?;
                    }
                    None => self.check_expr_against(value, &place)?,
                }
                Ok(false)
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_expr_against(cond, &Type::Bool)?;
                let then_returns = self.check_block_in_scope(then_block)?;
                let else_returns = match else_block {
                    Some(block) => self.check_block_in_scope(block)?,
                    None => false,
                };
                Ok(then_returns && else_returns)
            }
            StmtKind::While { cond, body } => {
                self.check_expr_against(cond, &Type::Bool)?;
                self.frame_mut().loop_depth += 1;
                let result = self.check_block_in_scope(body);
                self.frame_mut().loop_depth -= 1;
                result?;
                Ok(false)
            }
            StmtKind::For {
                id,
                var,
                iterable,
                body,
            } => {
                let elem = match self.check_expr(iterable, None)? {
                    Type::Array(elem) => *elem,
                    other => {
                        return Err(TypeError::Mismatch {
                            expected: "an array".to_string(),
                            found: other.to_string(),
                            span: iterable.span,
                        })
                    }
                };
                self.scopes.push();
                let binding = self.declare(var, elem, false);
                self.bindings.insert(*id, binding);
                self.frame_mut().loop_depth += 1;
                let result = self.check_block_in_scope(body);
                self.frame_mut().loop_depth -= 1;
                self.scopes.pop();
                result?;
                Ok(false)
            }
            StmtKind::Break | StmtKind::Continue => {
                if self.frame().loop_depth == 0 {
                    return Err(TypeError::OutsideLoop {
                        keyword: if matches!(stmt.kind, StmtKind::Break) {
                            "break"
                        } else {
                            "continue"
                        },
                        span: stmt.span,
                    });
                }
                Ok(true)
            }
            StmtKind::Return(value) => {
                let ret = self.frame().ret.clone();
                match value {
                    Some(value) => {
                        if ret == Type::Void {
                            let found = self.check_expr(value, None)?;
                            return Err(TypeError::mismatch(&Type::Void, &found, value.span));
                        }
                        self.check_expr_against(value, &ret)?;
                    }
                    None if ret != Type::Void => {
                        return Err(TypeError::mismatch(&ret, &Type::Void, stmt.span));
                    }
                    None => {}
                }
                Ok(true)
            }
            StmtKind::Expr(expr) => Ok(self.check_expr(expr, None)? == Type::Never),
            StmtKind::Block(block) => self.check_block_in_scope(block),
        }
    }

    /// Whether `target` names a place that may be written: a mutable local,
    /// a struct field or an array element
    pub(super) fn check_assignable(
        &self,
        target: &Expr,
    ) -> TypeResult<()> {
        match &target.kind {
            ExprKind::Ident(name) => match self.resolutions.get(&target.id) {
                Some(Resolution::Local(id)) => {
                    let constant = self
                        .binding_info
                        .get(*id as usize)
                        .is_some_and(|b| b.is_const);
                    if constant {
                        Err(TypeError::NotAssignable {
                            name: name.clone(),
                            reason: "it is a constant",
                            span: target.span,
                        })
                    } else {
                        Ok(())
                    }
                }
                Some(Resolution::Captured(_)) => Err(TypeError::NotAssignable {
                    name: name.clone(),
                    reason: "captured variables are copies and cannot be assigned",
                    span: target.span,
                }),
                _ => Err(TypeError::NotAssignable {
                    name: name.clone(),
                    reason: "it is not a variable",
                    span: target.span,
                }),
            },
            ExprKind::Field { .. } | ExprKind::Index { .. } => Ok(()),
            _ => Err(TypeError::NotAssignable {
                name: "<expression>".to_string(),
                reason: "only variables, fields and elements can be written",
                span: target.span,
            }),
        }
    }
}
