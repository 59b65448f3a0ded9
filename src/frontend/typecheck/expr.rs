//! Expression checking

use super::check::TypeChecker;
use super::errors::{TypeError, TypeResult};
use super::symbols::FunctionKind;
use super::types::{IntKind, Type};
use super::{CallTarget, Resolution};
use crate::frontend::parser::ast::*;
use crate::util::span::Span;

/// Numeric literal, possibly negated; takes its type from the other operand
fn is_numeric_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(_) | ExprKind::Float(_) => true,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => is_numeric_literal(operand),
        _ => false,
    }
}

impl TypeChecker<'_> {
    /// Infer the type of `expr`, using `expected` as a hint for literals,
    /// and record it
    pub(super) fn check_expr(
        &mut self,
        expr: &Expr,
        expected: Option<&Type>,
    ) -> TypeResult<Type> {
        let ty = self.infer_expr(expr, expected)?;
        self.types.insert(expr.id, ty.clone());
        Ok(ty)
    }

    /// Check `expr` and require that it fits `expected`
    pub(super) fn check_expr_against(
        &mut self,
        expr: &Expr,
        expected: &Type,
    ) -> TypeResult<()> {
        let ty = self.check_expr(expr, Some(expected))?;
        if expected.accepts(&ty) {
            Ok(())
        } else {
            Err(TypeError::mismatch(expected, &ty, expr.span))
        }
    }

    fn infer_expr(
        &mut self,
        expr: &Expr,
        expected: Option<&Type>,
    ) -> TypeResult<Type> {
        match &expr.kind {
            ExprKind::Int(value) => self.int_literal(*value, expected, expr.span),
            ExprKind::Float(_) => Ok(Type::Float),
            ExprKind::Bool(_) => Ok(Type::Bool),
            ExprKind::Str(_) => Ok(Type::Str),
            ExprKind::Bytes(_) => Ok(Type::Bytes),
            ExprKind::Interp(parts) => {
                for part in parts {
                    if let InterpPart::Expr(inner) = part {
                        let ty = self.check_expr(inner, None)?;
                        if !(ty.is_numeric() || ty == Type::Bool || ty == Type::Str) {
                            return Err(TypeError::invalid(
                                format!("cannot interpolate a value of type {}", ty),
                                inner.span,
                            ));
                        }
                    }
                }
                Ok(Type::Str)
            }
            ExprKind::Ident(name) => self.check_ident(expr, name),
            ExprKind::Path { qualifier, name } => {
                if let Some(shape) = self.symbols.enums.get(qualifier) {
                    let Some(tag) = shape.variant_index(name) else {
                        return Err(TypeError::Undefined {
                            what: "variant",
                            name: format!("{}::{}", qualifier, name),
                            span: expr.span,
                        });
                    };
                    if shape.variants[tag].payload.is_some() {
                        return Err(TypeError::invalid(
                            format!("variant '{}::{}' needs a payload", qualifier, name),
                            expr.span,
                        ));
                    }
                    self.variants.insert(expr.id, (qualifier.clone(), tag));
                    Ok(Type::Enum(qualifier.clone()))
                } else if self.symbols.structs.contains_key(qualifier) {
                    Err(TypeError::invalid(
                        format!("'{}::{}' must be called", qualifier, name),
                        expr.span,
                    ))
                } else {
                    Err(TypeError::Undefined {
                        what: "type",
                        name: qualifier.clone(),
                        span: expr.span,
                    })
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, expected),
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expected, expr.span),
            ExprKind::Cast { expr: inner, ty } => {
                let target = self.resolve_type(ty)?;
                let source = self.check_expr(inner, None)?;
                if source.is_numeric() && target.is_numeric() {
                    Ok(target)
                } else {
                    Err(TypeError::invalid(
                        format!("cannot cast {} to {}", source, target),
                        expr.span,
                    ))
                }
            }
            ExprKind::Call { callee, args } => self.check_call(expr, callee, args),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.check_method_call(expr, receiver, method, args),
            ExprKind::Field { object, field } => {
                let object_ty = self.check_expr(object, None)?;
                let Type::Struct(struct_name) = &object_ty else {
                    return Err(TypeError::invalid(
                        format!("type {} has no field '{}'", object_ty, field),
                        expr.span,
                    ));
                };
                match self.symbols.structs[struct_name].field_index(field) {
                    Some((_, ty)) => Ok(ty.clone()),
                    None => Err(TypeError::Undefined {
                        what: "field",
                        name: format!("{}.{}", struct_name, field),
                        span: expr.span,
                    }),
                }
            }
            ExprKind::Index { object, index } => {
                let object_ty = self.check_expr(object, None)?;
                let index_ty = self.check_expr(index, Some(&Type::I32))?;
                if !index_ty.is_integer() {
                    return Err(TypeError::Mismatch {
                        expected: "an integer index".to_string(),
                        found: index_ty.to_string(),
                        span: index.span,
                    });
                }
                match object_ty {
                    Type::Array(elem) => Ok(*elem),
                    Type::Bytes => Ok(Type::Int(IntKind::U8)),
                    other => Err(TypeError::invalid(
                        format!("cannot index into a value of type {}", other),
                        expr.span,
                    )),
                }
            }
            ExprKind::Await(inner) => match self.check_expr(inner, None)? {
                Type::Promise(value) => Ok(*value),
                found => Err(TypeError::AwaitNonPromise {
                    found,
                    span: inner.span,
                }),
            },
            ExprKind::Try(inner) => self.check_try(inner),
            ExprKind::ResultCtor { is_ok, value } => {
                let Some(Type::Result(ok, err)) = expected else {
                    return Err(TypeError::AnnotationNeeded {
                        what: if *is_ok { "Ok(..)" } else { "Err(..)" },
                        span: expr.span,
                    });
                };
                let payload = if *is_ok { ok } else { err };
                self.check_expr_against(value, payload)?;
                Ok(Type::Result(ok.clone(), err.clone()))
            }
            ExprKind::Array(elements) => self.check_array(elements, expected, expr.span),
            ExprKind::StructLit { name, fields } => self.check_struct_literal(name, fields, expr.span),
            ExprKind::Match { scrutinee, arms } => self.check_match(scrutinee, arms, expected, expr.span),
            ExprKind::Lambda {
                params,
                return_type,
                body,
            } => self.check_lambda(expr.id, params, return_type.as_ref(), body, expected, expr.span),
            ExprKind::Block(block) => {
                if self.check_block_in_scope(block)? {
                    Ok(Type::Never)
                } else {
                    Ok(Type::Void)
                }
            }
        }
    }

    fn int_literal(
        &self,
        value: i128,
        expected: Option<&Type>,
        span: Span,
    ) -> TypeResult<Type> {
        let ty = match expected {
            Some(Type::Float) => return Ok(Type::Float),
            Some(Type::Int(kind)) => Type::Int(*kind),
            _ => Type::I32,
        };
        if let Type::Int(kind) = ty {
            if !kind.contains(value) {
                return Err(TypeError::LiteralOutOfRange { value, ty, span });
            }
        }
        Ok(ty)
    }

    fn check_ident(
        &mut self,
        expr: &Expr,
        name: &str,
    ) -> TypeResult<Type> {
        if let Some(resolution) = self.lookup_var(name) {
            if let Resolution::Local(id) | Resolution::Captured(id) = resolution {
                self.resolutions.insert(expr.id, resolution);
                return Ok(self.binding_type(id));
            }
        }
        match self.symbols.functions.get(name) {
            Some(sig) if matches!(sig.kind, FunctionKind::Builtin(_)) => Err(TypeError::invalid(
                format!("builtin '{}' can only be called directly", name),
                expr.span,
            )),
            Some(sig) => {
                let ty = sig.fn_type();
                self.resolutions
                    .insert(expr.id, Resolution::Function(name.to_string()));
                Ok(ty)
            }
            None => Err(TypeError::Undefined {
                what: "variable",
                name: name.to_string(),
                span: expr.span,
            }),
        }
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        expected: Option<&Type>,
    ) -> TypeResult<Type> {
        if op.is_logical() {
            self.check_expr_against(lhs, &Type::Bool)?;
            self.check_expr_against(rhs, &Type::Bool)?;
            return Ok(Type::Bool);
        }

        let hint = if op.is_comparison() {
            None
        } else {
            expected.filter(|t| t.is_numeric() || **t == Type::Str)
        };
        // A literal operand takes the type of the other side
        let operand = if is_numeric_literal(lhs) && !is_numeric_literal(rhs) {
            let rt = self.check_expr(rhs, hint)?;
            let lt = self.check_expr(lhs, Some(&rt))?;
            if lt != rt {
                return Err(TypeError::mismatch(&rt, &lt, lhs.span));
            }
            lt
        } else {
            let lt = self.check_expr(lhs, hint)?;
            let rt = self.check_expr(rhs, Some(&lt))?;
            if lt != rt {
                return Err(TypeError::mismatch(&lt, &rt, rhs.span));
            }
            lt
        };

        let span = lhs.span.merge(rhs.span);
        match op {
            BinaryOp::Eq | BinaryOp::Neq => {
                if operand.is_numeric() || operand == Type::Bool || operand == Type::Str {
                    Ok(Type::Bool)
                } else {
                    Err(TypeError::invalid(
                        format!("cannot compare values of type {} with '{}'", operand, op),
                        span,
                    ))
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if operand.is_numeric() {
                    Ok(Type::Bool)
                } else {
                    Err(TypeError::invalid(
                        format!("cannot order values of type {}", operand),
                        span,
                    ))
                }
            }
            _ => self.arithmetic_result(op, &operand, span),
        }
    }

    /// Result type of an arithmetic operator applied to two `ty` operands
    pub(super) fn arithmetic_result(
        &self,
        op: BinaryOp,
        ty: &Type,
        span: Span,
    ) -> TypeResult<Type> {
        let ok = match op {
            BinaryOp::Add => ty.is_numeric() || *ty == Type::Str,
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => ty.is_numeric(),
            BinaryOp::Rem => ty.is_integer(),
            _ => false,
        };
        if ok {
            Ok(ty.clone())
        } else {
            Err(TypeError::invalid(
                format!("operator '{}' cannot be applied to {}", op, ty),
                span,
            ))
        }
    }

    fn check_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        expected: Option<&Type>,
        span: Span,
    ) -> TypeResult<Type> {
        match op {
            UnaryOp::Not => {
                self.check_expr_against(operand, &Type::Bool)?;
                Ok(Type::Bool)
            }
            UnaryOp::Neg => {
                // `-128` fits i8 even though `128` does not
                if let ExprKind::Int(value) = operand.kind {
                    let ty = match expected {
                        Some(Type::Float) => Type::Float,
                        Some(Type::Int(kind)) => Type::Int(*kind),
                        _ => Type::I32,
                    };
                    if let Type::Int(kind) = ty {
                        if !kind.is_signed() {
                            return Err(TypeError::invalid(
                                format!("cannot negate a value of type {}", ty),
                                span,
                            ));
                        }
                        if !kind.contains(-value) {
                            return Err(TypeError::LiteralOutOfRange {
                                value: -value,
                                ty,
                                span,
                            });
                        }
                    }
                    self.types.insert(operand.id, ty.clone());
                    return Ok(ty);
                }
                let ty = self.check_expr(operand, expected)?;
                match &ty {
                    Type::Float => Ok(ty),
                    Type::Int(kind) if kind.is_signed() => Ok(ty),
                    _ => Err(TypeError::invalid(
                        format!("cannot negate a value of type {}", ty),
                        span,
                    )),
                }
            }
        }
    }

    fn check_try(
        &mut self,
        inner: &Expr,
    ) -> TypeResult<Type> {
        let (ok, err) = match self.check_expr(inner, None)? {
            Type::Result(ok, err) => (*ok, *err),
            other => {
                return Err(TypeError::InvalidTry {
                    message: format!("can only be applied to a Result, not {}", other),
                    span: inner.span,
                })
            }
        };
        match &self.frame().ret {
            Type::Result(_, outer_err) if **outer_err == err => Ok(ok),
            Type::Result(_, outer_err) => Err(TypeError::InvalidTry {
                message: format!(
                    "cannot convert error type {} into {}",
                    err, outer_err
                ),
                span: inner.span,
            }),
            other => Err(TypeError::InvalidTry {
                message: format!(
                    "can only be used in a function returning Result, not {}",
                    other
                ),
                span: inner.span,
            }),
        }
    }

    fn check_args(
        &mut self,
        name: &str,
        params: &[Type],
        args: &[Expr],
        span: Span,
    ) -> TypeResult<()> {
        if params.len() != args.len() {
            return Err(TypeError::ArgumentCount {
                name: name.to_string(),
                expected: params.len(),
                found: args.len(),
                span,
            });
        }
        for (arg, param) in args.iter().zip(params) {
            self.check_expr_against(arg, param)?;
        }
        Ok(())
    }

    fn check_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        args: &[Expr],
    ) -> TypeResult<Type> {
        match &callee.kind {
            ExprKind::Ident(name) if self.scopes.lookup(name).is_none() => {
                let Some(sig) = self.symbols.functions.get(name).cloned() else {
                    return Err(TypeError::Undefined {
                        what: "function",
                        name: name.clone(),
                        span: callee.span,
                    });
                };
                self.check_args(name, &sig.params, args, expr.span)?;
                let target = match sig.kind {
                    FunctionKind::User => CallTarget::Function(name.clone()),
                    FunctionKind::Extern => CallTarget::Extern(name.clone()),
                    FunctionKind::Builtin(builtin) => CallTarget::Builtin(builtin),
                };
                self.calls.insert(expr.id, target);
                Ok(sig.effective_return())
            }
            ExprKind::Path { qualifier, name } => {
                if let Some(shape) = self.symbols.enums.get(qualifier).cloned() {
                    let Some(tag) = shape.variant_index(name) else {
                        return Err(TypeError::Undefined {
                            what: "variant",
                            name: format!("{}::{}", qualifier, name),
                            span: callee.span,
                        });
                    };
                    let params: Vec<Type> = shape.variants[tag].payload.iter().cloned().collect();
                    self.check_args(&format!("{}::{}", qualifier, name), &params, args, expr.span)?;
                    self.calls.insert(
                        expr.id,
                        CallTarget::Variant {
                            enum_name: qualifier.clone(),
                            tag,
                        },
                    );
                    return Ok(Type::Enum(qualifier.clone()));
                }
                let Some(shape) = self.symbols.structs.get(qualifier).cloned() else {
                    return Err(TypeError::Undefined {
                        what: "type",
                        name: qualifier.clone(),
                        span: callee.span,
                    });
                };
                let Some(method) = shape.methods.get(name) else {
                    return Err(TypeError::Undefined {
                        what: "method",
                        name: format!("{}::{}", qualifier, name),
                        span: callee.span,
                    });
                };
                if method.has_self {
                    return Err(TypeError::invalid(
                        format!(
                            "'{}::{}' takes self; call it on a value as .{}(..)",
                            qualifier, name, name
                        ),
                        callee.span,
                    ));
                }
                self.check_args(name, &method.sig.params, args, expr.span)?;
                self.calls.insert(
                    expr.id,
                    CallTarget::StaticMethod {
                        struct_name: qualifier.clone(),
                        slot: method.slot,
                    },
                );
                Ok(method.sig.effective_return())
            }
            _ => match self.check_expr(callee, None)? {
                Type::Fn(params, ret) => {
                    self.check_args("function value", &params, args, expr.span)?;
                    self.calls.insert(expr.id, CallTarget::Indirect);
                    Ok(*ret)
                }
                other => Err(TypeError::invalid(
                    format!("cannot call a value of type {}", other),
                    callee.span,
                )),
            },
        }
    }

    fn check_method_call(
        &mut self,
        expr: &Expr,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
    ) -> TypeResult<Type> {
        let receiver_ty = self.check_expr(receiver, None)?;
        let undefined = || TypeError::Undefined {
            what: "method",
            name: format!("{}.{}", receiver_ty, method),
            span: expr.span,
        };

        let (target, ret) = match &receiver_ty {
            Type::Struct(struct_name) => {
                let shape = &self.symbols.structs[struct_name];
                let Some(info) = shape.methods.get(method).cloned() else {
                    return Err(undefined());
                };
                if !info.has_self {
                    return Err(TypeError::invalid(
                        format!(
                            "'{}' is a static method; call it as {}::{}(..)",
                            method, struct_name, method
                        ),
                        expr.span,
                    ));
                }
                self.check_args(method, &info.sig.params[1..], args, expr.span)?;
                (
                    CallTarget::Method {
                        struct_name: struct_name.clone(),
                        slot: info.slot,
                    },
                    info.sig.effective_return(),
                )
            }
            Type::Array(elem) => match method {
                "push" => {
                    self.check_args(method, &[(**elem).clone()], args, expr.span)?;
                    self.check_assignable(receiver)?;
                    (CallTarget::ArrayPush, Type::Void)
                }
                "pop" => {
                    self.check_args(method, &[], args, expr.span)?;
                    self.check_assignable(receiver)?;
                    (CallTarget::ArrayPop, (**elem).clone())
                }
                "len" => {
                    self.check_args(method, &[], args, expr.span)?;
                    (CallTarget::ArrayLen, Type::I32)
                }
                _ => return Err(undefined()),
            },
            Type::Str | Type::Bytes if method == "len" => {
                self.check_args(method, &[], args, expr.span)?;
                (CallTarget::StrLen, Type::I32)
            }
            _ => return Err(undefined()),
        };
        self.calls.insert(expr.id, target);
        Ok(ret)
    }

    fn check_array(
        &mut self,
        elements: &[Expr],
        expected: Option<&Type>,
        span: Span,
    ) -> TypeResult<Type> {
        if let Some(Type::Array(elem)) = expected {
            for element in elements {
                self.check_expr_against(element, elem)?;
            }
            return Ok(Type::Array(elem.clone()));
        }
        let Some((first, rest)) = elements.split_first() else {
            return Err(TypeError::AnnotationNeeded {
                what: "an empty array literal",
                span,
            });
        };
        let elem = self.check_expr(first, None)?;
        if matches!(elem, Type::Void | Type::Never) {
            return Err(TypeError::invalid(
                format!("array elements cannot have type {}", elem),
                first.span,
            ));
        }
        for element in rest {
            self.check_expr_against(element, &elem)?;
        }
        Ok(Type::array(elem))
    }

    fn check_struct_literal(
        &mut self,
        name: &str,
        fields: &[FieldInit],
        span: Span,
    ) -> TypeResult<Type> {
        let Some(shape) = self.symbols.structs.get(name).cloned() else {
            return Err(TypeError::Undefined {
                what: "struct",
                name: name.to_string(),
                span,
            });
        };
        let mut seen = Vec::with_capacity(fields.len());
        for init in fields {
            let Some((_, ty)) = shape.field_index(&init.name) else {
                return Err(TypeError::Undefined {
                    what: "field",
                    name: format!("{}.{}", name, init.name),
                    span: init.span,
                });
            };
            if seen.contains(&init.name.as_str()) {
                return Err(TypeError::Duplicate {
                    name: init.name.clone(),
                    span: init.span,
                });
            }
            seen.push(init.name.as_str());
            self.check_expr_against(&init.value, ty)?;
        }
        if let Some(missing) = shape.fields.keys().find(|f| !seen.contains(&f.as_str())) {
            return Err(TypeError::invalid(
                format!("missing field '{}' in initializer of '{}'", missing, name),
                span,
            ));
        }
        Ok(Type::Struct(name.to_string()))
    }

    fn check_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[MatchArm],
        expected: Option<&Type>,
        span: Span,
    ) -> TypeResult<Type> {
        let scrutinee_ty = self.check_expr(scrutinee, None)?;
        let mut result: Option<Type> = None;
        for arm in arms {
            self.scopes.push();
            if let Some((name, ty)) = self.check_pattern(&arm.pattern, &scrutinee_ty)? {
                let binding = self.declare(&name, ty, false);
                self.bindings.insert(arm.body.id, binding);
            }
            let hint = result.clone().or_else(|| expected.cloned());
            let ty = self.check_expr(&arm.body, hint.as_ref());
            self.scopes.pop();
            let ty = ty?;
            match &result {
                None if ty != Type::Never => result = Some(ty),
                None => {}
                Some(prev) if !prev.accepts(&ty) => {
                    return Err(TypeError::mismatch(prev, &ty, arm.body.span))
                }
                Some(_) => {}
            }
        }
        if self.strict_match {
            self.check_exhaustive(&scrutinee_ty, arms, span)?;
        }
        Ok(result.unwrap_or(Type::Never))
    }
}
