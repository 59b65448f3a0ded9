//! `match` lowering
//!
//! ```text
//! block (result T)            ;; the whole match
//!   block                     ;; arm 0: every failed test branches out
//!     <tests, binding>
//!     <body>  br 1
//!   end
//!   block ...                 ;; arm 1
//!   end
//!   unreachable               ;; no arm matched
//! end
//! ```

use super::function::{FunctionBuilder, Label};
use super::layout::{slot_type, val_type, PAYLOAD_OFFSET, TAG_ERR, TAG_OK};
use super::expr::{int_const, numeric_op};
use super::module::{Instr, MemKind, NumOp};
use super::{CodegenError, GenResult, Generator};
use crate::frontend::parser::ast::{BinaryOp, Expr, MatchArm, NodeId, Pattern, PatternKind};
use crate::frontend::typecheck::Type;

impl<'a> Generator<'a> {
    pub(super) fn match_expr(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        scrutinee: &'a Expr,
        arms: &'a [MatchArm],
    ) -> GenResult<()> {
        let scrutinee_ty = self.type_of(scrutinee.id)?;
        self.expr(f, scrutinee)?;
        let value = self.spill(f, slot_type(scrutinee_ty));

        let outer = f.block(val_type(self.type_of(e.id)?), Label::Plain);
        for arm in arms {
            let next = f.block(None, Label::Plain);
            self.pattern(f, &arm.pattern, value, scrutinee_ty, next, arm.body.id)?;
            self.expr(f, &arm.body)?;
            if *self.type_of(arm.body.id)? != Type::Never {
                let depth = f.depth(outer);
                f.emit(Instr::Br(depth));
            }
            f.end();
        }
        f.emit(Instr::Unreachable);
        f.end();
        Ok(())
    }

    /// Test `value` (a local of type `ty`) against `pattern`, branching to
    /// the label `fail` on mismatch, and bind the arm's variable
    fn pattern(
        &mut self,
        f: &mut FunctionBuilder,
        pattern: &Pattern,
        value: u32,
        ty: &'a Type,
        fail: usize,
        arm: NodeId,
    ) -> GenResult<()> {
        let typed = self.typed;
        match &pattern.kind {
            PatternKind::Wildcard => {}
            PatternKind::Binding(name) => match typed.symbols.variant_of(ty, name) {
                Some(tag) => self.tag_test(f, value, tag as i32, fail),
                None => {
                    let binding = *typed
                        .bindings
                        .get(&arm)
                        .ok_or(CodegenError::MissingResolution(arm))?;
                    let local = f.local(slot_type(ty));
                    f.emit(Instr::LocalGet(value));
                    f.emit(Instr::LocalSet(local));
                    f.bind(binding, local);
                }
            },
            PatternKind::Int(literal) => {
                f.emit(Instr::LocalGet(value));
                int_const(f, *literal, ty);
                self.fail_unless_equal(f, ty, fail)?;
            }
            PatternKind::Float(literal) => {
                f.emit(Instr::LocalGet(value));
                f.emit(Instr::F64Const(*literal));
                self.fail_unless_equal(f, ty, fail)?;
            }
            PatternKind::Bool(literal) => {
                f.emit(Instr::LocalGet(value));
                f.emit(Instr::I32Const(*literal as i32));
                self.fail_unless_equal(f, ty, fail)?;
            }
            PatternKind::Str(literal) => {
                f.emit(Instr::LocalGet(value));
                let addr = self.str_const(literal.as_bytes());
                f.emit(Instr::I32Const(addr as i32));
                f.emit(Instr::Call(self.helpers.str_eq));
                f.emit(Instr::Num(NumOp::I32Eqz));
                let depth = f.depth(fail);
                f.emit(Instr::BrIf(depth));
            }
            PatternKind::Variant { name, payload, .. } => {
                let (tag, payload_ty) = match ty {
                    Type::Result(ok, err) => match name.as_str() {
                        "Ok" => (TAG_OK, Some(&**ok)),
                        _ => (TAG_ERR, Some(&**err)),
                    },
                    Type::Enum(enum_name) => {
                        let shape = typed.symbols.enums.get(enum_name).ok_or_else(|| {
                            CodegenError::Unsupported(format!("unknown enum {}", enum_name))
                        })?;
                        let tag = shape.variant_index(name).ok_or_else(|| {
                            CodegenError::Unsupported(format!("variant {}::{}", enum_name, name))
                        })?;
                        (tag as i32, shape.variants[tag].payload.as_ref())
                    }
                    other => {
                        return Err(CodegenError::Unsupported(format!(
                            "variant pattern on {}",
                            other
                        )))
                    }
                };
                self.tag_test(f, value, tag, fail);
                if let (Some(inner), Some(payload_ty)) = (payload, payload_ty) {
                    f.emit(Instr::LocalGet(value));
                    f.emit(Instr::Load {
                        kind: MemKind::of(slot_type(payload_ty)),
                        offset: PAYLOAD_OFFSET,
                    });
                    let payload_value = self.spill(f, slot_type(payload_ty));
                    self.pattern(f, inner, payload_value, payload_ty, fail, arm)?;
                }
            }
        }
        Ok(())
    }

    fn tag_test(
        &mut self,
        f: &mut FunctionBuilder,
        value: u32,
        tag: i32,
        fail: usize,
    ) {
        f.emit_all([
            Instr::LocalGet(value),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::I32Const(tag),
            Instr::Num(NumOp::I32Ne),
        ]);
        let depth = f.depth(fail);
        f.emit(Instr::BrIf(depth));
    }

    fn fail_unless_equal(
        &mut self,
        f: &mut FunctionBuilder,
        ty: &Type,
        fail: usize,
    ) -> GenResult<()> {
        let ne = numeric_op(BinaryOp::Neq, ty)
            .ok_or_else(|| CodegenError::Unsupported(format!("literal pattern on {}", ty)))?;
        f.emit(Instr::Num(ne));
        let depth = f.depth(fail);
        f.emit(Instr::BrIf(depth));
        Ok(())
    }
}

