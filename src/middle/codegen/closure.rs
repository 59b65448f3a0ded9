//! Closure conversion
//!
//! A function literal is lifted to a module function taking its
//! environment record first. Evaluating the literal copies every captured
//! value into a fresh record, so later writes to the original variable are
//! not observed by the closure.

use super::function::{Environment, FunctionBuilder};
use super::layout::{slot_type, val_type, WORD};
use super::module::{Instr, MemKind, ValType};
use super::{CodegenError, GenResult, Generator, Pending};
use crate::frontend::parser::ast::{Expr, ExprKind, LambdaBody};
use crate::frontend::typecheck::{FnKey, Type};

impl<'a> Generator<'a> {
    /// Build the function value `[table slot][environment]` of a literal
    pub(super) fn closure(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
    ) -> GenResult<()> {
        let typed = self.typed;
        let index = self.reserve();
        let slot = self.table_slot(index);
        self.pending.push_back(Pending::Lambda { expr: e, index });

        let captures = typed
            .captures
            .get(&e.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let env = if captures.is_empty() {
            None
        } else {
            let env = self.alloc(f, WORD * captures.len() as u32);
            for (i, binding) in captures.iter().enumerate() {
                let ty = self.binding_type(*binding)?;
                f.emit(Instr::LocalGet(env));
                self.read_binding(f, *binding)?;
                f.emit(Instr::Store {
                    kind: MemKind::of(slot_type(ty)),
                    offset: WORD * i as u32,
                });
            }
            Some(env)
        };

        let value = self.alloc(f, 2 * WORD);
        f.emit_all([
            Instr::LocalGet(value),
            Instr::I32Const(slot as i32),
            Instr::Store {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::LocalGet(value),
        ]);
        f.emit(match env {
            Some(env) => Instr::LocalGet(env),
            None => Instr::I32Const(0),
        });
        f.emit_all([
            Instr::Store {
                kind: MemKind::I32,
                offset: WORD,
            },
            Instr::LocalGet(value),
        ]);
        Ok(())
    }

    /// `lambda$<id>(env, params..) -> R`
    pub(super) fn lower_lambda(
        &mut self,
        e: &'a Expr,
        index: u32,
    ) -> GenResult<()> {
        let typed = self.typed;
        let ExprKind::Lambda { body, .. } = &e.kind else {
            return Err(CodegenError::Unsupported("lifting a non-literal".to_string()));
        };
        let key = FnKey::Lambda(e.id);
        let (params, ret) = self.key_signature(&key)?;
        let mut slots = vec![ValType::I32];
        slots.extend(params.iter().map(slot_type));
        let mut f = FunctionBuilder::new(format!("lambda${}", e.id), slots, val_type(&ret));
        f.env = Some(Environment { local: 0 });

        for (i, binding) in self.param_bindings(&key)?.iter().enumerate() {
            f.bind(*binding, i as u32 + 1);
        }
        if let Some(captures) = typed.captures.get(&e.id) {
            for (slot, binding) in captures.iter().enumerate() {
                f.bind_capture(*binding, slot as u32);
            }
        }

        match body {
            LambdaBody::Expr(inner) => {
                self.expr(&mut f, inner)?;
                let produced = self.type_of(inner.id)?;
                if *produced == Type::Never && f.result.is_some() {
                    f.emit(Instr::Unreachable);
                } else if f.result.is_none() && val_type(produced).is_some() {
                    f.emit(Instr::Drop);
                }
            }
            LambdaBody::Block(block) => {
                self.block(&mut f, block)?;
                if f.result.is_some() {
                    f.emit(Instr::Unreachable);
                }
            }
        }
        self.install(index, f.finish(None))
    }
}
