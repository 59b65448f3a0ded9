//! Async functions
//!
//! An `async fn f(params) -> T` becomes two functions:
//!
//! - `f(params) -> i32` packs its arguments into an environment record and
//!   asks the host to `task_spawn` the entry body, returning the promise
//!   handle the host created;
//! - `f$entry(handle, env)` unpacks the arguments, runs the body and
//!   settles `handle` with `promise_resolve` wherever the body returns.
//!
//! Promise payloads travel as `i64`; [`widen`] and [`narrow`] convert
//! between that and a value's own machine type.

use super::function::{FunctionBuilder, ReturnMode};
use super::layout::{slot_type, val_type, WORD};
use super::module::{Instr, MemKind, NumOp, ValType};
use super::{CodegenError, GenResult, Generator};
use crate::frontend::parser::ast::Block;
use crate::frontend::typecheck::{FnKey, Type};
use crate::runtime::bridge::HostImport;

/// Convert the value on the stack to a promise payload
pub(super) fn widen(
    f: &mut FunctionBuilder,
    ty: ValType,
) {
    match ty {
        ValType::I32 => f.emit(Instr::Num(NumOp::I64ExtendI32U)),
        ValType::I64 => {}
        ValType::F64 => f.emit(Instr::Num(NumOp::I64ReinterpretF64)),
    }
}

/// Convert the promise payload on the stack back to a value of `ty`;
/// drops it for `void`
pub(super) fn narrow(
    f: &mut FunctionBuilder,
    ty: Option<ValType>,
) {
    match ty {
        Some(ValType::I32) => f.emit(Instr::Num(NumOp::I32WrapI64)),
        Some(ValType::I64) => {}
        Some(ValType::F64) => f.emit(Instr::Num(NumOp::F64ReinterpretI64)),
        None => f.emit(Instr::Drop),
    }
}

impl<'a> Generator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn lower_async(
        &mut self,
        key: FnKey,
        name: &str,
        params: &[Type],
        ret: &Type,
        body: &'a Block,
        index: u32,
        export: Option<String>,
    ) -> GenResult<()> {
        let entry = *self
            .entries
            .get(&key)
            .ok_or_else(|| CodegenError::UnknownFunction(format!("{}$entry", name)))?;
        let slots: Vec<ValType> = params.iter().map(slot_type).collect();

        // Wrapper: spawn the entry as a task
        let mut wrapper = FunctionBuilder::new(name, slots.clone(), Some(ValType::I32));
        let env = if slots.is_empty() {
            None
        } else {
            let env = self.alloc(&mut wrapper, WORD * slots.len() as u32);
            for (i, ty) in slots.iter().enumerate() {
                wrapper.emit_all([
                    Instr::LocalGet(env),
                    Instr::LocalGet(i as u32),
                    Instr::Store {
                        kind: MemKind::of(*ty),
                        offset: WORD * i as u32,
                    },
                ]);
            }
            Some(env)
        };
        wrapper.emit(Instr::I32Const(entry.table_slot as i32));
        wrapper.emit(match env {
            Some(env) => Instr::LocalGet(env),
            None => Instr::I32Const(0),
        });
        wrapper.emit(Instr::Call(HostImport::TaskSpawn.index()));
        self.install(index, wrapper.finish(export))?;

        // Entry: (handle, env), settles the promise on every exit
        let value = val_type(ret);
        let mut f = FunctionBuilder::new(
            format!("{}$entry", name),
            vec![ValType::I32, ValType::I32],
            None,
        );
        f.ret = ReturnMode::Resolve { handle: 0, value };
        let bindings = self.param_bindings(&key)?;
        for (i, (binding, ty)) in bindings.iter().zip(&slots).enumerate() {
            let local = f.local(*ty);
            f.emit_all([
                Instr::LocalGet(1),
                Instr::Load {
                    kind: MemKind::of(*ty),
                    offset: WORD * i as u32,
                },
                Instr::LocalSet(local),
            ]);
            f.bind(*binding, local);
        }
        self.block(&mut f, body)?;
        match value {
            None => self.emit_return(&mut f),
            Some(_) => f.emit(Instr::Unreachable),
        }
        self.install(entry.function, f.finish(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_conversions_pair_up() {
        let mut f = FunctionBuilder::new("f", vec![], None);
        widen(&mut f, ValType::F64);
        narrow(&mut f, Some(ValType::F64));
        widen(&mut f, ValType::I32);
        narrow(&mut f, None);
        assert_eq!(
            f.finish(None).body,
            vec![
                Instr::Num(NumOp::I64ReinterpretF64),
                Instr::Num(NumOp::F64ReinterpretI64),
                Instr::Num(NumOp::I64ExtendI32U),
                Instr::Drop,
                Instr::End,
            ]
        );
    }
}
