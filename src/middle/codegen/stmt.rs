//! Statements, assignment places and loops

use super::asyncs::widen;
use super::function::{FunctionBuilder, Label, ReturnMode};
use super::layout::{slot_type, val_type, ARRAY_HEADER, WORD};
use super::module::{Instr, MemKind, NumOp, ValType};
use super::{CodegenError, GenResult, Generator};
use crate::frontend::parser::ast::{BinaryOp, Block, Expr, ExprKind, Stmt, StmtKind};
use crate::frontend::typecheck::{Resolution, Type};
use crate::runtime::bridge::HostImport;

/// A writable location
#[derive(Debug, Clone, Copy)]
pub(super) enum Place {
    Local(u32),
    /// `offset` bytes past the address held in local `base`
    Memory {
        base: u32,
        offset: u32,
        kind: MemKind,
    },
}

impl<'a> Generator<'a> {
    pub(super) fn block(
        &mut self,
        f: &mut FunctionBuilder,
        block: &'a Block,
    ) -> GenResult<()> {
        for stmt in &block.stmts {
            self.stmt(f, stmt)?;
        }
        Ok(())
    }

    pub(super) fn stmt(
        &mut self,
        f: &mut FunctionBuilder,
        stmt: &'a Stmt,
    ) -> GenResult<()> {
        match &stmt.kind {
            StmtKind::Let { id, init, .. } => {
                self.expr(f, init)?;
                let binding = self.declared(*id)?;
                let ty = self.binding_type(binding)?;
                let local = self.spill(f, slot_type(ty));
                f.bind(binding, local);
            }
            StmtKind::Assign { target, op, value } => self.assign(f, target, *op, value)?,
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(f, cond)?;
                f.if_(None);
                self.block(f, then_block)?;
                if let Some(else_block) = else_block {
                    f.else_();
                    self.block(f, else_block)?;
                }
                f.end();
            }
            StmtKind::While { cond, body } => {
                let exit = f.block(None, Label::LoopExit);
                let top = f.loop_(Label::LoopContinue);
                self.expr(f, cond)?;
                f.emit(Instr::Num(NumOp::I32Eqz));
                let depth = f.depth(exit);
                f.emit(Instr::BrIf(depth));
                self.block(f, body)?;
                let depth = f.depth(top);
                f.emit(Instr::Br(depth));
                f.end();
                f.end();
            }
            StmtKind::For {
                id, iterable, body, ..
            } => self.for_loop(f, *id, iterable, body)?,
            StmtKind::Break => {
                let depth = f
                    .depth_of(Label::LoopExit)
                    .ok_or(CodegenError::OutsideLoop("break"))?;
                f.emit(Instr::Br(depth));
            }
            StmtKind::Continue => {
                let depth = f
                    .depth_of(Label::LoopContinue)
                    .ok_or(CodegenError::OutsideLoop("continue"))?;
                f.emit(Instr::Br(depth));
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(f, value)?;
                }
                self.emit_return(f);
            }
            StmtKind::Expr(expr) => {
                self.expr(f, expr)?;
                if val_type(self.type_of(expr.id)?).is_some() {
                    f.emit(Instr::Drop);
                }
            }
            StmtKind::Block(block) => self.block(f, block)?,
        }
        Ok(())
    }

    /// Binding introduced by the `let`/`for` statement `id`
    fn declared(
        &self,
        id: u32,
    ) -> GenResult<u32> {
        self.typed
            .bindings
            .get(&id)
            .copied()
            .ok_or(CodegenError::MissingResolution(id))
    }

    /// Leave the function with the value on the stack (if it has one)
    pub(super) fn emit_return(
        &mut self,
        f: &mut FunctionBuilder,
    ) {
        match f.ret {
            ReturnMode::Direct => f.emit(Instr::Return),
            ReturnMode::Resolve { handle, value } => {
                match value {
                    Some(ty) => {
                        let tmp = self.spill(f, ty);
                        f.emit(Instr::LocalGet(handle));
                        f.emit(Instr::LocalGet(tmp));
                        widen(f, ty);
                    }
                    None => {
                        f.emit(Instr::LocalGet(handle));
                        f.emit(Instr::I64Const(0));
                    }
                }
                f.emit(Instr::Call(HostImport::PromiseResolve.index()));
                f.emit(Instr::Return);
            }
        }
    }

    /// Index loop over the elements present when the loop starts
    fn for_loop(
        &mut self,
        f: &mut FunctionBuilder,
        id: u32,
        iterable: &'a Expr,
        body: &'a Block,
    ) -> GenResult<()> {
        let elem = match self.type_of(iterable.id)? {
            Type::Array(elem) => &**elem,
            other => {
                return Err(CodegenError::Unsupported(format!(
                    "iteration over {}",
                    other
                )))
            }
        };
        let kind = MemKind::of(slot_type(elem));

        self.expr(f, iterable)?;
        let array = self.spill(f, ValType::I32);
        f.emit(Instr::LocalGet(array));
        f.emit(Instr::Load {
            kind: MemKind::I32,
            offset: 0,
        });
        let len = self.spill(f, ValType::I32);
        let index = f.local(ValType::I32);
        f.emit(Instr::I32Const(0));
        f.emit(Instr::LocalSet(index));
        let binding = self.declared(id)?;
        let var = f.local(slot_type(elem));
        f.bind(binding, var);

        let exit = f.block(None, Label::LoopExit);
        let top = f.loop_(Label::Plain);
        f.emit_all([
            Instr::LocalGet(index),
            Instr::LocalGet(len),
            Instr::Num(NumOp::I32GeU),
        ]);
        let depth = f.depth(exit);
        f.emit(Instr::BrIf(depth));
        f.emit_all([
            Instr::LocalGet(array),
            Instr::LocalGet(index),
            Instr::I32Const(WORD as i32),
            Instr::Num(NumOp::I32Mul),
            Instr::Num(NumOp::I32Add),
            Instr::Load {
                kind,
                offset: ARRAY_HEADER,
            },
            Instr::LocalSet(var),
        ]);
        f.block(None, Label::LoopContinue);
        self.block(f, body)?;
        f.end();
        f.emit_all([
            Instr::LocalGet(index),
            Instr::I32Const(1),
            Instr::Num(NumOp::I32Add),
            Instr::LocalSet(index),
        ]);
        let depth = f.depth(top);
        f.emit(Instr::Br(depth));
        f.end();
        f.end();
        Ok(())
    }

    fn assign(
        &mut self,
        f: &mut FunctionBuilder,
        target: &'a Expr,
        op: Option<BinaryOp>,
        value: &'a Expr,
    ) -> GenResult<()> {
        let ty = self.type_of(target.id)?;
        let place = self.place(f, target)?;
        match op {
            None => self.expr(f, value)?,
            Some(op) => {
                self.load_place(f, place);
                self.expr(f, value)?;
                self.arithmetic(f, op, ty)?;
            }
        }
        let Some(vt) = val_type(ty) else {
            return Ok(());
        };
        let tmp = self.spill(f, vt);
        self.store_place(f, place, tmp);
        Ok(())
    }

    /// Evaluate the address part of an assignable expression
    pub(super) fn place(
        &mut self,
        f: &mut FunctionBuilder,
        target: &'a Expr,
    ) -> GenResult<Place> {
        match &target.kind {
            ExprKind::Ident(name) => match self.typed.resolutions.get(&target.id) {
                Some(Resolution::Local(binding)) => f
                    .binding(*binding)
                    .map(Place::Local)
                    .ok_or_else(|| CodegenError::MissingLocal(*binding, name.clone())),
                _ => Err(CodegenError::Unsupported(format!(
                    "assignment to '{}'",
                    name
                ))),
            },
            ExprKind::Field { object, field } => {
                let (index, field_ty) = self.field_slot(object, field)?;
                self.expr(f, object)?;
                let base = self.spill(f, ValType::I32);
                Ok(Place::Memory {
                    base,
                    offset: WORD * index,
                    kind: MemKind::of(slot_type(field_ty)),
                })
            }
            ExprKind::Index { object, index } => {
                let (kind, offset) = self.element_address(f, object, index)?;
                let base = self.spill(f, ValType::I32);
                Ok(Place::Memory { base, offset, kind })
            }
            _ => Err(CodegenError::Unsupported(
                "assignment to a temporary".to_string(),
            )),
        }
    }

    pub(super) fn load_place(
        &self,
        f: &mut FunctionBuilder,
        place: Place,
    ) {
        match place {
            Place::Local(local) => f.emit(Instr::LocalGet(local)),
            Place::Memory { base, offset, kind } => {
                f.emit(Instr::LocalGet(base));
                f.emit(Instr::Load { kind, offset });
            }
        }
    }

    /// Write the value held in local `value` to `place`
    pub(super) fn store_place(
        &self,
        f: &mut FunctionBuilder,
        place: Place,
        value: u32,
    ) {
        match place {
            Place::Local(local) => {
                f.emit(Instr::LocalGet(value));
                f.emit(Instr::LocalSet(local));
            }
            Place::Memory { base, offset, kind } => {
                f.emit(Instr::LocalGet(base));
                f.emit(Instr::LocalGet(value));
                f.emit(Instr::Store { kind, offset });
            }
        }
    }
}
