//! Calls: direct, extern, builtin, method, indirect and array methods

use super::function::FunctionBuilder;
use super::layout::{slot_type, val_type, ARRAY_HEADER, STR_HEADER, WORD};
use super::module::{FuncType, Instr, MemKind, NumOp, ValType};
use super::{CodegenError, GenResult, Generator};
use crate::frontend::parser::ast::Expr;
use crate::frontend::typecheck::{Builtin, CallTarget, Type};
use crate::runtime::bridge::HostImport;

impl<'a> Generator<'a> {
    fn call_target(
        &self,
        e: &Expr,
    ) -> GenResult<&'a CallTarget> {
        let typed = self.typed;
        typed
            .calls
            .get(&e.id)
            .ok_or(CodegenError::MissingCallTarget(e.id))
    }

    fn args(
        &mut self,
        f: &mut FunctionBuilder,
        args: &'a [Expr],
    ) -> GenResult<()> {
        for arg in args {
            self.expr(f, arg)?;
        }
        Ok(())
    }

    pub(super) fn call(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        callee: &'a Expr,
        args: &'a [Expr],
    ) -> GenResult<()> {
        match self.call_target(e)? {
            CallTarget::Function(name) => {
                self.args(f, args)?;
                f.emit(Instr::Call(self.function_index(name)?));
            }
            CallTarget::Extern(name) => {
                self.args(f, args)?;
                f.emit(Instr::Call(self.extern_index(name)?));
            }
            CallTarget::StaticMethod { struct_name, slot } => {
                self.args(f, args)?;
                f.emit(Instr::Call(self.method_index(struct_name, *slot)?));
            }
            CallTarget::Builtin(builtin) => self.builtin(f, *builtin, args)?,
            CallTarget::Variant { tag, .. } => self.tagged(f, *tag as i32, args.first())?,
            CallTarget::Indirect => self.indirect(f, callee, args)?,
            other => {
                return Err(CodegenError::Unsupported(format!(
                    "call through {:?}",
                    other
                )))
            }
        }
        Ok(())
    }

    pub(super) fn method_call(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        receiver: &'a Expr,
        args: &'a [Expr],
    ) -> GenResult<()> {
        match self.call_target(e)? {
            CallTarget::Method { struct_name, slot } => {
                self.expr(f, receiver)?;
                self.args(f, args)?;
                f.emit(Instr::Call(self.method_index(struct_name, *slot)?));
            }
            CallTarget::ArrayPush => {
                let value = args
                    .first()
                    .ok_or_else(|| CodegenError::Unsupported("push without a value".to_string()))?;
                self.push(f, receiver, value)?;
            }
            CallTarget::ArrayPop => self.pop(f, receiver)?,
            CallTarget::ArrayLen | CallTarget::StrLen => {
                self.expr(f, receiver)?;
                f.emit(Instr::Load {
                    kind: MemKind::I32,
                    offset: 0,
                });
            }
            other => {
                return Err(CodegenError::Unsupported(format!(
                    "method call through {:?}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Host-implemented prelude functions. Strings cross the boundary as
    /// `(pointer to first byte, length)`.
    fn builtin(
        &mut self,
        f: &mut FunctionBuilder,
        builtin: Builtin,
        args: &'a [Expr],
    ) -> GenResult<()> {
        let import = match builtin {
            Builtin::Print => HostImport::Log,
            Builtin::HttpGet => HostImport::HttpGet,
            Builtin::HttpPost => HostImport::HttpPost,
            Builtin::ReadFile => HostImport::FileRead,
            Builtin::WriteFile => HostImport::FileWrite,
            Builtin::Sleep => HostImport::TimerSchedule,
        };
        for arg in args {
            self.expr(f, arg)?;
            if *self.type_of(arg.id)? == Type::Str {
                self.string_parts(f);
            }
        }
        f.emit(Instr::Call(import.index()));
        Ok(())
    }

    /// Replace the string pointer on the stack by `(data pointer, length)`
    fn string_parts(
        &mut self,
        f: &mut FunctionBuilder,
    ) {
        let s = self.spill(f, ValType::I32);
        f.emit_all([
            Instr::LocalGet(s),
            Instr::I32Const(STR_HEADER as i32),
            Instr::Num(NumOp::I32Add),
            Instr::LocalGet(s),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
        ]);
    }

    /// Call through a function value: the environment goes first, the
    /// table slot last
    fn indirect(
        &mut self,
        f: &mut FunctionBuilder,
        callee: &'a Expr,
        args: &'a [Expr],
    ) -> GenResult<()> {
        let (params, ret) = match self.type_of(callee.id)? {
            Type::Fn(params, ret) => (params, ret),
            other => return Err(CodegenError::Unsupported(format!("call of {}", other))),
        };
        self.expr(f, callee)?;
        let value = self.spill(f, ValType::I32);
        f.emit(Instr::LocalGet(value));
        f.emit(Instr::Load {
            kind: MemKind::I32,
            offset: WORD,
        });
        self.args(f, args)?;
        f.emit(Instr::LocalGet(value));
        f.emit(Instr::Load {
            kind: MemKind::I32,
            offset: 0,
        });
        let ty = self.closure_type(params, ret);
        f.emit(Instr::CallIndirect(ty));
        Ok(())
    }

    /// Type index of a function value's code: `(env, params..) -> R`
    pub(super) fn closure_type(
        &mut self,
        params: &[Type],
        ret: &Type,
    ) -> u32 {
        let mut types = vec![ValType::I32];
        types.extend(params.iter().map(slot_type));
        self.type_index(FuncType::new(types, val_type(ret)))
    }

    /// `receiver.push(value)`: grow when full, write the (possibly new)
    /// array pointer back, then append
    fn push(
        &mut self,
        f: &mut FunctionBuilder,
        receiver: &'a Expr,
        value: &'a Expr,
    ) -> GenResult<()> {
        let elem = self.type_of(value.id)?;
        let kind = MemKind::of(slot_type(elem));
        let place = self.place(f, receiver)?;
        self.expr(f, value)?;
        let item = self.spill(f, slot_type(elem));

        self.load_place(f, place);
        f.emit(Instr::Call(self.helpers.array_grow));
        let array = self.spill(f, ValType::I32);
        self.store_place(f, place, array);

        f.emit_all([
            Instr::LocalGet(array),
            Instr::LocalGet(array),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::I32Const(WORD as i32),
            Instr::Num(NumOp::I32Mul),
            Instr::Num(NumOp::I32Add),
            Instr::LocalGet(item),
            Instr::Store {
                kind,
                offset: ARRAY_HEADER,
            },
            Instr::LocalGet(array),
            Instr::LocalGet(array),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::I32Const(1),
            Instr::Num(NumOp::I32Add),
            Instr::Store {
                kind: MemKind::I32,
                offset: 0,
            },
        ]);
        Ok(())
    }

    /// `receiver.pop()`: traps on an empty array
    fn pop(
        &mut self,
        f: &mut FunctionBuilder,
        receiver: &'a Expr,
    ) -> GenResult<()> {
        let kind = match self.type_of(receiver.id)? {
            Type::Array(elem) => MemKind::of(slot_type(elem)),
            other => return Err(CodegenError::Unsupported(format!("pop on {}", other))),
        };
        self.expr(f, receiver)?;
        let array = self.spill(f, ValType::I32);
        f.emit_all([
            Instr::LocalGet(array),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::Num(NumOp::I32Eqz),
        ]);
        f.if_(None);
        f.emit(Instr::Unreachable);
        f.end();
        f.emit_all([
            Instr::LocalGet(array),
            Instr::LocalGet(array),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::I32Const(1),
            Instr::Num(NumOp::I32Sub),
            Instr::Store {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::LocalGet(array),
            Instr::LocalGet(array),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::I32Const(WORD as i32),
            Instr::Num(NumOp::I32Mul),
            Instr::Num(NumOp::I32Add),
            Instr::Load {
                kind,
                offset: ARRAY_HEADER,
            },
        ]);
        Ok(())
    }
}
