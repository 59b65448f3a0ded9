//! Expressions

use super::asyncs::narrow;
use super::function::FunctionBuilder;
use super::layout::{
    array_template, needs_normalizing, slot_type, val_type, Word, ARRAY_HEADER, PAYLOAD_OFFSET,
    STR_HEADER, TAG_ERR, TAG_OK, WORD,
};
use super::module::{Instr, MemKind, NumOp, ValType};
use super::{CodegenError, GenResult, Generator};
use crate::frontend::parser::ast::*;
use crate::frontend::typecheck::{IntKind, Resolution, Type};
use crate::runtime::bridge::HostImport;

impl<'a> Generator<'a> {
    /// Emit code leaving the value of `e` (if it has one) on the stack
    pub(super) fn expr(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
    ) -> GenResult<()> {
        let typed = self.typed;
        match &e.kind {
            ExprKind::Int(value) => int_const(f, *value, self.type_of(e.id)?),
            ExprKind::Float(value) => f.emit(Instr::F64Const(*value)),
            ExprKind::Bool(value) => f.emit(Instr::I32Const(*value as i32)),
            ExprKind::Str(text) => {
                let addr = self.str_const(text.as_bytes());
                f.emit(Instr::I32Const(addr as i32));
            }
            ExprKind::Bytes(bytes) => {
                let addr = self.str_const(bytes);
                f.emit(Instr::I32Const(addr as i32));
            }
            ExprKind::Interp(parts) => self.interpolation(f, parts)?,
            ExprKind::Ident(_) => match typed.resolutions.get(&e.id) {
                Some(Resolution::Local(binding)) | Some(Resolution::Captured(binding)) => {
                    self.read_binding(f, *binding)?
                }
                Some(Resolution::Function(name)) => {
                    let addr = self.function_value(name)?;
                    f.emit(Instr::I32Const(addr as i32));
                }
                None => return Err(CodegenError::MissingResolution(e.id)),
            },
            ExprKind::Path { .. } => {
                let (enum_name, tag) = typed
                    .variants
                    .get(&e.id)
                    .ok_or(CodegenError::MissingResolution(e.id))?;
                let addr = self.unit_variant(enum_name, *tag);
                f.emit(Instr::I32Const(addr as i32));
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(f, *op, lhs, rhs)?,
            ExprKind::Unary { op, operand } => self.unary(f, e, *op, operand)?,
            ExprKind::Cast { expr: inner, .. } => {
                self.expr(f, inner)?;
                cast(f, self.type_of(inner.id)?, self.type_of(e.id)?)?;
            }
            ExprKind::Call { callee, args } => self.call(f, e, callee, args)?,
            ExprKind::MethodCall { receiver, args, .. } => {
                self.method_call(f, e, receiver, args)?
            }
            ExprKind::Field { object, field } => {
                let (index, field_ty) = self.field_slot(object, field)?;
                self.expr(f, object)?;
                match val_type(field_ty) {
                    Some(ty) => f.emit(Instr::Load {
                        kind: MemKind::of(ty),
                        offset: WORD * index,
                    }),
                    None => f.emit(Instr::Drop),
                }
            }
            ExprKind::Index { object, index } => {
                let (kind, offset) = self.element_address(f, object, index)?;
                f.emit(Instr::Load { kind, offset });
            }
            ExprKind::Await(inner) => {
                self.expr(f, inner)?;
                f.emit(Instr::Call(HostImport::PromiseAwait.index()));
                narrow(f, val_type(self.type_of(e.id)?));
            }
            ExprKind::Try(inner) => self.try_operator(f, e, inner)?,
            ExprKind::ResultCtor { is_ok, value } => {
                let tag = if *is_ok { TAG_OK } else { TAG_ERR };
                self.tagged(f, tag, Some(value))?;
            }
            ExprKind::Array(elements) => self.array_literal(f, e, elements)?,
            ExprKind::StructLit { name, fields } => self.struct_literal(f, name, fields)?,
            ExprKind::Match { scrutinee, arms } => self.match_expr(f, e, scrutinee, arms)?,
            ExprKind::Lambda { .. } => self.closure(f, e)?,
            ExprKind::Block(block) => self.block(f, block)?,
        }
        Ok(())
    }

    fn binary(
        &mut self,
        f: &mut FunctionBuilder,
        op: BinaryOp,
        lhs: &'a Expr,
        rhs: &'a Expr,
    ) -> GenResult<()> {
        match op {
            BinaryOp::And => {
                self.expr(f, lhs)?;
                f.if_(Some(ValType::I32));
                self.expr(f, rhs)?;
                f.else_();
                f.emit(Instr::I32Const(0));
                f.end();
                return Ok(());
            }
            BinaryOp::Or => {
                self.expr(f, lhs)?;
                f.if_(Some(ValType::I32));
                f.emit(Instr::I32Const(1));
                f.else_();
                self.expr(f, rhs)?;
                f.end();
                return Ok(());
            }
            _ => {}
        }
        let ty = self.type_of(lhs.id)?;
        self.expr(f, lhs)?;
        self.expr(f, rhs)?;
        if op.is_comparison() {
            self.compare(f, op, ty)
        } else {
            self.arithmetic(f, op, ty)
        }
    }

    /// Compare the two operands on the stack
    pub(super) fn compare(
        &mut self,
        f: &mut FunctionBuilder,
        op: BinaryOp,
        ty: &Type,
    ) -> GenResult<()> {
        if *ty == Type::Str {
            f.emit(Instr::Call(self.helpers.str_eq));
            return match op {
                BinaryOp::Eq => Ok(()),
                BinaryOp::Neq => {
                    f.emit(Instr::Num(NumOp::I32Eqz));
                    Ok(())
                }
                _ => Err(CodegenError::Unsupported(format!("string operator {}", op))),
            };
        }
        let num = numeric_op(op, ty)
            .ok_or_else(|| CodegenError::Unsupported(format!("{} on {}", op, ty)))?;
        f.emit(Instr::Num(num));
        Ok(())
    }

    /// Combine the two operands on the stack with an arithmetic operator
    pub(super) fn arithmetic(
        &mut self,
        f: &mut FunctionBuilder,
        op: BinaryOp,
        ty: &Type,
    ) -> GenResult<()> {
        if *ty == Type::Str && op == BinaryOp::Add {
            f.emit(Instr::Call(self.helpers.str_concat));
            return Ok(());
        }
        let num = numeric_op(op, ty)
            .ok_or_else(|| CodegenError::Unsupported(format!("{} on {}", op, ty)))?;
        f.emit(Instr::Num(num));
        if let Type::Int(kind) = ty {
            normalize(f, *kind);
        }
        Ok(())
    }

    fn unary(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        op: UnaryOp,
        operand: &'a Expr,
    ) -> GenResult<()> {
        if op == UnaryOp::Not {
            self.expr(f, operand)?;
            f.emit(Instr::Num(NumOp::I32Eqz));
            return Ok(());
        }
        if let ExprKind::Int(value) = operand.kind {
            int_const(f, -value, self.type_of(operand.id)?);
            return Ok(());
        }
        match self.type_of(e.id)? {
            Type::Float => {
                self.expr(f, operand)?;
                f.emit(Instr::Num(NumOp::F64Neg));
            }
            Type::Int(kind) if kind.is_wide() => {
                f.emit(Instr::I64Const(0));
                self.expr(f, operand)?;
                f.emit(Instr::Num(NumOp::I64Sub));
            }
            Type::Int(kind) => {
                f.emit(Instr::I32Const(0));
                self.expr(f, operand)?;
                f.emit(Instr::Num(NumOp::I32Sub));
                normalize(f, *kind);
            }
            other => return Err(CodegenError::Unsupported(format!("negation of {}", other))),
        }
        Ok(())
    }

    fn interpolation(
        &mut self,
        f: &mut FunctionBuilder,
        parts: &'a [InterpPart],
    ) -> GenResult<()> {
        let mut pieces = 0;
        for part in parts {
            match part {
                InterpPart::Text(text) if text.is_empty() => continue,
                InterpPart::Text(text) => {
                    let addr = self.str_const(text.as_bytes());
                    f.emit(Instr::I32Const(addr as i32));
                }
                InterpPart::Expr(inner) => {
                    self.expr(f, inner)?;
                    self.stringify(f, self.type_of(inner.id)?)?;
                }
            }
            if pieces > 0 {
                f.emit(Instr::Call(self.helpers.str_concat));
            }
            pieces += 1;
        }
        if pieces == 0 {
            let addr = self.str_const(b"");
            f.emit(Instr::I32Const(addr as i32));
        }
        Ok(())
    }

    /// Turn the value on the stack into a string
    fn stringify(
        &mut self,
        f: &mut FunctionBuilder,
        ty: &Type,
    ) -> GenResult<()> {
        match ty {
            Type::Str => {}
            Type::Bool => {
                let yes = self.str_const(b"true");
                let no = self.str_const(b"false");
                f.if_(Some(ValType::I32));
                f.emit(Instr::I32Const(yes as i32));
                f.else_();
                f.emit(Instr::I32Const(no as i32));
                f.end();
            }
            Type::Float => f.emit(Instr::Call(HostImport::FmtF64.index())),
            Type::Int(kind) => {
                if !kind.is_wide() {
                    f.emit(Instr::Num(if kind.is_signed() {
                        NumOp::I64ExtendI32S
                    } else {
                        NumOp::I64ExtendI32U
                    }));
                }
                let import = if kind.is_signed() {
                    HostImport::FmtI64
                } else {
                    HostImport::FmtU64
                };
                f.emit(Instr::Call(import.index()));
            }
            other => {
                return Err(CodegenError::Unsupported(format!(
                    "interpolation of {}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// `expr?`: return the `Err` result unchanged, otherwise unwrap `Ok`
    fn try_operator(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        inner: &'a Expr,
    ) -> GenResult<()> {
        self.expr(f, inner)?;
        let result = self.spill(f, ValType::I32);
        f.emit(Instr::LocalGet(result));
        f.emit(Instr::Load {
            kind: MemKind::I32,
            offset: 0,
        });
        f.if_(None);
        f.emit(Instr::LocalGet(result));
        self.emit_return(f);
        f.end();
        if let Some(ty) = val_type(self.type_of(e.id)?) {
            f.emit(Instr::LocalGet(result));
            f.emit(Instr::Load {
                kind: MemKind::of(ty),
                offset: PAYLOAD_OFFSET,
            });
        }
        Ok(())
    }

    /// Allocate a `[tag][payload]` object
    pub(super) fn tagged(
        &mut self,
        f: &mut FunctionBuilder,
        tag: i32,
        payload: Option<&'a Expr>,
    ) -> GenResult<()> {
        let object = self.alloc(f, 2 * WORD);
        f.emit_all([
            Instr::LocalGet(object),
            Instr::I32Const(tag),
            Instr::Store {
                kind: MemKind::I32,
                offset: 0,
            },
        ]);
        if let Some(payload) = payload {
            match val_type(self.type_of(payload.id)?) {
                Some(ty) => {
                    f.emit(Instr::LocalGet(object));
                    self.expr(f, payload)?;
                    f.emit(Instr::Store {
                        kind: MemKind::of(ty),
                        offset: PAYLOAD_OFFSET,
                    });
                }
                None => self.expr(f, payload)?,
            }
        }
        f.emit(Instr::LocalGet(object));
        Ok(())
    }

    fn array_literal(
        &mut self,
        f: &mut FunctionBuilder,
        e: &'a Expr,
        elements: &'a [Expr],
    ) -> GenResult<()> {
        let elem = match self.type_of(e.id)? {
            Type::Array(elem) => &**elem,
            other => return Err(CodegenError::Unsupported(format!("array literal of {}", other))),
        };
        let kind = MemKind::of(slot_type(elem));
        let len = elements.len() as u32;
        let cap = len.max(self.config.default_array_capacity);
        let size = ARRAY_HEADER + WORD * cap;

        if elements.iter().all(is_constant) {
            let mut words = Vec::with_capacity(elements.len());
            for element in elements {
                words.push(self.const_word(element)?);
            }
            let template = self.data.push_words(&array_template(&words, cap));
            self.copy_template(f, template, size);
            return Ok(());
        }

        let array = self.alloc(f, size);
        f.emit_all([
            Instr::LocalGet(array),
            Instr::I32Const(len as i32),
            Instr::Store {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::LocalGet(array),
            Instr::I32Const(cap as i32),
            Instr::Store {
                kind: MemKind::I32,
                offset: 4,
            },
        ]);
        for (i, element) in elements.iter().enumerate() {
            f.emit(Instr::LocalGet(array));
            self.expr(f, element)?;
            f.emit(Instr::Store {
                kind,
                offset: ARRAY_HEADER + WORD * i as u32,
            });
        }
        f.emit(Instr::LocalGet(array));
        Ok(())
    }

    fn struct_literal(
        &mut self,
        f: &mut FunctionBuilder,
        name: &str,
        fields: &'a [FieldInit],
    ) -> GenResult<()> {
        let typed = self.typed;
        let shape = typed
            .symbols
            .structs
            .get(name)
            .ok_or_else(|| CodegenError::Unsupported(format!("unknown struct {}", name)))?;
        let size = WORD * (shape.fields.len() as u32).max(1);
        let slot_of = |init: &FieldInit| {
            shape
                .field_index(&init.name)
                .map(|(i, ty)| (i as u32, ty))
                .ok_or_else(|| CodegenError::Unsupported(format!("field {}.{}", name, init.name)))
        };

        if fields.iter().all(|init| is_constant(&init.value)) {
            let mut words = vec![Word::I64(0); shape.fields.len().max(1)];
            for init in fields {
                let (index, _) = slot_of(init)?;
                words[index as usize] = self.const_word(&init.value)?;
            }
            let template = self.data.push_words(&words);
            self.copy_template(f, template, size);
            return Ok(());
        }

        let object = self.alloc(f, size);
        for init in fields {
            let (index, field_ty) = slot_of(init)?;
            match val_type(field_ty) {
                Some(ty) => {
                    f.emit(Instr::LocalGet(object));
                    self.expr(f, &init.value)?;
                    f.emit(Instr::Store {
                        kind: MemKind::of(ty),
                        offset: WORD * index,
                    });
                }
                None => self.expr(f, &init.value)?,
            }
        }
        f.emit(Instr::LocalGet(object));
        Ok(())
    }

    /// Copy a constant template into a fresh heap block
    fn copy_template(
        &mut self,
        f: &mut FunctionBuilder,
        template: u32,
        size: u32,
    ) {
        let object = self.alloc(f, size);
        f.emit_all([
            Instr::LocalGet(object),
            Instr::I32Const(template as i32),
            Instr::I32Const(size as i32),
            Instr::MemoryCopy,
            Instr::LocalGet(object),
        ]);
    }

    /// Slot contents of a constant literal
    fn const_word(
        &mut self,
        e: &Expr,
    ) -> GenResult<Word> {
        let ty = self.type_of(e.id)?;
        Ok(match &e.kind {
            ExprKind::Int(value) => int_word(*value, ty),
            ExprKind::Float(value) => Word::F64(*value),
            ExprKind::Bool(value) => Word::I32(*value as i32),
            ExprKind::Str(text) => Word::I32(self.str_const(text.as_bytes()) as i32),
            ExprKind::Bytes(bytes) => Word::I32(self.str_const(bytes) as i32),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match operand.kind {
                ExprKind::Int(value) => int_word(-value, ty),
                ExprKind::Float(value) => Word::F64(-value),
                _ => return Err(CodegenError::Unsupported("non-constant template".to_string())),
            },
            _ => return Err(CodegenError::Unsupported("non-constant template".to_string())),
        })
    }

    /// Field index and type of `object.field`
    pub(super) fn field_slot(
        &self,
        object: &Expr,
        field: &str,
    ) -> GenResult<(u32, &'a Type)> {
        let typed = self.typed;
        match self.type_of(object.id)? {
            Type::Struct(name) => typed
                .symbols
                .structs
                .get(name)
                .and_then(|s| s.field_index(field))
                .map(|(i, ty)| (i as u32, ty))
                .ok_or_else(|| CodegenError::Unsupported(format!("field {}.{}", name, field))),
            other => Err(CodegenError::Unsupported(format!("field of {}", other))),
        }
    }

    /// Push the address of an element after a bounds check; returns the
    /// access kind and the offset to apply
    pub(super) fn element_address(
        &mut self,
        f: &mut FunctionBuilder,
        object: &'a Expr,
        index: &'a Expr,
    ) -> GenResult<(MemKind, u32)> {
        let object_ty = self.type_of(object.id)?;
        self.expr(f, object)?;
        let base = self.spill(f, ValType::I32);
        self.expr(f, index)?;
        if self.type_of(index.id)?.is_wide() {
            f.emit(Instr::Num(NumOp::I32WrapI64));
        }
        let i = self.spill(f, ValType::I32);

        f.emit_all([
            Instr::LocalGet(i),
            Instr::LocalGet(base),
            Instr::Load {
                kind: MemKind::I32,
                offset: 0,
            },
            Instr::Num(NumOp::I32GeU),
        ]);
        f.if_(None);
        f.emit(Instr::Unreachable);
        f.end();

        match object_ty {
            Type::Array(elem) => {
                f.emit_all([
                    Instr::LocalGet(base),
                    Instr::LocalGet(i),
                    Instr::I32Const(WORD as i32),
                    Instr::Num(NumOp::I32Mul),
                    Instr::Num(NumOp::I32Add),
                ]);
                Ok((MemKind::of(slot_type(elem)), ARRAY_HEADER))
            }
            Type::Bytes => {
                f.emit_all([
                    Instr::LocalGet(base),
                    Instr::LocalGet(i),
                    Instr::Num(NumOp::I32Add),
                ]);
                Ok((MemKind::U8, STR_HEADER))
            }
            other => Err(CodegenError::Unsupported(format!("indexing {}", other))),
        }
    }
}

/// Literals that can live in a data template
fn is_constant(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Str(_)
        | ExprKind::Bytes(_) => true,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => matches!(operand.kind, ExprKind::Int(_) | ExprKind::Float(_)),
        _ => false,
    }
}

/// Push an integer literal of type `ty`
pub(super) fn int_const(
    f: &mut FunctionBuilder,
    value: i128,
    ty: &Type,
) {
    f.emit(match int_word(value, ty) {
        Word::I32(v) => Instr::I32Const(v),
        Word::I64(v) => Instr::I64Const(v),
        Word::F64(v) => Instr::F64Const(v),
    });
}

fn int_word(
    value: i128,
    ty: &Type,
) -> Word {
    match ty {
        Type::Float => Word::F64(value as f64),
        Type::Int(kind) if kind.is_wide() => {
            if kind.is_signed() {
                Word::I64(value as i64)
            } else {
                Word::I64(value as u64 as i64)
            }
        }
        Type::Int(kind) if !kind.is_signed() => Word::I32(value as u32 as i32),
        _ => Word::I32(value as i32),
    }
}

/// Instruction for a numeric or boolean operator on operands of `ty`
pub(super) fn numeric_op(
    op: BinaryOp,
    ty: &Type,
) -> Option<NumOp> {
    use NumOp::*;
    let op = match ty {
        Type::Float => match op {
            BinaryOp::Add => F64Add,
            BinaryOp::Sub => F64Sub,
            BinaryOp::Mul => F64Mul,
            BinaryOp::Div => F64Div,
            BinaryOp::Eq => F64Eq,
            BinaryOp::Neq => F64Ne,
            BinaryOp::Lt => F64Lt,
            BinaryOp::Le => F64Le,
            BinaryOp::Gt => F64Gt,
            BinaryOp::Ge => F64Ge,
            _ => return None,
        },
        Type::Int(kind) if kind.is_wide() => {
            let signed = kind.is_signed();
            match op {
                BinaryOp::Add => I64Add,
                BinaryOp::Sub => I64Sub,
                BinaryOp::Mul => I64Mul,
                BinaryOp::Div if signed => I64DivS,
                BinaryOp::Div => I64DivU,
                BinaryOp::Rem if signed => I64RemS,
                BinaryOp::Rem => I64RemU,
                BinaryOp::Eq => I64Eq,
                BinaryOp::Neq => I64Ne,
                BinaryOp::Lt if signed => I64LtS,
                BinaryOp::Lt => I64LtU,
                BinaryOp::Le if signed => I64LeS,
                BinaryOp::Le => I64LeU,
                BinaryOp::Gt if signed => I64GtS,
                BinaryOp::Gt => I64GtU,
                BinaryOp::Ge if signed => I64GeS,
                BinaryOp::Ge => I64GeU,
                _ => return None,
            }
        }
        Type::Int(kind) => {
            let signed = kind.is_signed();
            match op {
                BinaryOp::Add => I32Add,
                BinaryOp::Sub => I32Sub,
                BinaryOp::Mul => I32Mul,
                BinaryOp::Div if signed => I32DivS,
                BinaryOp::Div => I32DivU,
                BinaryOp::Rem if signed => I32RemS,
                BinaryOp::Rem => I32RemU,
                BinaryOp::Eq => I32Eq,
                BinaryOp::Neq => I32Ne,
                BinaryOp::Lt if signed => I32LtS,
                BinaryOp::Lt => I32LtU,
                BinaryOp::Le if signed => I32LeS,
                BinaryOp::Le => I32LeU,
                BinaryOp::Gt if signed => I32GtS,
                BinaryOp::Gt => I32GtU,
                BinaryOp::Ge if signed => I32GeS,
                BinaryOp::Ge => I32GeU,
                _ => return None,
            }
        }
        Type::Bool => match op {
            BinaryOp::Eq => I32Eq,
            BinaryOp::Neq => I32Ne,
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

/// Bring a narrow integer back into its range after i32 arithmetic
pub(super) fn normalize(
    f: &mut FunctionBuilder,
    kind: IntKind,
) {
    if !needs_normalizing(kind) {
        return;
    }
    if kind.is_signed() {
        let shift = (32 - kind.bits()) as i32;
        f.emit_all([
            Instr::I32Const(shift),
            Instr::Num(NumOp::I32Shl),
            Instr::I32Const(shift),
            Instr::Num(NumOp::I32ShrS),
        ]);
    } else {
        let mask = ((1u32 << kind.bits()) - 1) as i32;
        f.emit_all([Instr::I32Const(mask), Instr::Num(NumOp::I32And)]);
    }
}

/// Numeric conversion of the value on the stack
fn cast(
    f: &mut FunctionBuilder,
    from: &Type,
    to: &Type,
) -> GenResult<()> {
    match (from, to) {
        (Type::Float, Type::Float) => {}
        (Type::Int(source), Type::Float) => {
            f.emit(Instr::Num(match (source.is_wide(), source.is_signed()) {
                (false, true) => NumOp::F64ConvertI32S,
                (false, false) => NumOp::F64ConvertI32U,
                (true, true) => NumOp::F64ConvertI64S,
                (true, false) => NumOp::F64ConvertI64U,
            }));
        }
        (Type::Float, Type::Int(target)) => {
            f.emit(Instr::Num(match (target.is_wide(), target.is_signed()) {
                (false, true) => NumOp::I32TruncSatF64S,
                (false, false) => NumOp::I32TruncSatF64U,
                (true, true) => NumOp::I64TruncSatF64S,
                (true, false) => NumOp::I64TruncSatF64U,
            }));
            normalize(f, *target);
        }
        (Type::Int(source), Type::Int(target)) => {
            match (source.is_wide(), target.is_wide()) {
                (false, true) => f.emit(Instr::Num(if source.is_signed() {
                    NumOp::I64ExtendI32S
                } else {
                    NumOp::I64ExtendI32U
                })),
                (true, false) => f.emit(Instr::Num(NumOp::I32WrapI64)),
                _ => {}
            }
            if !target.is_wide() {
                normalize(f, *target);
            }
        }
        _ => {
            return Err(CodegenError::Unsupported(format!(
                "cast from {} to {}",
                from, to
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_literals_keep_their_bits() {
        assert_eq!(int_word(255, &Type::Int(IntKind::U8)), Word::I32(255));
        assert_eq!(
            int_word(u32::MAX as i128, &Type::Int(IntKind::U32)),
            Word::I32(-1)
        );
        assert_eq!(
            int_word(u64::MAX as i128, &Type::Int(IntKind::U64)),
            Word::I64(-1)
        );
        assert_eq!(int_word(3, &Type::Float), Word::F64(3.0));
    }

    #[test]
    fn test_operator_forms_follow_signedness() {
        let u = Type::Int(IntKind::U32);
        assert_eq!(numeric_op(BinaryOp::Div, &Type::I32), Some(NumOp::I32DivS));
        assert_eq!(numeric_op(BinaryOp::Div, &u), Some(NumOp::I32DivU));
        assert_eq!(numeric_op(BinaryOp::Lt, &Type::Int(IntKind::U64)), Some(NumOp::I64LtU));
        assert_eq!(numeric_op(BinaryOp::Rem, &Type::Float), None);
        assert_eq!(numeric_op(BinaryOp::Eq, &Type::Bool), Some(NumOp::I32Eq));
    }

    #[test]
    fn test_narrow_results_are_normalized() {
        let mut f = FunctionBuilder::new("f", vec![], None);
        normalize(&mut f, IntKind::I8);
        normalize(&mut f, IntKind::U16);
        normalize(&mut f, IntKind::I32);
        let body = f.finish(None).body;
        assert_eq!(
            body,
            vec![
                Instr::I32Const(24),
                Instr::Num(NumOp::I32Shl),
                Instr::I32Const(24),
                Instr::Num(NumOp::I32ShrS),
                Instr::I32Const(0xffff),
                Instr::Num(NumOp::I32And),
                Instr::End,
            ]
        );
    }

    #[test]
    fn test_float_to_narrow_int_cast() {
        let mut f = FunctionBuilder::new("f", vec![], None);
        cast(&mut f, &Type::Float, &Type::Int(IntKind::U8)).unwrap();
        let body = f.finish(None).body;
        assert_eq!(body[0], Instr::Num(NumOp::I32TruncSatF64U));
        assert_eq!(body[1], Instr::I32Const(255));
    }
}
