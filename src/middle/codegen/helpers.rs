//! Runtime helpers emitted into every module

use super::function::{FunctionBuilder, Label};
use super::layout::{ARRAY_HEADER, MIN_GROWTH, STR_HEADER, WORD};
use super::module::{Instr, MemKind, NumOp, ValType};
use super::{GenResult, Generator};
use crate::runtime::bridge::HostImport;

const LEN: Instr = Instr::Load {
    kind: MemKind::I32,
    offset: 0,
};

pub(super) fn emit_all(generator: &mut Generator<'_>) -> GenResult<()> {
    let helpers = generator.helpers;
    generator.install(helpers.str_concat, str_concat())?;
    generator.install(helpers.str_eq, str_eq())?;
    generator.install(helpers.array_grow, array_grow())
}

/// `__str_concat(a, b) -> string`
fn str_concat() -> super::Function {
    use Instr::*;
    let mut f = FunctionBuilder::new(
        "__str_concat",
        vec![ValType::I32, ValType::I32],
        Some(ValType::I32),
    );
    let (a, b) = (0, 1);
    let len_a = f.local(ValType::I32);
    let len_b = f.local(ValType::I32);
    let out = f.local(ValType::I32);
    let header = STR_HEADER as i32;
    f.emit_all([
        LocalGet(a),
        LEN,
        LocalSet(len_a),
        LocalGet(b),
        LEN,
        LocalSet(len_b),
        LocalGet(len_a),
        LocalGet(len_b),
        Num(NumOp::I32Add),
        I32Const(header),
        Num(NumOp::I32Add),
        Call(HostImport::Alloc.index()),
        LocalSet(out),
        LocalGet(out),
        LocalGet(len_a),
        LocalGet(len_b),
        Num(NumOp::I32Add),
        Store {
            kind: MemKind::I32,
            offset: 0,
        },
        // a's bytes
        LocalGet(out),
        I32Const(header),
        Num(NumOp::I32Add),
        LocalGet(a),
        I32Const(header),
        Num(NumOp::I32Add),
        LocalGet(len_a),
        MemoryCopy,
        // b's bytes
        LocalGet(out),
        I32Const(header),
        Num(NumOp::I32Add),
        LocalGet(len_a),
        Num(NumOp::I32Add),
        LocalGet(b),
        I32Const(header),
        Num(NumOp::I32Add),
        LocalGet(len_b),
        MemoryCopy,
        LocalGet(out),
    ]);
    f.finish(None)
}

/// `__str_eq(a, b) -> bool`: byte-wise comparison
fn str_eq() -> super::Function {
    use Instr::*;
    let mut f = FunctionBuilder::new(
        "__str_eq",
        vec![ValType::I32, ValType::I32],
        Some(ValType::I32),
    );
    let (a, b) = (0, 1);
    let len = f.local(ValType::I32);
    let i = f.local(ValType::I32);
    let byte = |s: u32| {
        [
            LocalGet(s),
            LocalGet(i),
            Num(NumOp::I32Add),
            Load {
                kind: MemKind::U8,
                offset: STR_HEADER,
            },
        ]
    };

    f.emit_all([
        LocalGet(a),
        LEN,
        LocalTee(len),
        LocalGet(b),
        LEN,
        Num(NumOp::I32Ne),
    ]);
    f.if_(None);
    f.emit_all([I32Const(0), Return]);
    f.end();

    let exit = f.block(None, Label::Plain);
    let top = f.loop_(Label::Plain);
    f.emit_all([LocalGet(i), LocalGet(len), Num(NumOp::I32GeU)]);
    let depth = f.depth(exit);
    f.emit(BrIf(depth));
    f.emit_all(byte(a));
    f.emit_all(byte(b));
    f.emit(Num(NumOp::I32Ne));
    f.if_(None);
    f.emit_all([I32Const(0), Return]);
    f.end();
    f.emit_all([
        LocalGet(i),
        I32Const(1),
        Num(NumOp::I32Add),
        LocalSet(i),
    ]);
    let depth = f.depth(top);
    f.emit(Br(depth));
    f.end();
    f.end();
    f.emit(I32Const(1));
    f.finish(None)
}

/// `__array_grow(array) -> array`: the array itself while it has room,
/// otherwise a copy with capacity `max(MIN_GROWTH, 2 * cap)`
fn array_grow() -> super::Function {
    use Instr::*;
    let mut f = FunctionBuilder::new("__array_grow", vec![ValType::I32], Some(ValType::I32));
    let array = 0;
    let len = f.local(ValType::I32);
    let cap = f.local(ValType::I32);
    let new_cap = f.local(ValType::I32);
    let out = f.local(ValType::I32);

    f.emit_all([
        LocalGet(array),
        LEN,
        LocalSet(len),
        LocalGet(array),
        Load {
            kind: MemKind::I32,
            offset: 4,
        },
        LocalSet(cap),
        LocalGet(len),
        LocalGet(cap),
        Num(NumOp::I32LtU),
    ]);
    f.if_(None);
    f.emit_all([LocalGet(array), Return]);
    f.end();

    f.emit_all([
        LocalGet(cap),
        I32Const(2),
        Num(NumOp::I32Mul),
        LocalSet(new_cap),
        LocalGet(new_cap),
        I32Const(MIN_GROWTH as i32),
        Num(NumOp::I32LtU),
    ]);
    f.if_(None);
    f.emit_all([I32Const(MIN_GROWTH as i32), LocalSet(new_cap)]);
    f.end();

    f.emit_all([
        LocalGet(new_cap),
        I32Const(WORD as i32),
        Num(NumOp::I32Mul),
        I32Const(ARRAY_HEADER as i32),
        Num(NumOp::I32Add),
        Call(HostImport::Alloc.index()),
        LocalSet(out),
        LocalGet(out),
        LocalGet(len),
        Store {
            kind: MemKind::I32,
            offset: 0,
        },
        LocalGet(out),
        LocalGet(new_cap),
        Store {
            kind: MemKind::I32,
            offset: 4,
        },
        LocalGet(out),
        I32Const(ARRAY_HEADER as i32),
        Num(NumOp::I32Add),
        LocalGet(array),
        I32Const(ARRAY_HEADER as i32),
        Num(NumOp::I32Add),
        LocalGet(len),
        I32Const(WORD as i32),
        Num(NumOp::I32Mul),
        MemoryCopy,
        LocalGet(out),
    ]);
    f.finish(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(body: &[Instr]) -> bool {
        let mut depth = 0i32;
        for instr in body {
            match instr {
                Instr::Block(_) | Instr::Loop(_) | Instr::If(_) => depth += 1,
                Instr::End => depth -= 1,
                _ => {}
            }
        }
        depth == -1
    }

    #[test]
    fn test_helpers_are_well_nested() {
        for function in [str_concat(), str_eq(), array_grow()] {
            assert!(balanced(&function.body), "{}", function.name);
            assert_eq!(function.ty.results, vec![ValType::I32]);
        }
    }

    #[test]
    fn test_str_eq_loop_exits_to_outer_block() {
        let body = str_eq().body;
        let exit = body
            .iter()
            .position(|i| *i == Instr::BrIf(1))
            .expect("loop exit");
        assert!(matches!(body[exit - 1], Instr::Num(NumOp::I32GeU)));
    }
}
