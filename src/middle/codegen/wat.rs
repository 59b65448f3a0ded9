//! WebAssembly text rendering

use super::module::*;
use std::fmt::Write;

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_.$<>-".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn signature(ty: &FuncType) -> String {
    let mut out = String::new();
    if !ty.params.is_empty() {
        out.push_str(" (param");
        for p in &ty.params {
            let _ = write!(out, " {}", p);
        }
        out.push(')');
    }
    for r in &ty.results {
        let _ = write!(out, " (result {})", r);
    }
    out
}

fn block_suffix(ty: &BlockType) -> String {
    match ty {
        Some(t) => format!(" (result {})", t),
        None => String::new(),
    }
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() && b != b'"' && b != b'\\' || b == b' ' {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\{:02x}", b);
        }
    }
    out
}

fn mem_op(
    kind: MemKind,
    store: bool,
) -> &'static str {
    match (kind, store) {
        (MemKind::I32, false) => "i32.load",
        (MemKind::I64, false) => "i64.load",
        (MemKind::F64, false) => "f64.load",
        (MemKind::U8, false) => "i32.load8_u",
        (MemKind::I32, true) => "i32.store",
        (MemKind::I64, true) => "i64.store",
        (MemKind::F64, true) => "f64.store",
        (MemKind::U8, true) => "i32.store8",
    }
}

/// Name of a function in the combined index space
fn func_name(
    module: &Module,
    index: u32,
) -> String {
    let index = index as usize;
    if index < module.imports.len() {
        format!("${}", sanitize(&module.imports[index].name))
    } else {
        match module.functions.get(index - module.imports.len()) {
            Some(f) => format!("${}", sanitize(&f.name)),
            None => index.to_string(),
        }
    }
}

fn render_instr(
    module: &Module,
    instr: &Instr,
) -> String {
    match instr {
        Instr::Unreachable => "unreachable".to_string(),
        Instr::Block(t) => format!("block{}", block_suffix(t)),
        Instr::Loop(t) => format!("loop{}", block_suffix(t)),
        Instr::If(t) => format!("if{}", block_suffix(t)),
        Instr::Else => "else".to_string(),
        Instr::End => "end".to_string(),
        Instr::Br(d) => format!("br {}", d),
        Instr::BrIf(d) => format!("br_if {}", d),
        Instr::Return => "return".to_string(),
        Instr::Call(i) => format!("call {}", func_name(module, *i)),
        Instr::CallIndirect(t) => format!("call_indirect (type $t{})", t),
        Instr::Drop => "drop".to_string(),
        Instr::LocalGet(i) => format!("local.get {}", i),
        Instr::LocalSet(i) => format!("local.set {}", i),
        Instr::LocalTee(i) => format!("local.tee {}", i),
        Instr::I32Const(v) => format!("i32.const {}", v),
        Instr::I64Const(v) => format!("i64.const {}", v),
        Instr::F64Const(v) => format!("f64.const {:?}", v),
        Instr::Load { kind, offset } | Instr::Store { kind, offset } => {
            let op = mem_op(*kind, matches!(instr, Instr::Store { .. }));
            if *offset == 0 {
                op.to_string()
            } else {
                format!("{} offset={}", op, offset)
            }
        }
        Instr::MemoryCopy => "memory.copy".to_string(),
        Instr::Num(op) => op.mnemonic().to_string(),
    }
}

/// Render `module` as WebAssembly text
pub fn render(module: &Module) -> String {
    let mut out = String::from("(module\n");

    for (i, ty) in module.types.iter().enumerate() {
        let _ = writeln!(out, "  (type $t{} (func{}))", i, signature(ty));
    }
    for import in &module.imports {
        let _ = writeln!(
            out,
            "  (import \"{}\" \"{}\" (func ${}{}))",
            import.module,
            import.name,
            sanitize(&import.name),
            signature(&import.ty)
        );
    }
    let _ = writeln!(out, "  (memory (export \"memory\") {})", module.memory.min_pages);
    if !module.table.is_empty() {
        let _ = writeln!(out, "  (table {} funcref)", module.table.len());
        let names: Vec<String> = module.table.iter().map(|i| func_name(module, *i)).collect();
        let _ = writeln!(out, "  (elem (i32.const 0) func {})", names.join(" "));
    }
    for segment in &module.data {
        let _ = writeln!(
            out,
            "  (data (i32.const {}) \"{}\")",
            segment.offset,
            escape_bytes(&segment.bytes)
        );
    }

    for function in &module.functions {
        let _ = write!(out, "  (func ${}", sanitize(&function.name));
        if let Some(export) = &function.export {
            let _ = write!(out, " (export \"{}\")", export);
        }
        out.push_str(&signature(&function.ty));
        if !function.locals.is_empty() {
            out.push_str(" (local");
            for l in &function.locals {
                let _ = write!(out, " {}", l);
            }
            out.push(')');
        }
        out.push('\n');

        let mut depth = 2usize;
        for instr in &function.body {
            if matches!(instr, Instr::End | Instr::Else) {
                depth = depth.saturating_sub(1);
            }
            let _ = writeln!(out, "{}{}", "  ".repeat(depth), render_instr(module, instr));
            if matches!(
                instr,
                Instr::Block(_) | Instr::Loop(_) | Instr::If(_) | Instr::Else
            ) {
                depth += 1;
            }
        }
        out.push_str("  )\n");
    }

    out.push_str(")\n");
    out
}
