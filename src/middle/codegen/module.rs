//! Generated module model
//!
//! A structured stack-machine module in the shape of a WebAssembly module:
//! typed imports, functions with locals and a flat instruction list using
//! `block`/`loop`/`if`/`end` nesting, a function table for indirect calls,
//! data segments and one linear memory. [`Module::to_wat`] renders it as
//! WebAssembly text; the whole model serialises with serde.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValType {
    I32,
    I64,
    F64,
}

impl fmt::Display for ValType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ValType::I32 => f.write_str("i32"),
            ValType::I64 => f.write_str("i64"),
            ValType::F64 => f.write_str("f64"),
        }
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FuncType {
    pub params: Vec<ValType>,
    /// Zero or one result
    pub results: Vec<ValType>,
}

impl FuncType {
    pub fn new(
        params: Vec<ValType>,
        result: Option<ValType>,
    ) -> Self {
        Self {
            params,
            results: result.into_iter().collect(),
        }
    }
}

/// Result type of a structured block
pub type BlockType = Option<ValType>;

/// Width and type of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemKind {
    I32,
    I64,
    F64,
    /// One byte, zero-extended to i32 on load
    U8,
}

impl MemKind {
    pub fn of(ty: ValType) -> Self {
        match ty {
            ValType::I32 => MemKind::I32,
            ValType::I64 => MemKind::I64,
            ValType::F64 => MemKind::F64,
        }
    }
}

/// Numeric instructions without immediates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumOp {
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64GtS,
    I64GtU,
    I64LeS,
    I64LeU,
    I64GeS,
    I64GeU,
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    F64Eq,
    F64Ne,
    F64Lt,
    F64Gt,
    F64Le,
    F64Ge,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Neg,
    I32WrapI64,
    I64ExtendI32S,
    I64ExtendI32U,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF64S,
    I64TruncSatF64U,
    I64ReinterpretF64,
    F64ReinterpretI64,
}

impl NumOp {
    /// WebAssembly text mnemonic
    pub fn mnemonic(self) -> &'static str {
        use NumOp::*;
        match self {
            I32Eqz => "i32.eqz",
            I32Eq => "i32.eq",
            I32Ne => "i32.ne",
            I32LtS => "i32.lt_s",
            I32LtU => "i32.lt_u",
            I32GtS => "i32.gt_s",
            I32GtU => "i32.gt_u",
            I32LeS => "i32.le_s",
            I32LeU => "i32.le_u",
            I32GeS => "i32.ge_s",
            I32GeU => "i32.ge_u",
            I32Add => "i32.add",
            I32Sub => "i32.sub",
            I32Mul => "i32.mul",
            I32DivS => "i32.div_s",
            I32DivU => "i32.div_u",
            I32RemS => "i32.rem_s",
            I32RemU => "i32.rem_u",
            I32And => "i32.and",
            I32Or => "i32.or",
            I32Shl => "i32.shl",
            I32ShrS => "i32.shr_s",
            I32ShrU => "i32.shr_u",
            I64Eqz => "i64.eqz",
            I64Eq => "i64.eq",
            I64Ne => "i64.ne",
            I64LtS => "i64.lt_s",
            I64LtU => "i64.lt_u",
            I64GtS => "i64.gt_s",
            I64GtU => "i64.gt_u",
            I64LeS => "i64.le_s",
            I64LeU => "i64.le_u",
            I64GeS => "i64.ge_s",
            I64GeU => "i64.ge_u",
            I64Add => "i64.add",
            I64Sub => "i64.sub",
            I64Mul => "i64.mul",
            I64DivS => "i64.div_s",
            I64DivU => "i64.div_u",
            I64RemS => "i64.rem_s",
            I64RemU => "i64.rem_u",
            F64Eq => "f64.eq",
            F64Ne => "f64.ne",
            F64Lt => "f64.lt",
            F64Gt => "f64.gt",
            F64Le => "f64.le",
            F64Ge => "f64.ge",
            F64Add => "f64.add",
            F64Sub => "f64.sub",
            F64Mul => "f64.mul",
            F64Div => "f64.div",
            F64Neg => "f64.neg",
            I32WrapI64 => "i32.wrap_i64",
            I64ExtendI32S => "i64.extend_i32_s",
            I64ExtendI32U => "i64.extend_i32_u",
            F64ConvertI32S => "f64.convert_i32_s",
            F64ConvertI32U => "f64.convert_i32_u",
            F64ConvertI64S => "f64.convert_i64_s",
            F64ConvertI64U => "f64.convert_i64_u",
            I32TruncSatF64S => "i32.trunc_sat_f64_s",
            I32TruncSatF64U => "i32.trunc_sat_f64_u",
            I64TruncSatF64S => "i64.trunc_sat_f64_s",
            I64TruncSatF64U => "i64.trunc_sat_f64_u",
            I64ReinterpretF64 => "i64.reinterpret_f64",
            F64ReinterpretI64 => "f64.reinterpret_i64",
        }
    }
}

/// One instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    Unreachable,
    Block(BlockType),
    Loop(BlockType),
    If(BlockType),
    Else,
    End,
    /// Branch to the label `depth` levels out
    Br(u32),
    BrIf(u32),
    Return,
    /// Call by function index (imports first)
    Call(u32),
    /// Call through the table; the immediate is a type index and the table
    /// slot is on top of the stack
    CallIndirect(u32),
    Drop,
    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    I32Const(i32),
    I64Const(i64),
    F64Const(f64),
    Load { kind: MemKind, offset: u32 },
    Store { kind: MemKind, offset: u32 },
    /// `memory.copy`: destination, source, length
    MemoryCopy,
    Num(NumOp),
}

/// Host function imported by the module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub ty: FuncType,
}

/// Function defined by the module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Symbolic name, used for printing
    pub name: String,
    pub ty: FuncType,
    /// Locals after the parameters
    pub locals: Vec<ValType>,
    pub body: Vec<Instr>,
    /// Export name, if exported
    pub export: Option<String>,
}

/// Initialised bytes of linear memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSegment {
    pub offset: u32,
    pub bytes: Vec<u8>,
}

/// Linear memory declaration, in 64 KiB pages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryDecl {
    pub min_pages: u32,
}

/// How the host should treat `main`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub function: u32,
    /// `main` returns a promise handle to wait for
    pub is_async: bool,
    /// Machine type of the value `main` produces (after awaiting)
    pub result: Option<ValType>,
}

/// A complete generated module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Signature table referenced by `call_indirect`
    pub types: Vec<FuncType>,
    pub imports: Vec<Import>,
    pub functions: Vec<Function>,
    /// Function indices addressable by `call_indirect`
    pub table: Vec<u32>,
    pub data: Vec<DataSegment>,
    pub memory: MemoryDecl,
    /// First free byte after the data region; the host heap starts here
    pub heap_base: u32,
    /// Script body, if the program has top-level statements
    pub start: Option<u32>,
    pub main: Option<EntryInfo>,
}

/// Size of a memory page
pub const PAGE_SIZE: u32 = 65536;

impl Module {
    /// Signature of the function at `index` in the combined import and
    /// function index space
    pub fn func_type(
        &self,
        index: u32,
    ) -> Option<&FuncType> {
        let index = index as usize;
        if index < self.imports.len() {
            Some(&self.imports[index].ty)
        } else {
            self.functions.get(index - self.imports.len()).map(|f| &f.ty)
        }
    }

    /// Index of a defined function by symbolic name
    pub fn function_index(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| (i + self.imports.len()) as u32)
    }

    /// Index of an exported function
    pub fn export(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.functions
            .iter()
            .position(|f| f.export.as_deref() == Some(name))
            .map(|i| (i + self.imports.len()) as u32)
    }

    /// Total bytes of initialised data
    pub fn data_size(&self) -> usize {
        self.data.iter().map(|d| d.bytes.len()).sum()
    }

    /// Render as WebAssembly text
    pub fn to_wat(&self) -> String {
        super::wat::render(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl fmt::Display for Module {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.to_wat())
    }
}
