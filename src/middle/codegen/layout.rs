//! Memory layout and the data-region allocator
//!
//! Every aggregate is a pointer (`i32`) into linear memory. Slots are one
//! word ([`WORD`] bytes) wide whatever the value type:
//!
//! | value          | layout                                         |
//! |----------------|------------------------------------------------|
//! | string, bytes  | `[len: u32][bytes ...]`                        |
//! | array          | `[len: u32][cap: u32][slot 0][slot 1] ...`     |
//! | struct         | field `i` at `8 * i`                           |
//! | enum, Result   | `[tag][payload]`, `Ok` = 0, `Err` = 1          |
//! | function value | `[table index][environment pointer]`           |

use super::module::{DataSegment, ValType};
use crate::frontend::typecheck::{IntKind, Type};

/// Slot stride in bytes
pub const WORD: u32 = 8;

/// Offset of the first array element
pub const ARRAY_HEADER: u32 = 8;

/// Offset of the first string byte
pub const STR_HEADER: u32 = 4;

/// Offset of an enum payload
pub const PAYLOAD_OFFSET: u32 = WORD;

/// Smallest capacity a growing array gets
pub const MIN_GROWTH: u32 = 4;

pub const TAG_OK: i32 = 0;
pub const TAG_ERR: i32 = 1;

/// Machine type of a value of `ty`; `None` for types without a runtime
/// value
pub fn val_type(ty: &Type) -> Option<ValType> {
    match ty {
        Type::Void | Type::Never => None,
        Type::Float => Some(ValType::F64),
        Type::Int(kind) if kind.is_wide() => Some(ValType::I64),
        _ => Some(ValType::I32),
    }
}

/// Machine type of a slot holding `ty`; void payloads still take a word
pub fn slot_type(ty: &Type) -> ValType {
    val_type(ty).unwrap_or(ValType::I32)
}

/// Narrow integers live in i32 and must be re-normalised after arithmetic
pub fn needs_normalizing(kind: IntKind) -> bool {
    kind.bits() < 32
}

fn align(
    value: u32,
    to: u32,
) -> u32 {
    value.div_ceil(to) * to
}

/// Forward-cursor allocator for the constant data region.
///
/// Owned by one generation pass; every allocation is aligned to [`WORD`].
#[derive(Debug)]
pub struct DataAllocator {
    base: u32,
    cursor: u32,
    segments: Vec<DataSegment>,
}

impl DataAllocator {
    pub fn new(base: u32) -> Self {
        let base = align(base, WORD);
        Self {
            base,
            cursor: base,
            segments: Vec::new(),
        }
    }

    /// Place `bytes` and return their address
    pub fn push(
        &mut self,
        bytes: Vec<u8>,
    ) -> u32 {
        let offset = self.cursor;
        self.cursor = align(offset + bytes.len().max(1) as u32, WORD);
        self.segments.push(DataSegment { offset, bytes });
        offset
    }

    /// Place a string or bytes literal as `[len][bytes]`
    pub fn push_str(
        &mut self,
        bytes: &[u8],
    ) -> u32 {
        let mut data = Vec::with_capacity(bytes.len() + STR_HEADER as usize);
        data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        data.extend_from_slice(bytes);
        self.push(data)
    }

    /// Place a record of word slots
    pub fn push_words(
        &mut self,
        words: &[Word],
    ) -> u32 {
        let mut data = Vec::with_capacity(words.len() * WORD as usize);
        for word in words {
            data.extend_from_slice(&word.to_bytes());
        }
        self.push(data)
    }

    /// First free byte after everything placed so far
    pub fn end(&self) -> u32 {
        self.cursor
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn into_segments(self) -> Vec<DataSegment> {
        self.segments
    }
}

/// Constant slot contents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Word {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Word {
    fn to_bytes(self) -> [u8; WORD as usize] {
        let mut out = [0u8; WORD as usize];
        match self {
            Word::I32(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            Word::I64(v) => out.copy_from_slice(&v.to_le_bytes()),
            Word::F64(v) => out.copy_from_slice(&v.to_le_bytes()),
        }
        out
    }
}

/// Bytes of an array template: header followed by `cap` slots
pub fn array_template(
    elements: &[Word],
    cap: u32,
) -> Vec<Word> {
    let header = (elements.len() as i64) | ((cap as i64) << 32);
    let mut words = Vec::with_capacity(cap as usize + 1);
    words.push(Word::I64(header));
    words.extend_from_slice(elements);
    words.resize(cap as usize + 1, Word::I64(0));
    words
}
