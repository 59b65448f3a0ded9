//! Linear memory
//!
//! One byte-addressable region, initialised from the module's data
//! segments. The heap is a bump allocator starting at the module's
//! `heap_base`; nothing is ever freed.

use super::errors::{VmError, VmResult};
use super::value::Value;
use crate::middle::codegen::{MemKind, Module, PAGE_SIZE};
use std::ops::Range;
use tracing::trace;

const ALIGN: u32 = 8;

#[derive(Debug, Clone)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    next: u32,
    max_pages: u32,
}

impl LinearMemory {
    pub fn new(
        module: &Module,
        max_pages: u32,
    ) -> VmResult<Self> {
        let pages = module.memory.min_pages;
        if pages > max_pages {
            return Err(VmError::OutOfMemory { max_pages });
        }
        let mut memory = Self {
            bytes: vec![0; pages as usize * PAGE_SIZE as usize],
            next: module.heap_base.div_ceil(ALIGN) * ALIGN,
            max_pages,
        };
        for segment in &module.data {
            memory.write(segment.offset, &segment.bytes)?;
        }
        Ok(memory)
    }

    pub fn pages(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE as usize) as u32
    }

    /// Next address the allocator hands out
    pub fn heap_top(&self) -> u32 {
        self.next
    }

    fn range(
        &self,
        addr: u64,
        len: u32,
    ) -> VmResult<Range<usize>> {
        let end = addr + len as u64;
        if end > self.bytes.len() as u64 {
            return Err(VmError::MemoryOutOfBounds { addr, len });
        }
        Ok(addr as usize..end as usize)
    }

    pub fn load(
        &self,
        kind: MemKind,
        addr: i32,
        offset: u32,
    ) -> VmResult<Value> {
        let at = addr as u32 as u64 + offset as u64;
        let width = match kind {
            MemKind::U8 => 1,
            MemKind::I32 => 4,
            MemKind::I64 | MemKind::F64 => 8,
        };
        let bytes = &self.bytes[self.range(at, width)?];
        Ok(match kind {
            MemKind::U8 => Value::I32(bytes[0] as i32),
            MemKind::I32 => Value::I32(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            MemKind::I64 => Value::I64(i64::from_le_bytes(word(bytes))),
            MemKind::F64 => Value::F64(f64::from_le_bytes(word(bytes))),
        })
    }

    pub fn store(
        &mut self,
        kind: MemKind,
        addr: i32,
        offset: u32,
        value: Value,
    ) -> VmResult<()> {
        let at = addr as u32 as u64 + offset as u64;
        match kind {
            MemKind::U8 => {
                let range = self.range(at, 1)?;
                self.bytes[range][0] = value.as_i32()? as u8;
            }
            MemKind::I32 => {
                let range = self.range(at, 4)?;
                self.bytes[range].copy_from_slice(&value.as_i32()?.to_le_bytes());
            }
            MemKind::I64 => {
                let range = self.range(at, 8)?;
                self.bytes[range].copy_from_slice(&value.as_i64()?.to_le_bytes());
            }
            MemKind::F64 => {
                let range = self.range(at, 8)?;
                self.bytes[range].copy_from_slice(&value.as_f64()?.to_le_bytes());
            }
        }
        Ok(())
    }

    /// `memory.copy`; the regions may overlap
    pub fn copy(
        &mut self,
        dst: i32,
        src: i32,
        len: i32,
    ) -> VmResult<()> {
        let len = len as u32;
        let from = self.range(src as u32 as u64, len)?;
        let to = self.range(dst as u32 as u64, len)?;
        self.bytes.copy_within(from, to.start);
        Ok(())
    }

    pub fn read(
        &self,
        addr: u32,
        len: u32,
    ) -> VmResult<&[u8]> {
        Ok(&self.bytes[self.range(addr as u64, len)?])
    }

    pub fn write(
        &mut self,
        addr: u32,
        data: &[u8],
    ) -> VmResult<()> {
        let range = self.range(addr as u64, data.len() as u32)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Bytes of a `[len][bytes]` string or bytes object
    pub fn read_str(
        &self,
        ptr: u32,
    ) -> VmResult<&[u8]> {
        let len = self.load(MemKind::I32, ptr as i32, 0)?.as_i32()? as u32;
        self.read(ptr + 4, len)
    }

    /// Allocate `size` zeroed bytes, growing memory as needed
    pub fn alloc(
        &mut self,
        size: u32,
    ) -> VmResult<u32> {
        let addr = self.next;
        let end = addr
            .checked_add(size.max(1))
            .ok_or(VmError::OutOfMemory {
                max_pages: self.max_pages,
            })?;
        if end as usize > self.bytes.len() {
            let pages = end.div_ceil(PAGE_SIZE);
            if pages > self.max_pages {
                return Err(VmError::OutOfMemory {
                    max_pages: self.max_pages,
                });
            }
            trace!("growing memory to {} pages", pages);
            self.bytes.resize(pages as usize * PAGE_SIZE as usize, 0);
        }
        self.next = end.div_ceil(ALIGN) * ALIGN;
        Ok(addr)
    }

    /// Allocate a `[len][bytes]` object holding `data`
    pub fn alloc_str(
        &mut self,
        data: &[u8],
    ) -> VmResult<u32> {
        let ptr = self.alloc(4 + data.len() as u32)?;
        self.write(ptr, &(data.len() as u32).to_le_bytes())?;
        self.write(ptr + 4, data)?;
        Ok(ptr)
    }
}

fn word(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[..8]);
    out
}
