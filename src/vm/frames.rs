//! Call frames, control labels and tasks

use super::errors::{VmError, VmResult};
use super::value::Value;
use crate::middle::codegen::Instr;
use crate::runtime::promise::PromiseHandle;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Block,
    Loop,
    If,
}

/// An open structured block
#[derive(Debug, Clone, Copy)]
pub struct Label {
    pub kind: LabelKind,
    /// `loop`: its own position; otherwise the matching `end`
    pub target: usize,
    /// Operand stack height at entry
    pub height: usize,
    /// Values carried out by a branch
    pub arity: usize,
}

/// Call frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index into the module's defined functions
    pub function: usize,
    pub pc: usize,
    pub locals: Vec<Value>,
    /// Operand stack height below this frame's values
    pub base: usize,
    pub labels: SmallVec<[Label; 8]>,
}

impl Frame {
    pub fn new(
        function: usize,
        locals: Vec<Value>,
        base: usize,
    ) -> Self {
        Self {
            function,
            pc: 0,
            locals,
            base,
            labels: SmallVec::new(),
        }
    }
}

/// Matching `end` and `else` positions of a function body, computed once
/// at instantiation
#[derive(Debug, Clone, Default)]
pub struct Jumps {
    end: Vec<usize>,
    else_: Vec<Option<usize>>,
}

impl Jumps {
    pub fn build(body: &[Instr]) -> VmResult<Self> {
        let mut end = vec![0; body.len()];
        let mut else_ = vec![None; body.len()];
        let mut open = Vec::new();
        for (pc, instr) in body.iter().enumerate() {
            match instr {
                Instr::Block(_) | Instr::Loop(_) | Instr::If(_) => open.push(pc),
                Instr::Else => {
                    let start = *open
                        .last()
                        .ok_or_else(|| VmError::Malformed(format!("else at {} outside if", pc)))?;
                    else_[start] = Some(pc);
                }
                Instr::End => match open.pop() {
                    Some(start) => end[start] = pc,
                    None if pc + 1 == body.len() => {}
                    None => return Err(VmError::Malformed(format!("unbalanced end at {}", pc))),
                },
                _ => {}
            }
        }
        if !open.is_empty() || !matches!(body.last(), Some(Instr::End)) {
            return Err(VmError::Malformed("function body is not terminated".to_string()));
        }
        Ok(Self { end, else_ })
    }

    pub fn end(
        &self,
        start: usize,
    ) -> usize {
        self.end[start]
    }

    pub fn else_(
        &self,
        start: usize,
    ) -> Option<usize> {
        self.else_[start]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A suspendable thread of execution: its own operand stack and frames
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub frames: Vec<Frame>,
    pub stack: Vec<Value>,
    /// Promise the task is parked on; its value is pushed on resumption
    pub awaiting: Option<PromiseHandle>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            frames: Vec::new(),
            stack: Vec::new(),
            awaiting: None,
        }
    }
}
