//! Per-function emission state: locals, instruction buffer and the label
//! stack used to resolve branch depths

use super::module::{BlockType, FuncType, Function, Instr, ValType};
use crate::frontend::typecheck::BindingId;
use std::collections::HashMap;

/// What a structured block is for, as seen by `break`/`continue`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Label {
    Plain,
    /// Branching here leaves the innermost loop
    LoopExit,
    /// Branching here starts the next iteration
    LoopContinue,
}

/// How `return` leaves the function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReturnMode {
    /// Plain `return` with the value on the stack
    Direct,
    /// Async body: settle the promise held in local `handle` with the
    /// value (of type `value`) on the stack, then return
    Resolve { handle: u32, value: Option<ValType> },
}

/// Where captured bindings are read from inside a function literal
#[derive(Debug, Clone, Copy)]
pub(super) struct Environment {
    /// Local holding the environment pointer
    pub local: u32,
}

#[derive(Debug)]
pub(super) struct FunctionBuilder {
    pub name: String,
    params: Vec<ValType>,
    pub result: Option<ValType>,
    locals: Vec<ValType>,
    body: Vec<Instr>,
    /// Local of every binding declared in this body
    bindings: HashMap<BindingId, u32>,
    /// Environment slot of every captured binding
    captures: HashMap<BindingId, u32>,
    pub env: Option<Environment>,
    labels: Vec<Label>,
    pub ret: ReturnMode,
}

impl FunctionBuilder {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ValType>,
        result: Option<ValType>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            result,
            locals: Vec::new(),
            body: Vec::new(),
            bindings: HashMap::new(),
            captures: HashMap::new(),
            env: None,
            labels: Vec::new(),
            ret: ReturnMode::Direct,
        }
    }

    /// Allocate a fresh local
    pub fn local(
        &mut self,
        ty: ValType,
    ) -> u32 {
        let index = (self.params.len() + self.locals.len()) as u32;
        self.locals.push(ty);
        index
    }

    /// Type of a parameter or local
    pub fn local_type(
        &self,
        index: u32,
    ) -> Option<ValType> {
        let index = index as usize;
        if index < self.params.len() {
            self.params.get(index).copied()
        } else {
            self.locals.get(index - self.params.len()).copied()
        }
    }

    pub fn bind(
        &mut self,
        binding: BindingId,
        local: u32,
    ) {
        self.bindings.insert(binding, local);
    }

    pub fn binding(
        &self,
        binding: BindingId,
    ) -> Option<u32> {
        self.bindings.get(&binding).copied()
    }

    pub fn bind_capture(
        &mut self,
        binding: BindingId,
        slot: u32,
    ) {
        self.captures.insert(binding, slot);
    }

    pub fn capture_slot(
        &self,
        binding: BindingId,
    ) -> Option<u32> {
        self.captures.get(&binding).copied()
    }

    pub fn emit(
        &mut self,
        instr: Instr,
    ) {
        self.body.push(instr);
    }

    pub fn emit_all(
        &mut self,
        instrs: impl IntoIterator<Item = Instr>,
    ) {
        self.body.extend(instrs);
    }

    /// Open a `block` and return its label index
    pub fn block(
        &mut self,
        ty: BlockType,
        label: Label,
    ) -> usize {
        self.body.push(Instr::Block(ty));
        self.labels.push(label);
        self.labels.len() - 1
    }

    pub fn loop_(
        &mut self,
        label: Label,
    ) -> usize {
        self.body.push(Instr::Loop(None));
        self.labels.push(label);
        self.labels.len() - 1
    }

    pub fn if_(
        &mut self,
        ty: BlockType,
    ) {
        self.body.push(Instr::If(ty));
        self.labels.push(Label::Plain);
    }

    pub fn else_(&mut self) {
        self.body.push(Instr::Else);
    }

    /// Close the innermost block, loop or if
    pub fn end(&mut self) {
        self.labels.pop();
        self.body.push(Instr::End);
    }

    /// Relative branch depth of the label at `index`
    pub fn depth(
        &self,
        index: usize,
    ) -> u32 {
        (self.labels.len() - 1 - index) as u32
    }

    /// Relative depth of the innermost label of `kind`
    pub fn depth_of(
        &self,
        kind: Label,
    ) -> Option<u32> {
        self.labels
            .iter()
            .rposition(|l| *l == kind)
            .map(|index| self.depth(index))
    }

    pub fn finish(
        self,
        export: Option<String>,
    ) -> Function {
        let mut body = self.body;
        body.push(Instr::End);
        Function {
            name: self.name,
            ty: FuncType {
                params: self.params,
                results: self.result.into_iter().collect(),
            },
            locals: self.locals,
            body,
            export,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locals_follow_params() {
        let mut f = FunctionBuilder::new("f", vec![ValType::I32, ValType::F64], None);
        assert_eq!(f.local(ValType::I64), 2);
        assert_eq!(f.local(ValType::I32), 3);
        assert_eq!(f.local_type(1), Some(ValType::F64));
        assert_eq!(f.local_type(2), Some(ValType::I64));
    }

    #[test]
    fn test_branch_depths() {
        let mut f = FunctionBuilder::new("f", vec![], None);
        f.block(None, Label::LoopExit);
        f.loop_(Label::Plain);
        f.block(None, Label::LoopContinue);
        f.if_(None);
        assert_eq!(f.depth_of(Label::LoopContinue), Some(1));
        assert_eq!(f.depth_of(Label::LoopExit), Some(3));
        f.end();
        f.end();
        assert_eq!(f.depth_of(Label::LoopContinue), None);
    }

    #[test]
    fn test_finish_appends_end() {
        let mut f = FunctionBuilder::new("f", vec![], Some(ValType::I32));
        f.emit(Instr::I32Const(1));
        let function = f.finish(Some("f".to_string()));
        assert_eq!(function.body, vec![Instr::I32Const(1), Instr::End]);
        assert_eq!(function.ty.results, vec![ValType::I32]);
    }
}
