//! Code generator
//!
//! Lowers a [`TypedProgram`] to a structured stack-machine [`Module`].
//!
//! Function index space: the host imports come first, then one import per
//! `extern fn`, then the module's own functions in item order (an async
//! function is followed by its `$entry` body), the runtime helpers, the
//! script body and finally function literals and thunks, which are
//! appended as they are discovered.
//!
//! The generator reads every type and call resolution from the checker's
//! side tables; a missing entry is a [`CodegenError`], never a guess.

pub mod layout;
pub mod module;
pub mod wat;

mod asyncs;
mod call;
mod closure;
mod expr;
mod function;
mod helpers;
mod matching;
mod methods;
mod stmt;

pub use layout::{DataAllocator, Word};
pub use methods::MethodTable;
pub use module::*;

use crate::frontend::parser::ast::{Expr, FunctionDecl, Item, NodeId, Stmt};
use crate::frontend::typecheck::{BindingId, FnKey, FunctionKind, Type, TypedProgram};
use crate::runtime::bridge::{HostImport, HOST_IMPORTS, HOST_MODULE};
use crate::util::config::CompileConfig;
use crate::util::diagnostic::{Diagnostic, DiagnosticKind};
use crate::util::span::Span;
use function::FunctionBuilder;
use layout::{slot_type, val_type};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, trace};

/// Code generation failure. User programs that pass the checker never
/// produce one; each variant names the side-table entry that was missing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodegenError {
    #[error("no type recorded for expression {0}")]
    MissingType(NodeId),

    #[error("no call target recorded for expression {0}")]
    MissingCallTarget(NodeId),

    #[error("no resolution recorded for identifier {0}")]
    MissingResolution(NodeId),

    #[error("binding {0} ('{1}') has no local in this function")]
    MissingLocal(BindingId, String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("no method in slot {slot} of '{struct_name}'")]
    UnknownMethod { struct_name: String, slot: usize },

    #[error("'{0}' outside of a loop")]
    OutsideLoop(&'static str),

    #[error("cannot generate code for {0}")]
    Unsupported(String),
}

impl From<CodegenError> for Diagnostic {
    fn from(error: CodegenError) -> Self {
        Diagnostic::error(DiagnosticKind::Internal, error.to_string(), Span::dummy())
    }
}

pub(crate) type GenResult<T> = Result<T, CodegenError>;

/// Generate a module from a checked program
pub fn generate(
    typed: &TypedProgram<'_>,
    config: &CompileConfig,
) -> Result<Module, CodegenError> {
    Generator::new(typed, config).run()
}

/// Function bodies discovered while lowering other bodies
#[derive(Debug)]
enum Pending<'a> {
    /// A function literal, lifted to `(env, params..) -> R`
    Lambda { expr: &'a Expr, index: u32 },
    /// A named function used as a value
    Thunk { name: String, index: u32 },
}

/// Indices of the generated runtime helpers
#[derive(Debug, Clone, Copy, Default)]
struct Helpers {
    str_concat: u32,
    str_eq: u32,
    array_grow: u32,
}

/// Async function: the `$entry` body run by `task_spawn`
#[derive(Debug, Clone, Copy)]
struct AsyncEntry {
    function: u32,
    table_slot: u32,
}

pub(crate) struct Generator<'a> {
    typed: &'a TypedProgram<'a>,
    config: &'a CompileConfig,
    data: DataAllocator,
    types: Vec<FuncType>,
    imports: Vec<Import>,
    externs: HashMap<String, u32>,
    functions: Vec<Option<Function>>,
    /// Callable index of every source function (the wrapper for async ones)
    direct: HashMap<String, u32>,
    methods: MethodTable,
    entries: HashMap<FnKey, AsyncEntry>,
    helpers: Helpers,
    table: Vec<u32>,
    pending: VecDeque<Pending<'a>>,
    /// Function value records of named functions, by name
    thunks: HashMap<String, u32>,
    strings: HashMap<Vec<u8>, u32>,
    unit_variants: HashMap<(String, usize), u32>,
    start: Option<u32>,
}

impl<'a> Generator<'a> {
    pub fn new(
        typed: &'a TypedProgram<'a>,
        config: &'a CompileConfig,
    ) -> Self {
        Self {
            typed,
            config,
            data: DataAllocator::new(config.data_base),
            types: Vec::new(),
            imports: HOST_IMPORTS.clone(),
            externs: HashMap::new(),
            functions: Vec::new(),
            direct: HashMap::new(),
            methods: MethodTable::new(),
            entries: HashMap::new(),
            helpers: Helpers::default(),
            table: Vec::new(),
            pending: VecDeque::new(),
            thunks: HashMap::new(),
            strings: HashMap::new(),
            unit_variants: HashMap::new(),
            start: None,
        }
    }

    pub fn run(mut self) -> GenResult<Module> {
        self.declare_externs()?;
        self.plan()?;
        self.lower_items()?;
        helpers::emit_all(&mut self)?;
        self.lower_script()?;
        self.drain_pending()?;
        self.finish()
    }

    // ---- layout of the index space -------------------------------------

    fn declare_externs(&mut self) -> GenResult<()> {
        let typed = self.typed;
        for item in &typed.program.items {
            let Item::Function(decl) = item else { continue };
            if !decl.is_extern {
                continue;
            }
            let sig = self.signature(&decl.name)?;
            let ty = FuncType::new(
                sig.params.iter().map(slot_type).collect(),
                val_type(&sig.ret),
            );
            self.externs
                .insert(decl.name.clone(), self.imports.len() as u32);
            self.imports.push(Import {
                module: HOST_MODULE.to_string(),
                name: decl.name.clone(),
                ty,
            });
        }
        Ok(())
    }

    /// Assign indices to every function known before lowering starts, so
    /// calls can be emitted in any order
    fn plan(&mut self) -> GenResult<()> {
        let typed = self.typed;
        for item in &typed.program.items {
            match item {
                Item::Function(decl) if !decl.is_extern => {
                    let index = self.reserve();
                    self.direct.insert(decl.name.clone(), index);
                    if decl.is_async {
                        self.reserve_entry(FnKey::Function(decl.name.clone()));
                    }
                }
                Item::Struct(decl) => {
                    for (slot, method) in decl.methods.iter().enumerate() {
                        let index = self.reserve();
                        self.methods.insert(&decl.name, slot, index);
                        if method.is_async {
                            self.reserve_entry(FnKey::Method(
                                decl.name.clone(),
                                method.name.clone(),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
        self.helpers = Helpers {
            str_concat: self.reserve(),
            str_eq: self.reserve(),
            array_grow: self.reserve(),
        };
        if script_statements(&typed.program.items).next().is_some() {
            self.start = Some(self.reserve());
        }
        trace!(
            "planned {} functions after {} imports",
            self.functions.len(),
            self.imports.len()
        );
        Ok(())
    }

    fn reserve(&mut self) -> u32 {
        self.functions.push(None);
        (self.imports.len() + self.functions.len() - 1) as u32
    }

    fn reserve_entry(
        &mut self,
        key: FnKey,
    ) {
        let function = self.reserve();
        let table_slot = self.table_slot(function);
        self.entries.insert(
            key,
            AsyncEntry {
                function,
                table_slot,
            },
        );
    }

    /// Place a function in the table; returns its slot
    fn table_slot(
        &mut self,
        function: u32,
    ) -> u32 {
        self.table.push(function);
        (self.table.len() - 1) as u32
    }

    fn install(
        &mut self,
        index: u32,
        function: Function,
    ) -> GenResult<()> {
        let slot = (index as usize)
            .checked_sub(self.imports.len())
            .and_then(|i| self.functions.get_mut(i))
            .ok_or_else(|| CodegenError::UnknownFunction(function.name.clone()))?;
        *slot = Some(function);
        Ok(())
    }

    /// Index of a signature in the type table, added on first use
    fn type_index(
        &mut self,
        ty: FuncType,
    ) -> u32 {
        match self.types.iter().position(|t| *t == ty) {
            Some(index) => index as u32,
            None => {
                self.types.push(ty);
                (self.types.len() - 1) as u32
            }
        }
    }

    // ---- items ---------------------------------------------------------

    fn lower_items(&mut self) -> GenResult<()> {
        let typed = self.typed;
        for item in &typed.program.items {
            match item {
                Item::Function(decl) if !decl.is_extern => {
                    let index = self.function_index(&decl.name)?;
                    let export = self.export_name(decl, &decl.name);
                    self.lower_function(FnKey::Function(decl.name.clone()), decl, index, export)?;
                }
                Item::Struct(decl) => {
                    for (slot, method) in decl.methods.iter().enumerate() {
                        let index = self.method_index(&decl.name, slot)?;
                        let name = format!("{}.{}", decl.name, method.name);
                        let export = self.export_name(method, &name);
                        let key = FnKey::Method(decl.name.clone(), method.name.clone());
                        self.lower_function(key, method, index, export)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn export_name(
        &self,
        decl: &FunctionDecl,
        name: &str,
    ) -> Option<String> {
        if decl.is_export || decl.name == "main" || self.config.export_all {
            Some(name.to_string())
        } else {
            None
        }
    }

    fn lower_function(
        &mut self,
        key: FnKey,
        decl: &'a FunctionDecl,
        index: u32,
        export: Option<String>,
    ) -> GenResult<()> {
        let Some(body) = &decl.body else {
            return Ok(());
        };
        let sig = self.key_signature(&key)?;
        let name = match &key {
            FnKey::Method(s, m) => format!("{}.{}", s, m),
            _ => decl.name.clone(),
        };
        trace!("lowering {}", name);
        let (params, ret) = sig;
        if decl.is_async {
            return self.lower_async(key, &name, &params, &ret, body, index, export);
        }

        let mut f = FunctionBuilder::new(
            name,
            params.iter().map(slot_type).collect(),
            val_type(&ret),
        );
        let bindings = self.param_bindings(&key)?;
        for (i, binding) in bindings.iter().enumerate() {
            f.bind(*binding, i as u32);
        }
        self.block(&mut f, body)?;
        if f.result.is_some() {
            f.emit(Instr::Unreachable);
        }
        self.install(index, f.finish(export))
    }

    fn lower_script(&mut self) -> GenResult<()> {
        let Some(index) = self.start else {
            return Ok(());
        };
        let typed = self.typed;
        let mut f = FunctionBuilder::new("_start", Vec::new(), None);
        for stmt in script_statements(&typed.program.items) {
            self.stmt(&mut f, stmt)?;
        }
        self.install(index, f.finish(Some("_start".to_string())))
    }

    fn drain_pending(&mut self) -> GenResult<()> {
        while let Some(job) = self.pending.pop_front() {
            match job {
                Pending::Lambda { expr, index } => self.lower_lambda(expr, index)?,
                Pending::Thunk { name, index } => self.lower_thunk(&name, index)?,
            }
        }
        Ok(())
    }

    fn finish(self) -> GenResult<Module> {
        let imports = self.imports.len();
        let functions = self
            .functions
            .into_iter()
            .enumerate()
            .map(|(i, f)| f.ok_or_else(|| CodegenError::UnknownFunction(format!("#{}", i + imports))))
            .collect::<GenResult<Vec<_>>>()?;

        let main = match self.typed.symbols.functions.get("main") {
            Some(sig) if sig.kind == FunctionKind::User => {
                self.direct.get("main").map(|function| EntryInfo {
                    function: *function,
                    is_async: sig.is_async,
                    result: val_type(&sig.ret),
                })
            }
            _ => None,
        };

        let heap_base = self.data.end();
        let needed = heap_base.div_ceil(PAGE_SIZE).max(1);
        let memory = MemoryDecl {
            min_pages: self.config.memory_pages.max(needed),
        };
        debug!(
            "generated {} functions, {} table entries, data region {}..{}",
            functions.len(),
            self.table.len(),
            self.data.base(),
            heap_base
        );
        Ok(Module {
            types: self.types,
            imports: self.imports,
            functions,
            table: self.table,
            data: self.data.into_segments(),
            memory,
            heap_base,
            start: self.start,
            main,
        })
    }

    // ---- side tables ---------------------------------------------------

    fn type_of(
        &self,
        id: NodeId,
    ) -> GenResult<&'a Type> {
        let typed = self.typed;
        typed.types.get(&id).ok_or(CodegenError::MissingType(id))
    }

    fn signature(
        &self,
        name: &str,
    ) -> GenResult<&'a crate::frontend::typecheck::FunctionSig> {
        let typed = self.typed;
        typed
            .symbols
            .functions
            .get(name)
            .ok_or_else(|| CodegenError::UnknownFunction(name.to_string()))
    }

    /// Parameter and declared return types of a function or method
    fn key_signature(
        &self,
        key: &FnKey,
    ) -> GenResult<(Vec<Type>, Type)> {
        let typed = self.typed;
        match key {
            FnKey::Function(name) => {
                let sig = self.signature(name)?;
                Ok((sig.params.clone(), sig.ret.clone()))
            }
            FnKey::Method(struct_name, method) => typed
                .symbols
                .structs
                .get(struct_name)
                .and_then(|s| s.methods.get(method))
                .map(|m| (m.sig.params.clone(), m.sig.ret.clone()))
                .ok_or_else(|| CodegenError::UnknownFunction(format!("{}.{}", struct_name, method))),
            FnKey::Lambda(id) => match self.type_of(*id)? {
                Type::Fn(params, ret) => Ok((params.clone(), (**ret).clone())),
                other => Err(CodegenError::Unsupported(format!(
                    "function literal of type {}",
                    other
                ))),
            },
        }
    }

    fn param_bindings(
        &self,
        key: &FnKey,
    ) -> GenResult<&'a [BindingId]> {
        let typed = self.typed;
        typed
            .params
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CodegenError::Unsupported(format!("parameters of {:?}", key)))
    }

    fn binding_type(
        &self,
        binding: BindingId,
    ) -> GenResult<&'a Type> {
        let typed = self.typed;
        typed
            .binding(binding)
            .map(|b| &b.ty)
            .ok_or_else(|| CodegenError::MissingLocal(binding, String::new()))
    }

    fn function_index(
        &self,
        name: &str,
    ) -> GenResult<u32> {
        self.direct
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::UnknownFunction(name.to_string()))
    }

    fn extern_index(
        &self,
        name: &str,
    ) -> GenResult<u32> {
        self.externs
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::UnknownFunction(name.to_string()))
    }

    fn method_index(
        &self,
        struct_name: &str,
        slot: usize,
    ) -> GenResult<u32> {
        self.methods
            .get(struct_name, slot)
            .ok_or_else(|| CodegenError::UnknownMethod {
                struct_name: struct_name.to_string(),
                slot,
            })
    }

    // ---- constants -----------------------------------------------------

    /// Address of an interned string or bytes literal
    fn str_const(
        &mut self,
        bytes: &[u8],
    ) -> u32 {
        if let Some(addr) = self.strings.get(bytes) {
            return *addr;
        }
        let addr = self.data.push_str(bytes);
        self.strings.insert(bytes.to_vec(), addr);
        addr
    }

    /// Shared record of a payload-less enum variant
    fn unit_variant(
        &mut self,
        enum_name: &str,
        tag: usize,
    ) -> u32 {
        let key = (enum_name.to_string(), tag);
        if let Some(addr) = self.unit_variants.get(&key) {
            return *addr;
        }
        let addr = self.data.push_words(&[Word::I32(tag as i32), Word::I32(0)]);
        self.unit_variants.insert(key, addr);
        addr
    }

    /// Function value record of a named function, generating its thunk on
    /// first use
    fn function_value(
        &mut self,
        name: &str,
    ) -> GenResult<u32> {
        if let Some(addr) = self.thunks.get(name) {
            return Ok(*addr);
        }
        self.signature(name)?;
        let index = self.reserve();
        let slot = self.table_slot(index);
        self.pending.push_back(Pending::Thunk {
            name: name.to_string(),
            index,
        });
        let addr = self.data.push_words(&[Word::I32(slot as i32), Word::I32(0)]);
        self.thunks.insert(name.to_string(), addr);
        Ok(addr)
    }

    /// `name$thunk(env, params..)`: forwards to the named function
    fn lower_thunk(
        &mut self,
        name: &str,
        index: u32,
    ) -> GenResult<()> {
        let sig = self.signature(name)?;
        let mut params = vec![ValType::I32];
        params.extend(sig.params.iter().map(slot_type));
        let mut f = FunctionBuilder::new(
            format!("{}$thunk", name),
            params,
            val_type(&sig.effective_return()),
        );
        for i in 0..sig.params.len() {
            f.emit(Instr::LocalGet(i as u32 + 1));
        }
        let target = match sig.kind {
            FunctionKind::Extern => self.extern_index(name)?,
            _ => self.function_index(name)?,
        };
        f.emit(Instr::Call(target));
        self.install(index, f.finish(None))
    }

    /// Bump-allocate `size` bytes; returns the local holding the address
    fn alloc(
        &mut self,
        f: &mut FunctionBuilder,
        size: u32,
    ) -> u32 {
        f.emit(Instr::I32Const(size as i32));
        f.emit(Instr::Call(HostImport::Alloc.index()));
        let local = f.local(ValType::I32);
        f.emit(Instr::LocalSet(local));
        local
    }

    /// Pop a value of `ty` into a fresh local
    fn spill(
        &mut self,
        f: &mut FunctionBuilder,
        ty: ValType,
    ) -> u32 {
        let local = f.local(ty);
        f.emit(Instr::LocalSet(local));
        local
    }

    /// Read a binding of the current function, or of an enclosing one
    /// through the environment
    fn read_binding(
        &self,
        f: &mut FunctionBuilder,
        binding: BindingId,
    ) -> GenResult<()> {
        if let Some(local) = f.binding(binding) {
            f.emit(Instr::LocalGet(local));
            return Ok(());
        }
        match (f.capture_slot(binding), f.env) {
            (Some(slot), Some(env)) => {
                let ty = self.binding_type(binding)?;
                f.emit(Instr::LocalGet(env.local));
                f.emit(Instr::Load {
                    kind: MemKind::of(slot_type(ty)),
                    offset: layout::WORD * slot,
                });
                Ok(())
            }
            _ => {
                let name = self
                    .typed
                    .binding(binding)
                    .map(|b| b.name.clone())
                    .unwrap_or_default();
                Err(CodegenError::MissingLocal(binding, name))
            }
        }
    }
}

/// Statements of the script body, in order
fn script_statements<'p>(items: &'p [Item]) -> impl Iterator<Item = &'p Stmt> {
    items.iter().filter_map(|item| match item {
        Item::Stmt(stmt) => Some(stmt),
        _ => None,
    })
}

#[cfg(test)]
mod tests;
