//! Checker state, signature collection and function bodies

use super::errors::{TypeError, TypeResult};
use super::symbols::*;
use super::types::Type;
use super::{CallTarget, FnKey, Resolution, TypedProgram};
use crate::frontend::parser::ast::*;
use crate::util::config::CompileConfig;
use crate::util::span::Span;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::trace;

/// One function-like body being checked
#[derive(Debug)]
pub(super) struct Frame {
    pub name: String,
    /// Declared return type (`T`, not `Promise<T>`, for async functions)
    pub ret: Type,
    /// Scope depth at which this body's scopes start
    pub scope_base: usize,
    pub loop_depth: usize,
    /// Set for function literals
    pub lambda: Option<NodeId>,
    pub captures: Vec<BindingId>,
}

/// Two-pass type checker
pub struct TypeChecker<'p> {
    pub(super) program: &'p Program,
    pub(super) strict_match: bool,
    pub(super) symbols: SymbolTable,
    pub(super) scopes: ScopeChain,
    pub(super) frames: Vec<Frame>,
    pub(super) types: HashMap<NodeId, Type>,
    pub(super) calls: HashMap<NodeId, CallTarget>,
    pub(super) resolutions: HashMap<NodeId, Resolution>,
    pub(super) variants: HashMap<NodeId, (String, usize)>,
    pub(super) bindings: HashMap<NodeId, BindingId>,
    pub(super) binding_info: Vec<BindingInfo>,
    pub(super) params: HashMap<FnKey, Vec<BindingId>>,
    pub(super) captures: HashMap<NodeId, Vec<BindingId>>,
}

impl<'p> TypeChecker<'p> {
    pub fn new(
        program: &'p Program,
        config: &CompileConfig,
    ) -> Self {
        Self {
            program,
            strict_match: config.strict_match,
            symbols: SymbolTable::with_prelude(),
            scopes: ScopeChain::new(),
            frames: Vec::new(),
            types: HashMap::new(),
            calls: HashMap::new(),
            resolutions: HashMap::new(),
            variants: HashMap::new(),
            bindings: HashMap::new(),
            binding_info: Vec::new(),
            params: HashMap::new(),
            captures: HashMap::new(),
        }
    }

    /// Run both passes
    pub fn run(mut self) -> TypeResult<TypedProgram<'p>> {
        self.collect_signatures()?;
        self.check_bodies()?;
        Ok(TypedProgram {
            program: self.program,
            symbols: self.symbols,
            types: self.types,
            calls: self.calls,
            resolutions: self.resolutions,
            variants: self.variants,
            bindings: self.bindings,
            binding_info: self.binding_info,
            params: self.params,
            captures: self.captures,
        })
    }

    // ---- pass 1 -------------------------------------------------------

    fn collect_signatures(&mut self) -> TypeResult<()> {
        let program = self.program;

        // Type names first so declarations can refer to each other
        for item in &program.items {
            let (name, span) = match item {
                Item::Struct(s) => (&s.name, s.span),
                Item::Enum(e) => (&e.name, e.span),
                _ => continue,
            };
            if self.symbols.is_type_name(name) || Type::primitive(name).is_some() {
                return Err(TypeError::Duplicate {
                    name: name.clone(),
                    span,
                });
            }
            match item {
                Item::Struct(_) => {
                    self.symbols.structs.insert(
                        name.clone(),
                        StructShape {
                            name: name.clone(),
                            fields: IndexMap::new(),
                            methods: IndexMap::new(),
                        },
                    );
                }
                _ => {
                    self.symbols.enums.insert(
                        name.clone(),
                        EnumShape {
                            name: name.clone(),
                            variants: Vec::new(),
                        },
                    );
                }
            }
        }

        for item in &program.items {
            match item {
                Item::Struct(decl) => self.collect_struct(decl)?,
                Item::Enum(decl) => self.collect_enum(decl)?,
                Item::Function(decl) => {
                    if self.symbols.functions.contains_key(&decl.name) {
                        return Err(TypeError::Duplicate {
                            name: decl.name.clone(),
                            span: decl.span,
                        });
                    }
                    let sig = self.signature_of(decl)?;
                    if decl.name == "main" && !sig.params.is_empty() {
                        return Err(TypeError::ArgumentCount {
                            name: "main".to_string(),
                            expected: 0,
                            found: sig.params.len(),
                            span: decl.span,
                        });
                    }
                    self.symbols.functions.insert(decl.name.clone(), sig);
                }
                Item::Stmt(_) => {}
            }
        }
        Ok(())
    }

    fn collect_struct(
        &mut self,
        decl: &StructDecl,
    ) -> TypeResult<()> {
        let mut fields = IndexMap::new();
        for field in &decl.fields {
            let ty = self.resolve_type(&field.ty)?;
            if fields.insert(field.name.clone(), ty).is_some() {
                return Err(TypeError::Duplicate {
                    name: field.name.clone(),
                    span: field.span,
                });
            }
        }
        let mut methods = IndexMap::new();
        for method in &decl.methods {
            if fields.contains_key(&method.name) || methods.contains_key(&method.name) {
                return Err(TypeError::Duplicate {
                    name: method.name.clone(),
                    span: method.span,
                });
            }
            let sig = self.signature_of(method)?;
            let slot = methods.len();
            methods.insert(
                method.name.clone(),
                MethodInfo {
                    slot,
                    has_self: method.has_self,
                    sig,
                },
            );
        }
        if let Some(shape) = self.symbols.structs.get_mut(&decl.name) {
            shape.fields = fields;
            shape.methods = methods;
        }
        Ok(())
    }

    fn collect_enum(
        &mut self,
        decl: &EnumDecl,
    ) -> TypeResult<()> {
        let mut variants: Vec<VariantShape> = Vec::new();
        for variant in &decl.variants {
            if variants.iter().any(|v| v.name == variant.name) {
                return Err(TypeError::Duplicate {
                    name: variant.name.clone(),
                    span: variant.span,
                });
            }
            let payload = match &variant.payload {
                Some(ty) => Some(self.resolve_type(ty)?),
                None => None,
            };
            variants.push(VariantShape {
                name: variant.name.clone(),
                payload,
            });
        }
        if let Some(shape) = self.symbols.enums.get_mut(&decl.name) {
            shape.variants = variants;
        }
        Ok(())
    }

    fn signature_of(
        &self,
        decl: &FunctionDecl,
    ) -> TypeResult<FunctionSig> {
        let params = decl
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect::<TypeResult<Vec<_>>>()?;
        let ret = match &decl.return_type {
            Some(ty) => self.resolve_type(ty)?,
            None => Type::Void,
        };
        Ok(FunctionSig {
            name: decl.name.clone(),
            params,
            ret,
            is_async: decl.is_async,
            is_export: decl.is_export,
            kind: if decl.is_extern {
                FunctionKind::Extern
            } else {
                FunctionKind::User
            },
        })
    }

    /// Resolve a written type
    pub(super) fn resolve_type(
        &self,
        ty: &TypeExpr,
    ) -> TypeResult<Type> {
        Ok(match &ty.kind {
            TypeExprKind::Named(name) => {
                if let Some(prim) = Type::primitive(name) {
                    prim
                } else if self.symbols.structs.contains_key(name) {
                    Type::Struct(name.clone())
                } else if self.symbols.enums.contains_key(name) {
                    Type::Enum(name.clone())
                } else {
                    return Err(TypeError::Undefined {
                        what: "type",
                        name: name.clone(),
                        span: ty.span,
                    });
                }
            }
            TypeExprKind::Array(elem) => Type::array(self.resolve_type(elem)?),
            TypeExprKind::Result(ok, err) => {
                Type::result(self.resolve_type(ok)?, self.resolve_type(err)?)
            }
            TypeExprKind::Promise(inner) => Type::promise(self.resolve_type(inner)?),
            TypeExprKind::Fn(params, ret) => Type::Fn(
                params
                    .iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<TypeResult<Vec<_>>>()?,
                Box::new(self.resolve_type(ret)?),
            ),
        })
    }

    // ---- pass 2 -------------------------------------------------------

    fn check_bodies(&mut self) -> TypeResult<()> {
        let program = self.program;
        for item in &program.items {
            match item {
                Item::Function(decl) if !decl.is_extern => {
                    let sig = self.symbols.functions[&decl.name].clone();
                    self.check_function(FnKey::Function(decl.name.clone()), decl, &sig)?;
                }
                Item::Struct(decl) => {
                    for method in &decl.methods {
                        let sig = self.symbols.structs[&decl.name].methods[&method.name]
                            .sig
                            .clone();
                        let key = FnKey::Method(decl.name.clone(), method.name.clone());
                        self.check_function(key, method, &sig)?;
                    }
                }
                _ => {}
            }
        }

        // Script body: top-level statements share one scope
        self.enter_frame("<script>", Type::Void, None);
        for item in &program.items {
            if let Item::Stmt(stmt) = item {
                self.check_stmt(stmt)?;
            }
        }
        self.leave_frame();
        Ok(())
    }

    fn check_function(
        &mut self,
        key: FnKey,
        decl: &FunctionDecl,
        sig: &FunctionSig,
    ) -> TypeResult<()> {
        trace!("checking function {}", decl.name);
        let Some(body) = &decl.body else {
            return Ok(());
        };
        self.enter_frame(&decl.name, sig.ret.clone(), None);
        let mut ids = Vec::with_capacity(decl.params.len());
        for (param, ty) in decl.params.iter().zip(&sig.params) {
            ids.push(self.declare(&param.name, ty.clone(), false));
        }
        self.params.insert(key, ids);

        let diverges = self.check_block_in_scope(body);
        self.leave_frame();
        let diverges = diverges?;

        if sig.ret != Type::Void && !diverges {
            return Err(TypeError::MissingReturn {
                name: decl.name.clone(),
                ty: sig.ret.clone(),
                span: decl.span,
            });
        }
        Ok(())
    }

    /// Check a function literal; returns its `fn(..) -> R` type
    pub(super) fn check_lambda(
        &mut self,
        id: NodeId,
        params: &[Param],
        return_type: Option<&TypeExpr>,
        body: &LambdaBody,
        expected: Option<&Type>,
        span: Span,
    ) -> TypeResult<Type> {
        let param_types = params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect::<TypeResult<Vec<_>>>()?;
        let declared = match return_type {
            Some(ty) => Some(self.resolve_type(ty)?),
            None => None,
        };
        let hint = declared.clone().or_else(|| match expected {
            Some(Type::Fn(_, ret)) => Some((**ret).clone()),
            _ => None,
        });

        self.enter_frame("<fn>", hint.clone().unwrap_or(Type::Void), Some(id));
        let ids = params
            .iter()
            .zip(&param_types)
            .map(|(p, ty)| self.declare(&p.name, ty.clone(), false))
            .collect();
        self.params.insert(FnKey::Lambda(id), ids);

        let ret = self.check_lambda_body(body, declared, hint, span);
        let frame = self.leave_frame();
        let ret = ret?;
        self.captures.insert(id, frame.captures);
        Ok(Type::Fn(param_types, Box::new(ret)))
    }

    /// Check a lambda body inside its frame. The caller leaves the frame
    /// whether or not this succeeds.
    fn check_lambda_body(
        &mut self,
        body: &LambdaBody,
        declared: Option<Type>,
        hint: Option<Type>,
        span: Span,
    ) -> TypeResult<Type> {
        match body {
            LambdaBody::Expr(expr) => {
                let ty = self.check_expr(expr, hint.as_ref())?;
                match declared {
                    Some(declared) if !declared.accepts(&ty) => {
                        Err(TypeError::mismatch(&declared, &ty, expr.span))
                    }
                    Some(declared) => Ok(declared),
                    None if ty == Type::Never => Ok(Type::Void),
                    None => Ok(ty),
                }
            }
            LambdaBody::Block(block) => {
                let ret = declared.or(hint).unwrap_or(Type::Void);
                let diverges = self.check_block_in_scope(block)?;
                if ret != Type::Void && !diverges {
                    return Err(TypeError::MissingReturn {
                        name: "<fn>".to_string(),
                        ty: ret,
                        span,
                    });
                }
                Ok(ret)
            }
        }
    }

    // ---- helpers ------------------------------------------------------

    pub(super) fn enter_frame(
        &mut self,
        name: &str,
        ret: Type,
        lambda: Option<NodeId>,
    ) {
        self.frames.push(Frame {
            name: name.to_string(),
            ret,
            scope_base: self.scopes.depth(),
            loop_depth: 0,
            lambda,
            captures: Vec::new(),
        });
        self.scopes.push();
    }

    pub(super) fn leave_frame(&mut self) -> Frame {
        match self.frames.pop() {
            Some(frame) => {
                self.scopes.truncate(frame.scope_base);
                frame
            }
            None => Frame {
                name: String::new(),
                ret: Type::Void,
                scope_base: 0,
                loop_depth: 0,
                lambda: None,
                captures: Vec::new(),
            },
        }
    }

    /// Innermost body; a frame is always open while bodies are checked
    pub(super) fn frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub(super) fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Introduce a binding in the innermost scope
    pub(super) fn declare(
        &mut self,
        name: &str,
        ty: Type,
        is_const: bool,
    ) -> BindingId {
        let id = self.binding_info.len() as BindingId;
        self.binding_info.push(BindingInfo {
            name: name.to_string(),
            ty,
            is_const,
        });
        self.scopes.bind(name, id);
        id
    }

    /// Resolve a variable name, recording captures for every function
    /// literal between the use and the declaring body
    pub(super) fn lookup_var(
        &mut self,
        name: &str,
    ) -> Option<Resolution> {
        let (id, depth) = self.scopes.lookup(name)?;
        let owner = self
            .frames
            .iter()
            .rposition(|f| f.scope_base <= depth)
            .unwrap_or(0);
        let current = self.frames.len() - 1;
        if owner == current {
            return Some(Resolution::Local(id));
        }
        for frame in &mut self.frames[owner + 1..] {
            if !frame.captures.contains(&id) {
                frame.captures.push(id);
            }
        }
        Some(Resolution::Captured(id))
    }

    pub(super) fn binding_type(
        &self,
        id: BindingId,
    ) -> Type {
        self.binding_info
            .get(id as usize)
            .map(|b| b.ty.clone())
            .unwrap_or(Type::Void)
    }
}
