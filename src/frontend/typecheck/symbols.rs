//! Symbol table and scope chain

use super::types::Type;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Prelude functions implemented by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    HttpGet,
    HttpPost,
    ReadFile,
    WriteFile,
    Sleep,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Print,
        Builtin::HttpGet,
        Builtin::HttpPost,
        Builtin::ReadFile,
        Builtin::WriteFile,
        Builtin::Sleep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::HttpGet => "http_get",
            Builtin::HttpPost => "http_post",
            Builtin::ReadFile => "read_file",
            Builtin::WriteFile => "write_file",
            Builtin::Sleep => "sleep",
        }
    }

    pub fn signature(self) -> (Vec<Type>, Type) {
        let io = Type::promise(Type::result(Type::Str, Type::Str));
        match self {
            Builtin::Print => (vec![Type::Str], Type::Void),
            Builtin::HttpGet | Builtin::ReadFile => (vec![Type::Str], io),
            Builtin::HttpPost => (vec![Type::Str, Type::Str], io),
            Builtin::WriteFile => (
                vec![Type::Str, Type::Str],
                Type::promise(Type::result(Type::I32, Type::Str)),
            ),
            Builtin::Sleep => (vec![Type::I32], Type::promise(Type::Void)),
        }
    }
}

/// What kind of callable a signature belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Declared in source with a body
    User,
    /// `extern fn` host import
    Extern,
    Builtin(Builtin),
}

/// Function signature
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Type>,
    /// Declared return type (`T` for an `async fn` returning `Promise<T>`)
    pub ret: Type,
    pub is_async: bool,
    pub is_export: bool,
    pub kind: FunctionKind,
}

impl FunctionSig {
    /// Return type seen by callers
    pub fn effective_return(&self) -> Type {
        if self.is_async {
            Type::promise(self.ret.clone())
        } else {
            self.ret.clone()
        }
    }

    /// Type of the function used as a value
    pub fn fn_type(&self) -> Type {
        Type::Fn(self.params.clone(), Box::new(self.effective_return()))
    }
}

/// Method entry; `slot` is its position in the struct's method list
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub slot: usize,
    pub has_self: bool,
    /// Parameters include the receiver when `has_self`
    pub sig: FunctionSig,
}

/// Struct shape: ordered fields and methods
#[derive(Debug, Clone, PartialEq)]
pub struct StructShape {
    pub name: String,
    pub fields: IndexMap<String, Type>,
    pub methods: IndexMap<String, MethodInfo>,
}

impl StructShape {
    pub fn field_index(
        &self,
        name: &str,
    ) -> Option<(usize, &Type)> {
        self.fields.get_full(name).map(|(i, _, ty)| (i, ty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantShape {
    pub name: String,
    pub payload: Option<Type>,
}

/// Enum shape: ordered variants, tag = index
#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub name: String,
    pub variants: Vec<VariantShape>,
}

impl EnumShape {
    pub fn variant_index(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }
}

/// Global symbols collected in the first pass
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub functions: IndexMap<String, FunctionSig>,
    pub structs: IndexMap<String, StructShape>,
    pub enums: IndexMap<String, EnumShape>,
}

impl SymbolTable {
    /// Table pre-populated with the prelude
    pub fn with_prelude() -> Self {
        let mut table = Self::default();
        for builtin in Builtin::ALL {
            let (params, ret) = builtin.signature();
            table.functions.insert(
                builtin.name().to_string(),
                FunctionSig {
                    name: builtin.name().to_string(),
                    params,
                    ret,
                    is_async: false,
                    is_export: false,
                    kind: FunctionKind::Builtin(builtin),
                },
            );
        }
        table
    }

    pub fn is_type_name(
        &self,
        name: &str,
    ) -> bool {
        self.structs.contains_key(name) || self.enums.contains_key(name)
    }

    /// If `name` is a variant of the enum `ty`, its tag. A bare name in a
    /// pattern is a variant when this returns `Some`, a binding otherwise.
    pub fn variant_of(
        &self,
        ty: &Type,
        name: &str,
    ) -> Option<usize> {
        match ty {
            Type::Enum(enum_name) => self.enums.get(enum_name)?.variant_index(name),
            _ => None,
        }
    }
}

/// Identity of a local binding (parameter, `let`, loop variable or
/// pattern binding), unique within one program
pub type BindingId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
}

/// Lexical scopes of the function being checked.
///
/// Scopes are pushed at block, loop and function entry and popped at exit.
#[derive(Debug, Default)]
pub struct ScopeChain {
    scopes: Vec<HashMap<String, BindingId>>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Number of open scopes
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn bind(
        &mut self,
        name: &str,
        id: BindingId,
    ) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    /// Innermost binding of `name` and the index of the scope holding it
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<(BindingId, usize)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.get(name).map(|id| (*id, depth)))
    }

    /// Drop every scope at or above `depth`
    pub fn truncate(
        &mut self,
        depth: usize,
    ) {
        self.scopes.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_shadowing_and_exit() {
        let mut scopes = ScopeChain::new();
        scopes.push();
        scopes.bind("x", 0);
        scopes.push();
        scopes.bind("x", 1);
        assert_eq!(scopes.lookup("x"), Some((1, 1)));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some((0, 0)));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), None);
    }

    #[test]
    fn test_prelude_signatures() {
        let table = SymbolTable::with_prelude();
        let get = &table.functions["http_get"];
        assert_eq!(
            get.effective_return().to_string(),
            "Promise<Result<string, string>>"
        );
        assert_eq!(table.functions["sleep"].params, vec![Type::I32]);
    }

    #[test]
    fn test_async_effective_return() {
        let sig = FunctionSig {
            name: "f".to_string(),
            params: vec![],
            ret: Type::I32,
            is_async: true,
            is_export: false,
            kind: FunctionKind::User,
        };
        assert_eq!(sig.effective_return(), Type::promise(Type::I32));
    }
}
