//! Code generator tests

mod layout;

use crate::frontend::Compiler;
use crate::middle::codegen::{Function, Instr, Module, ValType, PAGE_SIZE};
use crate::runtime::bridge::{HostImport, HOST_IMPORTS};
use crate::util::config::CompileConfig;

fn compile(source: &str) -> Module {
    match Compiler::new().compile(source) {
        Ok(module) => module,
        Err(e) => panic!("compile failed: {} in:\n{}", e.message, source),
    }
}

fn function<'m>(
    module: &'m Module,
    name: &str,
) -> &'m Function {
    module
        .functions
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no function {}", name))
}

fn calls(
    function: &Function,
    index: u32,
) -> bool {
    function.body.contains(&Instr::Call(index))
}

#[test]
fn test_host_imports_come_first() {
    let module = compile("extern fn host_add(a: i32, b: i32) -> i32; fn main() -> i32 { return host_add(1, 2); }");
    assert_eq!(&module.imports[..HOST_IMPORTS.len()], &HOST_IMPORTS[..]);
    let host_add = &module.imports[HOST_IMPORTS.len()];
    assert_eq!(host_add.name, "host_add");
    assert_eq!(host_add.ty.params, vec![ValType::I32, ValType::I32]);
    assert!(calls(function(&module, "main"), HOST_IMPORTS.len() as u32));
}

#[test]
fn test_scenario_a_structure() {
    let module = compile(
        "fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(10, 20); }",
    );
    let add = module.function_index("add").unwrap();
    let main = function(&module, "main");
    assert_eq!(main.export.as_deref(), Some("main"));
    assert!(calls(main, add));
    assert_eq!(function(&module, "add").export, None);
    let entry = module.main.as_ref().unwrap();
    assert_eq!(entry.function, module.export("main").unwrap());
    assert!(!entry.is_async);
    assert_eq!(entry.result, Some(ValType::I32));
    assert_eq!(module.start, None);
}

#[test]
fn test_script_body_becomes_start() {
    let module = compile("let x = 1; print(\"x = {x}\");");
    let start = module.start.unwrap();
    assert_eq!(module.export("_start"), Some(start));
    assert!(module.main.is_none());
    let body = &function(&module, "_start").body;
    assert!(body.contains(&Instr::Call(HostImport::Log.index())));
    assert!(body.contains(&Instr::Call(HostImport::FmtI64.index())));
}

#[test]
fn test_export_all() {
    let config = CompileConfig {
        export_all: true,
        ..CompileConfig::default()
    };
    let module = Compiler::with_config(config)
        .compile("fn helper() -> i32 { return 1; } export fn api() -> i32 { return helper(); }")
        .unwrap();
    assert_eq!(function(&module, "helper").export.as_deref(), Some("helper"));
    assert_eq!(function(&module, "api").export.as_deref(), Some("api"));
}

#[test]
fn test_methods_are_static_functions() {
    let module = compile(
        "struct Counter {
            n: i32,
            fn new() -> Counter { return Counter { n: 0 }; }
            fn add(self, k: i32) -> i32 { return self.n + k; }
         }
         fn main() -> i32 { let c = Counter::new(); return c.add(2); }",
    );
    let add = function(&module, "Counter.add");
    assert_eq!(add.ty.params, vec![ValType::I32, ValType::I32]);
    let main = function(&module, "main");
    assert!(calls(main, module.function_index("Counter.new").unwrap()));
    assert!(calls(main, module.function_index("Counter.add").unwrap()));
}

#[test]
fn test_lambda_is_lifted_into_the_table() {
    let module = compile(
        "fn main() -> i32 { let k = 3; let scale = fn(x: i32) => x * k; return scale(2); }",
    );
    let lambda = module
        .functions
        .iter()
        .find(|f| f.name.starts_with("lambda$"))
        .unwrap();
    // environment first
    assert_eq!(lambda.ty.params, vec![ValType::I32, ValType::I32]);
    let index = module.function_index(&lambda.name).unwrap();
    assert!(module.table.contains(&index));
    let main = function(&module, "main");
    assert!(main
        .body
        .iter()
        .any(|i| matches!(i, Instr::CallIndirect(_))));
}

#[test]
fn test_named_function_value_gets_thunk() {
    let module = compile(
        "fn double(x: i32) -> i32 { return x * 2; } fn main() -> i32 { let f: fn(i32) -> i32 = double; return f(4); }",
    );
    let thunk = function(&module, "double$thunk");
    assert_eq!(thunk.ty.params, vec![ValType::I32, ValType::I32]);
    assert!(calls(thunk, module.function_index("double").unwrap()));
    assert!(module
        .table
        .contains(&module.function_index("double$thunk").unwrap()));
}

#[test]
fn test_async_function_spawns_entry() {
    let module = compile("async fn f() -> i32 { return 5; } async fn main() -> i32 { return await f(); }");
    let f = function(&module, "f");
    assert_eq!(f.ty.results, vec![ValType::I32]);
    assert!(calls(f, HostImport::TaskSpawn.index()));

    let entry = function(&module, "f$entry");
    assert_eq!(entry.ty.params, vec![ValType::I32, ValType::I32]);
    assert!(entry.ty.results.is_empty());
    assert!(calls(entry, HostImport::PromiseResolve.index()));
    assert!(module
        .table
        .contains(&module.function_index("f$entry").unwrap()));

    assert!(calls(function(&module, "main$entry"), HostImport::PromiseAwait.index()));
    let main = module.main.as_ref().unwrap();
    assert!(main.is_async);
    assert_eq!(main.result, Some(ValType::I32));
}

#[test]
fn test_builtin_io_calls_host() {
    let module = compile(
        "async fn fetch(url: string) -> Result<string, string> {
            let body = await http_get(url)?;
            return Ok(body);
         }",
    );
    let entry = function(&module, "fetch$entry");
    assert!(calls(entry, HostImport::HttpGet.index()));
    assert!(calls(entry, HostImport::PromiseAwait.index()));
    // the wrapper packs `url` into the task environment
    assert!(calls(function(&module, "fetch"), HostImport::Alloc.index()));
}

#[test]
fn test_match_ends_in_unreachable() {
    let module = compile(
        "enum Shape { Circle(f64), Square(f64), Point }
         fn area(s: Shape) -> f64 {
            return match s { Circle(r) => r * r * 3.0, Square(w) => w * w, Point => 0.0 };
         }",
    );
    let body = &function(&module, "area").body;
    assert!(body.contains(&Instr::Unreachable));
    let blocks = body
        .iter()
        .filter(|i| matches!(i, Instr::Block(_)))
        .count();
    assert_eq!(blocks, 4);
}

#[test]
fn test_loops_resolve_labels() {
    let module = compile(
        "fn main() -> i32 {
            let total = 0;
            let i = 0;
            while i < 10 {
                i += 1;
                if i == 3 { continue; }
                for x in [1, 2, 3] {
                    if x == 2 { break; }
                    total += x;
                }
            }
            return total;
         }",
    );
    let body = &function(&module, "main").body;
    let mut depth = 0i32;
    for instr in body {
        match instr {
            Instr::Block(_) | Instr::Loop(_) | Instr::If(_) => depth += 1,
            Instr::End => depth -= 1,
            Instr::Br(d) | Instr::BrIf(d) => assert!((*d as i32) < depth),
            _ => {}
        }
    }
    assert_eq!(depth, -1);
}

#[test]
fn test_compile_is_idempotent() {
    let source = "struct P { x: i32, y: i32 }
        fn main() -> i32 { let p = P { x: 1, y: 2 }; let a = [p.x, p.y, 3]; a.push(4); return a[3]; }
        let s = \"hi {1 + 2}\";";
    let first = compile(source);
    let second = compile(source);
    assert_eq!(first, second);
    assert_eq!(first.to_wat(), second.to_wat());
}

#[test]
fn test_wat_rendering() {
    let module = compile("fn main() -> i32 { let f = fn(x: i32) => x; print(\"hello\"); return f(1); }");
    let wat = module.to_wat();
    assert!(wat.starts_with("(module\n"));
    assert!(wat.contains("(import \"env\" \"log\" (func $log (param i32 i32)))"));
    assert!(wat.contains("(memory (export \"memory\") 1)"));
    assert!(wat.contains("(table 1 funcref)"));
    assert!(wat.contains("(export \"main\")"));
    assert!(wat.contains("\\05\\00\\00\\00hello"));
    assert!(wat.trim_end().ends_with(')'));
}

#[test]
fn test_memory_covers_data_region() {
    let small = compile("fn main() { print(\"hello\"); }");
    assert_eq!(small.memory.min_pages, 1);

    let big = "x".repeat(70_000);
    let module = compile(&format!("fn main() {{ print(\"{}\"); }}", big));
    assert!(module.heap_base > PAGE_SIZE);
    assert_eq!(module.memory.min_pages, 2);

    let config = CompileConfig {
        memory_pages: 3,
        ..CompileConfig::default()
    };
    let module = Compiler::with_config(config)
        .compile("fn main() { }")
        .unwrap();
    assert_eq!(module.memory.min_pages, 3);
}

#[test]
fn test_json_round_trip() {
    let module = compile("fn main() -> f64 { let v = [1.5, 2.5]; return v[0]; }");
    let text = module.to_json().unwrap();
    assert_eq!(Module::from_json(&text).unwrap(), module);
}
