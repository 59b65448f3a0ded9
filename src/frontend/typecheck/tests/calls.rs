//! Function, method and builtin call tests

use super::*;
use crate::frontend::typecheck::{CallTarget, Type};

#[test]
fn test_direct_call() {
    check_ok("fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(10, 20); }");
}

#[test]
fn test_missing_argument() {
    let err = check_err("fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(1); }");
    match err {
        TypeError::ArgumentCount {
            name,
            expected,
            found,
            ..
        } => {
            assert_eq!(name, "add");
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_mismatched_argument() {
    let err = check_err("fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(1, \"2\"); }");
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn test_forward_and_mutual_recursion() {
    check_ok(
        "fn even(n: i32) -> bool { if n == 0 { return true; } return odd(n - 1); }
         fn odd(n: i32) -> bool { if n == 0 { return false; } return even(n - 1); }",
    );
}

#[test]
fn test_duplicate_function() {
    let err = check_err("fn f() {} fn f() {}");
    assert!(matches!(err, TypeError::Duplicate { .. }));
}

#[test]
fn test_main_takes_no_parameters() {
    let err = check_err("fn main(x: i32) {}");
    assert!(matches!(err, TypeError::ArgumentCount { .. }));
}

#[test]
fn test_methods_and_static_methods() {
    check_ok(
        "struct Counter {
            n: i32,
            fn new() -> Counter { return Counter { n: 0 }; }
            fn get(self) -> i32 { return self.n; }
            fn add(self, k: i32) -> i32 { return self.n + k; }
         }
         let c = Counter::new();
         let v = c.get() + c.add(2);",
    );
}

#[test]
fn test_static_method_called_on_value() {
    let err = check_err(
        "struct C { n: i32, fn new() -> C { return C { n: 0 }; } } let c = C { n: 1 }; let d = c.new();",
    );
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_method_call_targets() {
    let program = program(
        "struct C { n: i32, fn a(self) -> i32 { return 1; } fn b(self) -> i32 { return self.a(); } }",
    );
    let typed = check(&program, &CompileConfig::default()).unwrap();
    assert!(typed.calls.values().any(|t| *t
        == CallTarget::Method {
            struct_name: "C".to_string(),
            slot: 0
        }));
}

#[test]
fn test_builtins() {
    check_ok("print(\"hello\");");
    check_ok(
        "async fn main() -> i32 {
            let body = await http_get(\"http://localhost/\");
            await sleep(10);
            return match body { Ok(s) => s.len(), Err(e) => -1 };
         }",
    );
    let err = check_err("let p = print;");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_extern_function() {
    let program = program("extern fn now() -> i64; let t = now();");
    let typed = check(&program, &CompileConfig::default()).unwrap();
    assert!(typed
        .calls
        .values()
        .any(|t| *t == CallTarget::Extern("now".to_string())));
}

#[test]
fn test_await_yields_inner_type() {
    check_ok("async fn f() -> i32 { return 5; } async fn main() -> i32 { return await f(); }");
    let program = program("async fn f() -> i32 { return 5; } async fn g() -> i32 { let x = f(); return await x; }");
    let typed = check(&program, &CompileConfig::default()).unwrap();
    let x = typed.binding_info.iter().find(|b| b.name == "x").unwrap();
    assert_eq!(x.ty, Type::promise(Type::I32));
}

#[test]
fn test_await_non_promise() {
    let err = check_err("fn f() -> i32 { return 5; } async fn main() -> i32 { return await f(); }");
    match err {
        TypeError::AwaitNonPromise { found, .. } => assert_eq!(found, Type::I32),
        other => panic!("unexpected {:?}", other),
    }
}
