//! The end-to-end scenarios

use crate::support::{i32_of, run};
use wavelet::frontend::typecheck::TypeError;
use wavelet::util::diagnostic::DiagnosticKind;
use wavelet::vm::VmError;
use wavelet::{compile, compile_with_config, CompileConfig, Value, Vm};

#[test]
fn test_scenario_a_add() {
    let source = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(10, 20); }";
    assert_eq!(i32_of(source), 30);
}

#[test]
fn test_scenario_b_push() {
    let source = "let arr = [1, 2, 3]; arr.push(4); let n = arr.len(); let last = arr[3]; print(\"{n} {last}\");";
    assert_eq!(run(source).output, vec!["4 4".to_string()]);
}

#[test]
fn test_scenario_c_await() {
    let source = "async fn f() -> i32 { return 5; } async fn main() -> i32 { return await f(); }";
    let module = compile(source).unwrap();
    assert!(module.main.as_ref().unwrap().is_async);
    assert_eq!(run(source).value, Some(Value::I32(5)));
}

#[test]
fn test_scenario_d_argument_errors() {
    for source in [
        "fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(10); }",
        "fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(10, \"20\"); }",
    ] {
        let diagnostic = compile(source).unwrap_err();
        assert_eq!(diagnostic.kind, DiagnosticKind::Type);
        assert!(wavelet::run(source).is_err());
    }
}

#[test]
fn test_scenario_d_is_a_type_error_before_codegen() {
    let program = wavelet::Compiler::new()
        .parse("fn f(x: i32) -> i32 { return x; } let y = f(true);")
        .unwrap();
    let err = wavelet::frontend::typecheck::check(&program, &CompileConfig::default()).unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn test_scenario_e_match_policy() {
    let source = "enum Light { Red, Amber, Green }
        fn go(l: Light) -> i32 { return match l { Green => 1, Red => 0 }; }
        fn main() -> i32 { return go(Light::Green); }";
    let diagnostic = compile(source).unwrap_err();
    assert_eq!(diagnostic.kind, DiagnosticKind::Type);
    assert!(diagnostic.message.contains("Light::Amber"));

    let lenient = CompileConfig {
        strict_match: false,
        ..CompileConfig::default()
    };
    let module = compile_with_config(source, &lenient).unwrap();
    assert_eq!(Vm::new(module).unwrap().run().unwrap().value, Some(Value::I32(1)));

    // an uncovered variant falls through every arm
    let source = source.replace("go(Light::Green)", "go(Light::Amber)");
    let module = compile_with_config(&source, &lenient).unwrap();
    let err = Vm::new(module).unwrap().run().unwrap_err();
    assert!(matches!(err, VmError::Trap { .. }));
}
