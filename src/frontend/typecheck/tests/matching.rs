//! Match expression and exhaustiveness tests

use super::*;

const SHAPES: &str = "enum Shape { Dot, Circle(f64), Square(f64) }";

#[test]
fn test_exhaustive_enum_match() {
    check_ok(&format!(
        "{SHAPES} fn area(s: Shape) -> f64 {{ return match s {{ Dot => 0.0, Circle(r) => 3.14 * r * r, Shape::Square(w) => w * w }}; }}"
    ));
}

#[test]
fn test_missing_variant() {
    let err = check_err(&format!(
        "{SHAPES} fn area(s: Shape) -> f64 {{ return match s {{ Dot => 0.0, Circle(r) => r }}; }}"
    ));
    match err {
        TypeError::NonExhaustive { missing, .. } => assert_eq!(missing, "Shape::Square"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_wildcard_covers_rest() {
    check_ok(&format!(
        "{SHAPES} fn area(s: Shape) -> f64 {{ return match s {{ Dot => 0.0, _ => 1.0 }}; }}"
    ));
    check_ok(&format!(
        "{SHAPES} fn area(s: Shape) -> f64 {{ return match s {{ Dot => 0.0, other => 1.0 }}; }}"
    ));
}

#[test]
fn test_lenient_match_policy() {
    let source = format!("{SHAPES} fn f(s: Shape) -> i32 {{ return match s {{ Dot => 0 }}; }}");
    let program = program(&source);
    let config = CompileConfig {
        strict_match: false,
        ..CompileConfig::default()
    };
    assert!(check(&program, &config).is_ok());
}

#[test]
fn test_refutable_payload_does_not_cover() {
    let err = check_err(
        "fn f(r: Result<i32, string>) -> i32 { return match r { Ok(0) => 0, Err(e) => 1 }; }",
    );
    match err {
        TypeError::NonExhaustive { missing, .. } => assert_eq!(missing, "Ok(_)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_nested_payload_patterns_cover() {
    let options = "enum O { S(i32), No }";
    check_ok(&format!(
        "{options} fn f(r: Result<O, string>) -> i32 {{ return match r {{ Ok(O::S(v)) => v, Ok(No) => -1, Err(_) => -2 }}; }}"
    ));
    check_ok(
        "fn f(r: Result<bool, string>) -> i32 { return match r { Ok(true) => 1, Ok(false) => 0, Err(e) => -1 }; }",
    );
    let err = check_err(&format!(
        "{options} fn f(r: Result<O, string>) -> i32 {{ return match r {{ Ok(O::S(v)) => v, Err(_) => -2 }}; }}"
    ));
    match err {
        TypeError::NonExhaustive { missing, .. } => assert_eq!(missing, "Ok(O::No)"),
        other => panic!("unexpected {:?}", other),
    }
    let err = check_err(
        "fn f(r: Result<bool, string>) -> i32 { return match r { Ok(true) => 1, Err(e) => -1 }; }",
    );
    match err {
        TypeError::NonExhaustive { missing, .. } => assert_eq!(missing, "Ok(false)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_bool_and_literal_matches() {
    check_ok("fn f(b: bool) -> i32 { return match b { true => 1, false => 0 }; }");
    check_ok("fn f(n: i32) -> string { return match n { 0 => \"zero\", -1 => \"minus one\", _ => \"many\" }; }");
    let err = check_err("fn f(n: i32) -> i32 { return match n { 0 => 1 }; }");
    assert!(matches!(err, TypeError::NonExhaustive { .. }));
}

#[test]
fn test_arm_types_unify() {
    let err = check_err("fn f(b: bool) -> i32 { return match b { true => 1, false => \"no\" }; }");
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn test_diverging_arms() {
    check_ok(
        "fn f(r: Result<i32, string>) -> i32 {
            let n = match r { Ok(v) => v, Err(e) => { return -1; } };
            return n;
         }",
    );
}

#[test]
fn test_pattern_kind_mismatch() {
    let err = check_err("fn f(n: i32) -> i32 { return match n { \"a\" => 1, _ => 0 }; }");
    assert!(matches!(err, TypeError::Mismatch { .. }));
    let err = check_err(&format!(
        "{SHAPES} enum Other {{ Dot }} fn f(s: Shape) -> i32 {{ return match s {{ Other::Dot => 1, _ => 0 }}; }}"
    ));
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn test_payload_on_unit_variant() {
    let err = check_err(&format!(
        "{SHAPES} fn f(s: Shape) -> i32 {{ return match s {{ Dot(x) => 1, _ => 0 }}; }}"
    ));
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_match_statement_without_semicolon() {
    check_ok(&format!(
        "{SHAPES} fn f(s: Shape) {{ match s {{ Dot => print(\"dot\"), _ => print(\"other\") }} }}"
    ));
}

#[test]
fn test_variant_constructors() {
    check_ok(&format!("{SHAPES} let a = Shape::Dot; let b = Shape::Circle(1.5);"));
    let err = check_err(&format!("{SHAPES} let b = Shape::Circle;"));
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
    let err = check_err(&format!("{SHAPES} let b = Shape::Triangle;"));
    assert!(matches!(err, TypeError::Undefined { .. }));
}
