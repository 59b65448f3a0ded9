//! Literal, operator and binding tests

use super::*;
use crate::frontend::typecheck::Type;

#[test]
fn test_arithmetic_and_comparison() {
    check_ok("fn f(a: i32, b: i32) -> bool { return a + b * 2 > a - b; }");
    check_ok("fn f(a: f64) -> f64 { return a / 2.0 + 1; }");
    check_ok("fn f(s: string) -> string { return s + \"!\"; }");
}

#[test]
fn test_no_implicit_promotion() {
    let err = check_err("fn f(a: i32, b: i64) -> i64 { return a + b; }");
    assert!(matches!(err, TypeError::Mismatch { .. }), "{:?}", err);
    check_ok("fn f(a: i32, b: i64) -> i64 { return a as i64 + b; }");
}

#[test]
fn test_literal_takes_expected_type() {
    check_ok("let x: u8 = 255; let y: i64 = 9000000000; let z: f64 = 3;");
    check_ok("fn f(x: i64) -> i64 { return 1 + x; }");
}

#[test]
fn test_literal_out_of_range() {
    let err = check_err("let x: u8 = 256;");
    assert!(matches!(err, TypeError::LiteralOutOfRange { value: 256, .. }));
    check_ok("let x: i8 = -128;");
    let err = check_err("let x: i8 = -129;");
    assert!(matches!(err, TypeError::LiteralOutOfRange { value: -129, .. }));
    let err = check_err("let x = 3000000000;");
    assert!(matches!(err, TypeError::LiteralOutOfRange { .. }));
}

#[test]
fn test_remainder_needs_integers() {
    check_ok("fn f(a: u32) -> u32 { return a % 7; }");
    let err = check_err("fn f(a: f64) -> f64 { return a % 2.0; }");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_logical_operands_must_be_bool() {
    let err = check_err("let x = 1 && true;");
    assert!(matches!(err, TypeError::Mismatch { .. }));
    check_ok("let x = !(1 < 2) || false;");
}

#[test]
fn test_negation_of_unsigned_is_rejected() {
    let err = check_err("fn f(a: u32) -> u32 { return -a; }");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_casts_between_numerics_only() {
    check_ok("let x = 3.7 as i32; let y = 300 as u8; let z = 1 as f64;");
    let err = check_err("let x = true as i32;");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_string_interpolation_parts() {
    check_ok("let n = 3; let s = \"n = {n}, ok = {n > 2}\";");
    let err = check_err("let a = [1]; let s = \"{a}\";");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_undefined_variable() {
    let err = check_err("fn f() -> i32 { return y; }");
    match err {
        TypeError::Undefined { what, name, .. } => {
            assert_eq!(what, "variable");
            assert_eq!(name, "y");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_const_is_not_assignable() {
    let err = check_err("const x = 1; x = 2;");
    assert!(matches!(err, TypeError::NotAssignable { .. }));
    check_ok("let x = 1; x = 2; x += 3;");
}

#[test]
fn test_compound_assignment_checks_operator() {
    check_ok("let s = \"a\"; s += \"b\";");
    let err = check_err("let b = true; b += true;");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_arrays() {
    check_ok("let a = [1, 2, 3]; let b: i32 = a[0]; let n = a.len();");
    check_ok("let a: [i64] = []; a.push(1);");
    let err = check_err("let a = [];");
    assert!(matches!(err, TypeError::AnnotationNeeded { .. }));
    let err = check_err("let a = [1, true];");
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn test_push_needs_assignable_receiver() {
    check_ok("struct S { items: [i32] } let s = S { items: [] }; s.items.push(1);");
    let err = check_err("const a = [1]; a.push(2);");
    assert!(matches!(err, TypeError::NotAssignable { .. }));
    let err = check_err("fn make() -> [i32] { return [1]; } make().push(2);");
    assert!(matches!(err, TypeError::NotAssignable { .. }));
}

#[test]
fn test_bytes_index_is_u8() {
    check_ok("let b = b\"hi\"; let x: u8 = b[0]; let n = b.len();");
}

#[test]
fn test_struct_literals_and_fields() {
    check_ok("struct P { x: i32, y: i32 } let p = P { x: 1, y: 2 }; let s = p.x + p.y; p.x = 5;");
    let err = check_err("struct P { x: i32, y: i32 } let p = P { x: 1 };");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
    let err = check_err("struct P { x: i32 } let p = P { x: 1, x: 2 };");
    assert!(matches!(err, TypeError::Duplicate { .. }));
    let err = check_err("struct P { x: i32 } let p = P { x: 1 }; let z = p.z;");
    assert!(matches!(err, TypeError::Undefined { what: "field", .. }));
}

#[test]
fn test_void_binding_is_rejected() {
    let err = check_err("let x = print(\"hi\");");
    assert!(matches!(err, TypeError::InvalidOperation { .. }));
}

#[test]
fn test_recorded_types() {
    let program = program("let x: u16 = 7; let y = x + 1;");
    let typed = check(&program, &CompileConfig::default()).unwrap();
    let u16_count = typed
        .types
        .values()
        .filter(|t| **t == Type::Int(crate::frontend::typecheck::IntKind::U16))
        .count();
    // `7`, `x`, `1` and `x + 1`
    assert_eq!(u16_count, 4);
    assert_eq!(typed.binding_info.len(), 2);
}
