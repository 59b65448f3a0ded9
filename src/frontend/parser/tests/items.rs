//! Item parsing tests

use super::*;

#[test]
fn test_empty_program() {
    assert!(program("").items.is_empty());
}

#[test]
fn test_function_modifiers() {
    let p = program(
        "export fn a() {} async fn b() -> i32 { return 1; } extern fn c(x: i32) -> i32; export async fn d() {}",
    );
    let fns: Vec<&FunctionDecl> = p
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Function(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(fns.len(), 4);
    assert!(fns[0].is_export && !fns[0].is_async);
    assert!(fns[1].is_async);
    assert!(fns[2].is_extern && fns[2].body.is_none());
    assert!(fns[3].is_export && fns[3].is_async);
}

#[test]
fn test_struct_with_methods() {
    let p = program(
        "struct Point { x: i32, y: i32, fn sum(self) -> i32 { return self.x + self.y; } fn origin() -> Point { return Point { x: 0, y: 0 }; } }",
    );
    match &p.items[0] {
        Item::Struct(s) => {
            assert_eq!(s.fields.len(), 2);
            assert_eq!(s.methods.len(), 2);
            assert!(s.methods[0].has_self);
            assert_eq!(
                s.methods[0].params[0].ty.kind,
                TypeExprKind::Named("Point".to_string())
            );
            assert!(!s.methods[1].has_self);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_self_outside_method_is_rejected() {
    let err = parse_err("fn f(self) {}");
    assert_eq!(err.found, "'self'");
}

#[test]
fn test_enum_declaration() {
    let p = program("enum Shape { Dot, Circle(f64), Square(f64), }");
    match &p.items[0] {
        Item::Enum(e) => {
            assert_eq!(e.variants.len(), 3);
            assert!(e.variants[0].payload.is_none());
            assert!(e.variants[1].payload.is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_type_annotations() {
    let p = program("fn f(a: [i32], r: Result<string, i32>, p: Promise<[u8]>, g: fn(i32, bool) -> f64) {}");
    let Item::Function(f) = &p.items[0] else {
        panic!("expected function");
    };
    assert!(matches!(f.params[0].ty.kind, TypeExprKind::Array(_)));
    assert!(matches!(f.params[1].ty.kind, TypeExprKind::Result(_, _)));
    assert!(matches!(f.params[2].ty.kind, TypeExprKind::Promise(_)));
    match &f.params[3].ty.kind {
        TypeExprKind::Fn(params, _) => assert_eq!(params.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_top_level_statements() {
    let p = program("let arr = [1, 2, 3]; arr.push(4);");
    assert_eq!(p.items.len(), 2);
    assert!(p.items.iter().all(|i| matches!(i, Item::Stmt(_))));
}

#[test]
fn test_node_count_covers_all_ids() {
    let p = program("fn main() -> i32 { let a = 1; return a + 2; }");
    assert!(p.node_count >= 4);
}

#[test]
fn test_first_error_only() {
    let err = parse_err("fn a( {} fn b( {}");
    assert_eq!(err.span.start.line, 1);
    assert_eq!(err.span.start.column, 7);
}
