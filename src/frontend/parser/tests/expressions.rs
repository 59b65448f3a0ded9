//! Expression parsing tests

use super::*;

#[test]
fn test_precedence_mul_over_add() {
    match expr("1 + 2 * 3").kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            rhs,
            ..
        } => assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_left_associativity() {
    match expr("10 - 4 - 3").kind {
        ExprKind::Binary {
            op: BinaryOp::Sub,
            lhs,
            ..
        } => assert!(matches!(
            lhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Sub,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_logical_precedence() {
    match expr("a || b && c == d").kind {
        ExprKind::Binary {
            op: BinaryOp::Or,
            rhs,
            ..
        } => assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOp::And,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_await_binds_tighter_than_try() {
    match expr("await f()?").kind {
        ExprKind::Try(inner) => match inner.kind {
            ExprKind::Await(call) => assert!(matches!(call.kind, ExprKind::Call { .. })),
            other => panic!("expected await, got {:?}", other),
        },
        other => panic!("expected try, got {:?}", other),
    }
}

#[test]
fn test_negation_applies_after_try() {
    match expr("-x?").kind {
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => assert!(matches!(operand.kind, ExprKind::Try(_))),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_cast_binds_looser_than_unary() {
    match expr("-a as i64").kind {
        ExprKind::Cast { expr, ty } => {
            assert!(matches!(expr.kind, ExprKind::Unary { .. }));
            assert_eq!(ty.kind, TypeExprKind::Named("i64".to_string()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_postfix_chain() {
    match expr("a.b[0].c(1, 2)").kind {
        ExprKind::MethodCall {
            receiver,
            method,
            args,
        } => {
            assert_eq!(method, "c");
            assert_eq!(args.len(), 2);
            assert!(matches!(receiver.kind, ExprKind::Index { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_path_and_result_constructors() {
    assert!(matches!(
        expr("Color::Red").kind,
        ExprKind::Path { ref qualifier, ref name } if qualifier == "Color" && name == "Red"
    ));
    assert!(matches!(
        expr("Ok(1)").kind,
        ExprKind::ResultCtor { is_ok: true, .. }
    ));
    assert!(matches!(
        expr("Err(\"no\")").kind,
        ExprKind::ResultCtor { is_ok: false, .. }
    ));
}

#[test]
fn test_struct_literal() {
    match expr("Point { x: 1, y: 2 }").kind {
        ExprKind::StructLit { name, fields } => {
            assert_eq!(name, "Point");
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[1].name, "y");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lowercase_struct_literal() {
    assert!(matches!(
        expr("point { x: 1 }").kind,
        ExprKind::StructLit { .. }
    ));
}

#[test]
fn test_array_literal() {
    match expr("[1, 2, 3,]").kind {
        ExprKind::Array(elements) => assert_eq!(elements.len(), 3),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lambda_forms() {
    match expr("fn(x: i32) -> i32 => x + 1").kind {
        ExprKind::Lambda { params, body, .. } => {
            assert_eq!(params.len(), 1);
            assert!(matches!(body, LambdaBody::Expr(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
    match expr("fn() { print(\"hi\"); }").kind {
        ExprKind::Lambda {
            return_type, body, ..
        } => {
            assert!(return_type.is_none());
            assert!(matches!(body, LambdaBody::Block(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_interpolation() {
    match expr("\"x = {x + 1}!\"").kind {
        ExprKind::Interp(parts) => {
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], InterpPart::Text("x = ".to_string()));
            assert!(matches!(parts[1], InterpPart::Expr(_)));
            assert_eq!(parts[2], InterpPart::Text("!".to_string()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_match_expression() {
    let e = expr("match c { Color::Red => 1, Some(x) => { return x; } _ => 0 }");
    match e.kind {
        ExprKind::Match { arms, .. } => {
            assert_eq!(arms.len(), 3);
            assert!(matches!(arms[1].body.kind, ExprKind::Block(_)));
            assert_eq!(arms[2].pattern.kind, PatternKind::Wildcard);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_patterns() {
    let e = expr("match v { -1 => 0, \"s\" => 1, true => 2, Ok(Shape::Dot) => 3, n => 4 }");
    let ExprKind::Match { arms, .. } = e.kind else {
        panic!("expected match");
    };
    assert_eq!(arms[0].pattern.kind, PatternKind::Int(-1));
    assert_eq!(arms[1].pattern.kind, PatternKind::Str("s".to_string()));
    assert_eq!(arms[2].pattern.kind, PatternKind::Bool(true));
    match &arms[3].pattern.kind {
        PatternKind::Variant {
            name,
            payload: Some(inner),
            ..
        } => {
            assert_eq!(name, "Ok");
            assert!(matches!(
                inner.kind,
                PatternKind::Variant { qualifier: Some(_), .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(arms[4].pattern.kind, PatternKind::Binding("n".to_string()));
}

#[test]
fn test_node_ids_are_unique() {
    let e = expr("a + b * c");
    let mut ids = Vec::new();
    fn walk(
        e: &Expr,
        ids: &mut Vec<NodeId>,
    ) {
        ids.push(e.id);
        if let ExprKind::Binary { lhs, rhs, .. } = &e.kind {
            walk(lhs, ids);
            walk(rhs, ids);
        }
    }
    walk(&e, &mut ids);
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(ids.len(), deduped.len());
}

#[test]
fn test_missing_operand_reports_expectation() {
    let err = parse_expression(&tokenize("1 +").unwrap()).unwrap_err();
    assert_eq!(err.expected, "expression");
    assert_eq!(err.found, "end of input");
}
