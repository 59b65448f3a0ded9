//! Generated-input tests for the lexer and parser

use super::*;
use proptest::prelude::*;
use quickcheck::quickcheck;

/// Identifiers that can never collide with a keyword
fn identifier() -> impl Strategy<Value = String> {
    "[a-z]{1,6}_[a-z0-9]{0,4}"
}

fn bin_op() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("+"),
        Just("-"),
        Just("*"),
        Just("/"),
        Just("%"),
        Just("&&"),
        Just("||"),
    ]
}

proptest! {
    #[test]
    fn prop_binary_chains_parse(first in identifier(), rest in prop::collection::vec((bin_op(), identifier()), 0..8)) {
        let mut source = first;
        for (op, operand) in rest {
            source.push_str(&format!(" {} {}", op, operand));
        }
        let tokens = tokenize(&source).unwrap();
        prop_assert!(parse_expression(&tokens).is_ok(), "failed on {}", source);
    }

    #[test]
    fn prop_nested_parens(depth in 1usize..40) {
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        prop_assert!(parse_expression(&tokenize(&source).unwrap()).is_ok());
    }

    #[test]
    fn prop_unclosed_parens_fail(depth in 1usize..20) {
        let source = format!("{}1{}", "(".repeat(depth + 1), ")".repeat(depth));
        prop_assert!(parse_expression(&tokenize(&source).unwrap()).is_err());
    }
}

#[test]
fn quickcheck_integer_literals_parse() {
    fn property(n: u32) -> bool {
        match tokenize(&n.to_string()) {
            Ok(tokens) => parse_expression(&tokens).is_ok(),
            Err(_) => false,
        }
    }
    quickcheck(property as fn(u32) -> bool);
}

#[test]
fn quickcheck_arbitrary_text_is_rejected_cleanly() {
    fn property(text: String) -> bool {
        if let Ok(tokens) = tokenize(&text) {
            let _ = parse(&tokens);
        }
        true
    }
    quickcheck(property as fn(String) -> bool);
}
