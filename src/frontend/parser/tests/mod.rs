//! Parser tests module

mod expressions;
mod fuzz;
mod items;

use crate::frontend::lexer::tokenize;
use crate::frontend::parser::ast::*;
use crate::frontend::parser::{parse, parse_expression, ParseError};

fn expr(source: &str) -> Expr {
    parse_expression(&tokenize(source).unwrap()).unwrap()
}

fn program(source: &str) -> Program {
    parse(&tokenize(source).unwrap()).unwrap()
}

fn parse_err(source: &str) -> ParseError {
    parse(&tokenize(source).unwrap()).unwrap_err()
}

/// Statements of the single function in `source`
fn body(source: &str) -> Vec<Stmt> {
    match program(source).items.into_iter().next() {
        Some(Item::Function(f)) => f.body.unwrap().stmts,
        other => panic!("expected function, got {:?}", other),
    }
}
