//! Type checker tests

mod calls;
mod expressions;
mod matching;

use crate::frontend::lexer::tokenize;
use crate::frontend::parser::ast::Program;
use crate::frontend::parser::parse;
use crate::frontend::typecheck::{check, TypeError};
use crate::util::config::CompileConfig;

fn program(source: &str) -> Program {
    parse(&tokenize(source).unwrap()).unwrap()
}

/// Type-check `source` with the default configuration
fn check_source(source: &str) -> Result<(), TypeError> {
    let program = program(source);
    check(&program, &CompileConfig::default()).map(|_| ())
}

fn check_err(source: &str) -> TypeError {
    match check_source(source) {
        Ok(()) => panic!("expected a type error in:\n{}", source),
        Err(e) => e,
    }
}

fn check_ok(source: &str) {
    if let Err(e) = check_source(source) {
        panic!("unexpected type error: {} in:\n{}", e, source);
    }
}
