//! Shared helpers for the end-to-end tests

use wavelet::{Execution, Value};

pub fn run(source: &str) -> Execution {
    match wavelet::run(source) {
        Ok(execution) => execution,
        Err(e) => panic!("run failed: {:#} in:\n{}", e, source),
    }
}

pub fn value(source: &str) -> Value {
    match run(source).value {
        Some(value) => value,
        None => panic!("main produced no value in:\n{}", source),
    }
}

pub fn i32_of(source: &str) -> i32 {
    match value(source) {
        Value::I32(v) => v,
        other => panic!("expected i32, got {:?}", other),
    }
}
