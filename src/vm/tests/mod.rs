//! VM tests


use crate::frontend::Compiler;
use crate::middle::codegen::Module;
use crate::util::config::RuntimeConfig;
use crate::vm::{Execution, Value, Vm, VmError, VmResult};

fn compile(source: &str) -> Module {
    match Compiler::new().compile(source) {
        Ok(module) => module,
        Err(e) => panic!("compile failed: {} in:\n{}", e.message, source),
    }
}

fn run_with(
    source: &str,
    config: RuntimeConfig,
) -> VmResult<Execution> {
    Vm::with_config(compile(source), config)?.run()
}

fn run(source: &str) -> Execution {
    match run_with(source, RuntimeConfig::default()) {
        Ok(execution) => execution,
        Err(e) => panic!("run failed: {} in:\n{}", e, source),
    }
}

fn run_main(source: &str) -> Option<Value> {
    run(source).value
}

fn run_err(source: &str) -> VmError {
    match run_with(source, RuntimeConfig::default()) {
        Ok(execution) => panic!("expected a runtime error, got {:?}", execution.value),
        Err(e) => e,
    }
}
