//! Wavelet
//!
//! A small statically typed language compiled to a WebAssembly-style module:
//! structured stack code over one linear memory, talking to its host through
//! a fixed set of `env` imports. Async functions run as host-scheduled tasks
//! correlated by promise handles.
//!
//! # Example
//!
//! ```no_run
//! use wavelet::{run, Result};
//!
//! fn main() -> Result<()> {
//!     let execution = run(r#"
//!         fn add(a: i32, b: i32) -> i32 { return a + b; }
//!         fn main() -> i32 { return add(10, 20); }
//!     "#)?;
//!     println!("{:?}", execution.value);
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

pub mod frontend;
pub mod middle;
pub mod runtime;
pub mod util;
pub mod vm;

pub use anyhow::{Context, Result};
pub use frontend::Compiler;
pub use middle::codegen::Module;
pub use util::config::{CompileConfig, Config, RuntimeConfig};
pub use util::diagnostic::Diagnostic;
pub use vm::{Execution, Value, Vm};

use std::fs;
use std::path::Path;
use tracing::debug;

/// Language version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language name
pub const NAME: &str = "Wavelet";

/// Compile source text with the default configuration
pub fn compile(source: &str) -> std::result::Result<Module, Diagnostic> {
    Compiler::new().compile(source)
}

pub fn compile_with_config(
    source: &str,
    config: &CompileConfig,
) -> std::result::Result<Module, Diagnostic> {
    Compiler::with_config(config.clone()).compile(source)
}

/// Compile and execute source code on the reference runtime
pub fn run(source: &str) -> Result<Execution> {
    run_with_config(source, &Config::default())
}

pub fn run_with_config(
    source: &str,
    config: &Config,
) -> Result<Execution> {
    debug!("run called on {} bytes", source.len());
    let module = compile_with_config(source, &config.compile)?;
    let mut vm = Vm::with_config(module, config.runtime.clone())?;
    let execution = vm.run()?;
    debug!("run finished: {:?}", execution.value);
    Ok(execution)
}

/// Compile and execute a source file
pub fn run_file(path: &Path) -> Result<Execution> {
    debug!("running file {}", path.display());
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    run(&source).with_context(|| format!("Failed to run {}", path.display()))
}

/// Compile a source file and write the module as WebAssembly text
pub fn build_wat(
    source_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source: {}", source_path.display()))?;
    let module = compile(&source)?;
    fs::write(output_path, module.to_wat())
        .with_context(|| format!("Failed to write module: {}", output_path.display()))?;
    debug!("wrote {}", output_path.display());
    Ok(())
}
