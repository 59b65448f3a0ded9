//! Middle end: lowering checked programs to modules

pub mod codegen;

pub use codegen::{generate, CodegenError, EntryInfo, Module};
