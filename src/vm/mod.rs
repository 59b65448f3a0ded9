//! Reference runtime
//!
//! Interprets generated modules and plays the part of the host: it
//! implements the `env` imports, runs host I/O on a tokio runtime and
//! schedules async tasks cooperatively around promise handles.

mod errors;
mod executor;
mod frames;
pub mod host;
mod memory;
pub mod scheduler;
mod value;

#[cfg(test)]
mod tests;

pub use errors::{VmError, VmResult};
pub use executor::{Execution, Vm, VmStatus};
pub use host::{ExternFn, Host};
pub use memory::LinearMemory;
pub use value::Value;
