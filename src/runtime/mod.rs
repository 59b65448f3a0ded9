//! Async/promise bridge
//!
//! The contract between generated code and its host: the fixed import
//! surface ([`bridge`]) and the promise state machine ([`promise`]) that
//! correlates suspended tasks with the host work they wait on.

pub mod bridge;
pub mod promise;

pub use bridge::{HostImport, HOST_IMPORTS, HOST_MODULE};
pub use promise::{PromiseError, PromiseHandle, PromiseRegistry, PromiseState};
