//! VM errors

use crate::middle::codegen::ValType;
use crate::runtime::promise::{PromiseError, PromiseHandle};
use thiserror::Error;

/// VM result
pub type VmResult<T> = Result<T, VmError>;

/// VM errors
#[derive(Debug, Error)]
pub enum VmError {
    /// `unreachable`, division by zero and other traps raised by code
    #[error("trap in {function}: {reason}")]
    Trap { function: String, reason: String },

    #[error("call stack overflow (depth {0})")]
    StackOverflow(usize),

    #[error("value stack underflow")]
    StackUnderflow,

    #[error("expected {expected} but found {found}")]
    TypeMismatch { expected: ValType, found: ValType },

    #[error("memory access out of bounds: {len} bytes at {addr:#x}")]
    MemoryOutOfBounds { addr: u64, len: u32 },

    #[error("out of memory: cannot grow beyond {max_pages} pages")]
    OutOfMemory { max_pages: u32 },

    #[error("unknown function index {0}")]
    UnknownFunction(u32),

    #[error("table slot {0} is out of bounds")]
    TableOutOfBounds(i32),

    #[error("indirect call signature mismatch for function {0}")]
    IndirectTypeMismatch(u32),

    #[error("no exported function '{0}'")]
    UnknownExport(String),

    #[error("unresolved import env.{0}")]
    Link(String),

    #[error("host function {name} failed: {message}")]
    Host { name: String, message: String },

    #[error(transparent)]
    Promise(#[from] PromiseError),

    #[error("awaited {0} was rejected")]
    Rejected(PromiseHandle),

    #[error("deadlock: {0} task(s) waiting with no host work pending")]
    Deadlock(usize),

    #[error("malformed module: {0}")]
    Malformed(String),

    #[error("runtime setup failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl VmError {
    pub(crate) fn trap(
        function: &str,
        reason: impl Into<String>,
    ) -> Self {
        VmError::Trap {
            function: function.to_string(),
            reason: reason.into(),
        }
    }
}
