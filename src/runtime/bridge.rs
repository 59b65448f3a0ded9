//! Host import contract
//!
//! The fixed set of functions every generated module imports from the host,
//! in import-index order. Source-level `extern fn` declarations are appended
//! after these.
//!
//! Asynchronous operations return a promise handle (`i32`) at once. The
//! host settles the promise later with an `i64` payload: a pointer to a
//! `Result<string, string>` (or `Result<i32, string>`) object for I/O, `0`
//! for timers. `promise_await` is the only suspension point.

use crate::middle::codegen::{FuncType, Import, ValType};
use once_cell::sync::Lazy;

/// Module name under which host functions are imported
pub const HOST_MODULE: &str = "env";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostImport {
    /// `log(ptr, len)`: write one line of output
    Log,
    /// `alloc(size) -> ptr`: heap allocation, 8-byte aligned
    Alloc,
    /// `http_get(url_ptr, url_len) -> handle`
    HttpGet,
    /// `http_post(url_ptr, url_len, body_ptr, body_len) -> handle`
    HttpPost,
    /// `file_read(path_ptr, path_len) -> handle`
    FileRead,
    /// `file_write(path_ptr, path_len, data_ptr, data_len) -> handle`
    FileWrite,
    /// `timer_schedule(ms) -> handle`
    TimerSchedule,
    /// `task_spawn(table_index, env) -> handle`: run `table[table_index]`
    /// as `(handle, env)` in a new task
    TaskSpawn,
    /// `promise_resolve(handle, value)`
    PromiseResolve,
    /// `promise_reject(handle, value)`
    PromiseReject,
    /// `promise_await(handle) -> value`: suspends the calling task until
    /// the promise settles
    PromiseAwait,
    /// `fmt_i64(value) -> string`
    FmtI64,
    /// `fmt_u64(value) -> string`
    FmtU64,
    /// `fmt_f64(value) -> string`
    FmtF64,
}

impl HostImport {
    pub const ALL: [HostImport; 14] = [
        HostImport::Log,
        HostImport::Alloc,
        HostImport::HttpGet,
        HostImport::HttpPost,
        HostImport::FileRead,
        HostImport::FileWrite,
        HostImport::TimerSchedule,
        HostImport::TaskSpawn,
        HostImport::PromiseResolve,
        HostImport::PromiseReject,
        HostImport::PromiseAwait,
        HostImport::FmtI64,
        HostImport::FmtU64,
        HostImport::FmtF64,
    ];

    /// Import index in every generated module
    pub fn index(self) -> u32 {
        Self::ALL.iter().position(|i| *i == self).unwrap_or(0) as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            HostImport::Log => "log",
            HostImport::Alloc => "alloc",
            HostImport::HttpGet => "http_get",
            HostImport::HttpPost => "http_post",
            HostImport::FileRead => "file_read",
            HostImport::FileWrite => "file_write",
            HostImport::TimerSchedule => "timer_schedule",
            HostImport::TaskSpawn => "task_spawn",
            HostImport::PromiseResolve => "promise_resolve",
            HostImport::PromiseReject => "promise_reject",
            HostImport::PromiseAwait => "promise_await",
            HostImport::FmtI64 => "fmt_i64",
            HostImport::FmtU64 => "fmt_u64",
            HostImport::FmtF64 => "fmt_f64",
        }
    }

    pub fn func_type(self) -> FuncType {
        use ValType::*;
        let (params, result) = match self {
            HostImport::Log => (vec![I32, I32], None),
            HostImport::Alloc => (vec![I32], Some(I32)),
            HostImport::HttpGet | HostImport::FileRead => (vec![I32, I32], Some(I32)),
            HostImport::HttpPost | HostImport::FileWrite => {
                (vec![I32, I32, I32, I32], Some(I32))
            }
            HostImport::TimerSchedule => (vec![I32], Some(I32)),
            HostImport::TaskSpawn => (vec![I32, I32], Some(I32)),
            HostImport::PromiseResolve | HostImport::PromiseReject => (vec![I32, I64], None),
            HostImport::PromiseAwait => (vec![I32], Some(I64)),
            HostImport::FmtI64 | HostImport::FmtU64 => (vec![I64], Some(I32)),
            HostImport::FmtF64 => (vec![F64], Some(I32)),
        };
        FuncType::new(params, result)
    }

    /// Whether the import starts asynchronous host work
    pub fn is_async(self) -> bool {
        matches!(
            self,
            HostImport::HttpGet
                | HostImport::HttpPost
                | HostImport::FileRead
                | HostImport::FileWrite
                | HostImport::TimerSchedule
        )
    }
}

/// The fixed imports as module declarations
pub static HOST_IMPORTS: Lazy<Vec<Import>> = Lazy::new(|| {
    HostImport::ALL
        .iter()
        .map(|i| Import {
            module: HOST_MODULE.to_string(),
            name: i.name().to_string(),
            ty: i.func_type(),
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_order_is_stable() {
        assert_eq!(HostImport::Log.index(), 0);
        assert_eq!(HostImport::Alloc.index(), 1);
        assert_eq!(HostImport::FmtF64.index(), 13);
        for (i, import) in HostImport::ALL.iter().enumerate() {
            assert_eq!(HostImport::from_index(i as u32), Some(*import));
            assert_eq!(HOST_IMPORTS[i].name, import.name());
        }
        assert_eq!(HostImport::from_index(14), None);
    }

    #[test]
    fn test_await_returns_i64() {
        let ty = HostImport::PromiseAwait.func_type();
        assert_eq!(ty.params, vec![ValType::I32]);
        assert_eq!(ty.results, vec![ValType::I64]);
    }

    #[test]
    fn test_async_imports() {
        let spawning: Vec<&str> = HostImport::ALL
            .iter()
            .filter(|i| i.is_async())
            .map(|i| i.name())
            .collect();
        assert_eq!(
            spawning,
            vec!["http_get", "http_post", "file_read", "file_write", "timer_schedule"]
        );
    }
}
