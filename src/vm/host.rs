//! Host capabilities
//!
//! [`Host`] holds what the embedding application supplies: `extern fn`
//! implementations and the log sink. The asynchronous capabilities
//! (network, files, timers) run as futures on the scheduler's runtime and
//! report back an [`IoOutcome`].

use super::errors::{VmError, VmResult};
use super::value::Value;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Implementation of a source-level `extern fn`
pub type ExternFn = Box<dyn FnMut(&[Value]) -> Result<Option<Value>, String>>;

/// Host functions and output of one VM instance
pub struct Host {
    externs: HashMap<String, ExternFn>,
    output: Arc<Mutex<Vec<String>>>,
    capture: bool,
}

impl fmt::Debug for Host {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Host")
            .field("externs", &self.externs.keys().collect::<Vec<_>>())
            .field("capture", &self.capture)
            .finish()
    }
}

impl Host {
    pub fn new(capture_output: bool) -> Self {
        Self {
            externs: HashMap::new(),
            output: Arc::new(Mutex::new(Vec::new())),
            capture: capture_output,
        }
    }

    /// Provide the implementation of `extern fn name`
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        function: F,
    ) where
        F: FnMut(&[Value]) -> Result<Option<Value>, String> + 'static,
    {
        self.externs.insert(name.into(), Box::new(function));
    }

    pub fn has_extern(
        &self,
        name: &str,
    ) -> bool {
        self.externs.contains_key(name)
    }

    pub(crate) fn call_extern(
        &mut self,
        name: &str,
        args: &[Value],
    ) -> VmResult<Option<Value>> {
        let function = self
            .externs
            .get_mut(name)
            .ok_or_else(|| VmError::Link(name.to_string()))?;
        function(args).map_err(|message| VmError::Host {
            name: name.to_string(),
            message,
        })
    }

    /// One line written by the program
    pub fn log(
        &self,
        line: String,
    ) {
        debug!("log: {}", line);
        if self.capture {
            self.output.lock().push(line);
        } else {
            println!("{}", line);
        }
    }

    /// Shared handle to the captured output
    pub fn output(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.output)
    }

    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }
}

/// Asynchronous work requested by the program
#[derive(Debug, Clone, PartialEq)]
pub enum IoRequest {
    Sleep(Instant),
    HttpGet { url: String },
    HttpPost { url: String, body: Vec<u8> },
    ReadFile { path: String },
    WriteFile { path: String, data: Vec<u8> },
}

/// Result of an [`IoRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum IoOutcome {
    /// Timer fired
    Unit,
    /// `Result<string, string>`
    Text(Result<Vec<u8>, String>),
    /// `Result<i32, string>`
    Count(Result<i32, String>),
}

/// Per-request limit on host HTTP exchanges
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client used for every request of one VM
pub(crate) fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .no_proxy()
        .user_agent(concat!("wavelet/", env!("CARGO_PKG_VERSION")))
        .build()
}

pub(crate) async fn perform(
    client: Client,
    request: IoRequest,
) -> IoOutcome {
    match request {
        IoRequest::Sleep(deadline) => {
            tokio::time::sleep_until(deadline).await;
            IoOutcome::Unit
        }
        IoRequest::HttpGet { url } => {
            info!("GET {}", url);
            IoOutcome::Text(fetch(client.get(&url), &url).await)
        }
        IoRequest::HttpPost { url, body } => {
            info!("POST {}", url);
            IoOutcome::Text(fetch(client.post(&url).body(body), &url).await)
        }
        IoRequest::ReadFile { path } => IoOutcome::Text(
            tokio::fs::read(&path)
                .await
                .map_err(|e| format!("{}: {}", path, e)),
        ),
        IoRequest::WriteFile { path, data } => IoOutcome::Count(
            tokio::fs::write(&path, &data)
                .await
                .map(|()| data.len() as i32)
                .map_err(|e| format!("{}: {}", path, e)),
        ),
    }
}

/// Send `request`. A 2xx status yields the body, anything else an error.
async fn fetch(
    request: RequestBuilder,
    url: &str,
) -> Result<Vec<u8>, String> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("{}: {}", url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| format!("{}: {}", url, e))?;
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        assert!(http_client().is_ok());
    }

    #[test]
    fn test_extern_registration() {
        let mut host = Host::new(true);
        host.register("twice", |args: &[Value]| {
            let v = args[0].as_i32().map_err(|e| e.to_string())?;
            Ok(Some(Value::I32(v * 2)))
        });
        assert!(host.has_extern("twice"));
        assert_eq!(
            host.call_extern("twice", &[Value::I32(21)]).unwrap(),
            Some(Value::I32(42))
        );
        assert!(matches!(
            host.call_extern("missing", &[]),
            Err(VmError::Link(_))
        ));
    }

    #[test]
    fn test_captured_log() {
        let host = Host::new(true);
        host.log("one".to_string());
        host.log("two".to_string());
        assert_eq!(host.output().lock().len(), 2);
        assert_eq!(host.take_output(), vec!["one", "two"]);
        assert!(host.take_output().is_empty());
    }
}
