//! Wavelet configuration system
//!
//! Compiler and runtime knobs, loadable from TOML.
//!
//! ```toml
//! [compile]
//! data_base = 1024
//! strict_match = true
//!
//! [runtime]
//! max_call_depth = 512
//! ```
//!
//! # Usage
//!
//! ```rust
//! use wavelet::util::config::Config;
//!
//! let config = Config::from_toml_str("[compile]\nmemory_pages = 2\n").unwrap();
//! assert_eq!(config.compile.memory_pages, 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compiler settings
    #[serde(default)]
    pub compile: CompileConfig,
    /// Reference runtime settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::ParseError)
    }

    /// Render the configuration back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }
}

/// Code generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileConfig {
    /// First byte offset of the literal data region
    #[serde(default = "default_data_base")]
    pub data_base: u32,
    /// Initial linear memory size in 64 KiB pages
    #[serde(default = "default_memory_pages")]
    pub memory_pages: u32,
    /// Minimum capacity reserved for array literals
    #[serde(default = "default_array_capacity")]
    pub default_array_capacity: u32,
    /// Reject `match` expressions that miss a variant and have no catch-all
    #[serde(default = "default_true")]
    pub strict_match: bool,
    /// Export every function, not only `main` and `export fn`
    #[serde(default)]
    pub export_all: bool,
}

fn default_data_base() -> u32 {
    1024
}

fn default_memory_pages() -> u32 {
    1
}

fn default_array_capacity() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            data_base: default_data_base(),
            memory_pages: default_memory_pages(),
            default_array_capacity: default_array_capacity(),
            strict_match: true,
            export_all: false,
        }
    }
}

/// Reference host runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum depth of the interpreter call stack
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Upper bound on linear memory growth, in pages
    #[serde(default = "default_max_memory_pages")]
    pub max_memory_pages: u32,
    /// Instructions a task may execute before yielding to the scheduler
    #[serde(default)]
    pub fuel: Option<u64>,
    /// Keep `log` output in memory so callers can inspect it
    #[serde(default = "default_true")]
    pub capture_output: bool,
}

fn default_max_call_depth() -> usize {
    1024
}

fn default_max_memory_pages() -> u32 {
    256
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: default_max_call_depth(),
            max_memory_pages: default_max_memory_pages(),
            fuel: None,
            capture_output: true,
        }
    }
}

/// Load a configuration file; a missing file yields the defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    Config::from_toml_str(&content)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Config parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Config serialize error: {0}")]
    SerializeError(toml::ser::Error),
}
