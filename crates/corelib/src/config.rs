//! Node configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logger::LogLevel;

/// Default per-transaction wait timeout, in seconds.
pub const DEFAULT_WAIT_TIMEOUT: i32 = 5;

/// Default routing-table refresh interval, in seconds.
pub const DEFAULT_CHECK_TIMEOUT: i32 = 60;

/// Timeouts applied to the engine, in seconds.
///
/// Values are handed to the engine as-is; zero and negative values are the
/// caller's business.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Timeouts {
    /// How long a single transaction may stay pending.
    pub wait: i32,
    /// How often connections are re-validated and the routing table refreshed.
    pub check: i32,
}

impl Timeouts {
    pub fn new(wait: i32, check: i32) -> Self {
        Self { wait, check }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT, DEFAULT_CHECK_TIMEOUT)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for building a node from a file.
///
/// ```json
/// { "wait_timeout": 5, "check_timeout": 60, "log_level": "info",
///   "remotes": ["storage01:1025:2", "storage02:1025"] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub wait_timeout: i32,
    pub check_timeout: i32,
    pub log_level: LogLevel,
    /// Remotes registered as one batch when the node is built.
    pub remotes: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            log_level: LogLevel::default(),
            remotes: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::new(self.wait_timeout, self.check_timeout)
    }
}
