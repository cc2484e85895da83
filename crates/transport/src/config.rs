//! TCP engine configuration.

use serde::{Deserialize, Serialize};

/// Construction parameters for [`TcpEngine`](crate::TcpEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpEngineConfig {
    /// Runtime worker threads. Must be at least 1.
    pub worker_threads: usize,
    /// Name given to the runtime's worker threads.
    pub thread_name: String,
}

impl Default for TcpEngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "storage-node-io".to_string(),
        }
    }
}
