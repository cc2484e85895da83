//! Core library for storage cluster client nodes.
//!
//! This crate provides the node a session layer talks to the cluster through:
//! - Node lifecycle over an owned transport engine
//! - Timeout configuration
//! - Single and batch (parallel) remote registration
//! - `Host:Port[:Family]` address parsing
//! - Classification of engine status codes

pub mod address;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod node;
pub mod status;

pub use address::{AddressError, AddressFamily, RemoteAddress};
pub use batch::{BatchLedger, RemoteBatch};
pub use config::{ConfigError, NodeConfig, Timeouts};
pub use engine::{EngineInitError, TransportEngine};
pub use error::{Error, Result};
pub use logger::{LogLevel, LogSink, Logger, TracingSink};
pub use node::Node;
pub use status::{is_fatal, Errno, Status};
