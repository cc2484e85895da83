//! TCP transport engine for storage cluster nodes.
//!
//! This crate provides a [`corelib::TransportEngine`] implementation that:
//! - Resolves and connects remotes over TCP, honouring the wait timeout
//! - Connects batches concurrently on its own runtime
//! - Keeps a routing table of live connections
//! - Re-validates that table every check interval

pub mod config;
pub mod engine;
pub mod routes;

pub use config::TcpEngineConfig;
pub use engine::TcpEngine;
pub use routes::RoutingTable;
