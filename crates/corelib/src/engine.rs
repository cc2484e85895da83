//! Transport engine abstraction.
//!
//! The engine performs the socket I/O, connection retries and routing-table
//! maintenance. A [`Node`](crate::node::Node) owns exactly one engine and is
//! the only thing that talks to it.

use crate::address::RemoteAddress;
use crate::config::Timeouts;
use crate::logger::Logger;
use crate::status::Status;

/// Reasons an engine could not be created.
#[derive(Debug, thiserror::Error)]
pub enum EngineInitError {
    /// Worker threads, pollers or memory could not be obtained.
    #[error("engine resources unavailable: {0}")]
    Unavailable(String),
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A networking engine driven by a node.
///
/// Registration methods block until the engine has a status for the request.
/// Negative statuses are `-errno`; the node decides which of them are errors.
pub trait TransportEngine: Send + 'static {
    /// Engine specific construction parameters.
    type Config;

    /// Builds an engine that emits its log records through `logger`.
    fn create(logger: Logger, config: Self::Config) -> Result<Self, EngineInitError>
    where
        Self: Sized;

    /// Applies new timeouts to all subsequent transactions.
    fn set_timeouts(&mut self, timeouts: Timeouts);

    /// Connects to a single remote.
    fn add_remote(&mut self, remote: &RemoteAddress) -> Status;

    /// Connects to all `remotes` concurrently and returns one status for the
    /// whole set.
    fn add_remotes(&mut self, remotes: &[RemoteAddress]) -> Status;

    /// Releases everything the engine holds. Called exactly once, right before
    /// the engine is dropped.
    fn shutdown(&mut self);
}
