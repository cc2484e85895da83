//! Error types for the core library.

use crate::engine::EngineInitError;
use crate::status::Errno;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`Node`](crate::node::Node) operations.
///
/// The set is deliberately closed: either the engine could not be built, or a
/// remote registration failed with a status that is not one of the benign
/// in-progress/already-connected codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport engine failed to initialize. No node exists.
    #[error("failed to construct transport engine: {0}")]
    Construction(#[from] EngineInitError),

    /// Registering one remote (or a batch) failed.
    #[error("failed to add remote: {code}")]
    RemoteConnect {
        /// Positive errno reported by the engine.
        code: Errno,
    },
}

impl Error {
    /// The errno carried by a registration failure, if any.
    pub fn code(&self) -> Option<Errno> {
        match self {
            Error::RemoteConnect { code } => Some(*code),
            Error::Construction(_) => None,
        }
    }
}
