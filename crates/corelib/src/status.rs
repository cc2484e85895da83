//! Engine status codes and the benign-code filter.
//!
//! Engines report the outcome of a registration as a signed integer: zero or
//! positive on success, `-errno` on failure. Connection setup is asynchronous
//! inside the engine, so a handful of negative codes mean "still connecting" or
//! "already there" and must not be surfaced as errors.

use std::fmt;

use crate::error::{Error, Result};

/// Platform error number, always stored as a positive value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Errno(pub i32);

impl Errno {
    pub const EINPROGRESS: Errno = Errno(libc::EINPROGRESS);
    pub const EAGAIN: Errno = Errno(libc::EAGAIN);
    pub const EALREADY: Errno = Errno(libc::EALREADY);
    pub const EISCONN: Errno = Errno(libc::EISCONN);
    pub const EINVAL: Errno = Errno(libc::EINVAL);
    pub const ENXIO: Errno = Errno(libc::ENXIO);
    pub const EIO: Errno = Errno(libc::EIO);
    pub const ETIMEDOUT: Errno = Errno(libc::ETIMEDOUT);
    pub const ECONNREFUSED: Errno = Errno(libc::ECONNREFUSED);
    pub const ESHUTDOWN: Errno = Errno(libc::ESHUTDOWN);
    pub const EDEADLK: Errno = Errno(libc::EDEADLK);

    /// Raw errno value.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Converts an I/O error into its errno, falling back to `EIO` when the
    /// error did not originate from the OS.
    pub fn from_io(err: &std::io::Error) -> Self {
        Errno(err.raw_os_error().unwrap_or(libc::EIO))
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", std::io::Error::from_raw_os_error(self.0))
    }
}

/// Codes that indicate a connection in progress or already established.
pub const BENIGN_CODES: [Errno; 4] = [
    Errno::EINPROGRESS,
    Errno::EAGAIN,
    Errno::EALREADY,
    Errno::EISCONN,
];

/// Returns `true` unless `code` is one of the [`BENIGN_CODES`].
pub fn is_fatal(code: Errno) -> bool {
    !BENIGN_CODES.contains(&code)
}

/// Raw status returned by a transport engine.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);

    /// Failure status for the given errno (`-errno`).
    ///
    /// An errno with no negation maps to `-EIO`.
    pub fn from_errno(code: Errno) -> Self {
        Status(code.0.checked_neg().unwrap_or(-libc::EIO))
    }

    /// The positive errno if this status is negative.
    ///
    /// `i32::MIN` has no positive counterpart and reads as `EIO`.
    pub fn errno(self) -> Option<Errno> {
        (self.0 < 0).then(|| self.0.checked_neg().map_or(Errno::EIO, Errno))
    }

    /// Maps the status to a `Result`, absorbing benign codes.
    pub fn into_result(self) -> Result<()> {
        match self.errno() {
            Some(code) if is_fatal(code) => Err(Error::RemoteConnect { code }),
            Some(code) => {
                tracing::debug!(%code, "absorbed benign engine status");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
