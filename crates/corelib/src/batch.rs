//! Scoped marshaling of remote batches.
//!
//! A batch registration converts every address string into its own transient
//! buffer before the engine sees the set. [`RemoteBatch`] owns those buffers
//! and releases all of them when it goes out of scope, whichever way the call
//! exits. [`BatchLedger`] counts both sides so leaks are observable.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::address::{AddressError, RemoteAddress};

/// Running totals of batch buffers acquired and released by a node.
#[derive(Debug, Default)]
pub struct BatchLedger {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl BatchLedger {
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Buffers acquired but not yet released.
    pub fn outstanding(&self) -> u64 {
        self.acquired() - self.released()
    }
}

/// Addresses parsed for one batch registration, released on drop.
#[derive(Debug)]
pub struct RemoteBatch<'a> {
    remotes: Vec<RemoteAddress>,
    ledger: &'a BatchLedger,
}

impl<'a> RemoteBatch<'a> {
    /// Parses `addrs` in order, one buffer per address.
    ///
    /// Stops at the first invalid address and returns its index; buffers
    /// already acquired are released before returning.
    pub fn marshal<S: AsRef<str>>(
        addrs: &[S],
        ledger: &'a BatchLedger,
    ) -> Result<Self, (usize, AddressError)> {
        let mut batch = RemoteBatch {
            remotes: Vec::with_capacity(addrs.len()),
            ledger,
        };
        for (index, addr) in addrs.iter().enumerate() {
            let remote = addr.as_ref().parse::<RemoteAddress>().map_err(|err| (index, err))?;
            batch.push(remote);
        }
        Ok(batch)
    }

    fn push(&mut self, remote: RemoteAddress) {
        self.ledger.acquired.fetch_add(1, Ordering::Relaxed);
        self.remotes.push(remote);
    }

    pub fn as_slice(&self) -> &[RemoteAddress] {
        &self.remotes
    }
}

impl Deref for RemoteBatch<'_> {
    type Target = [RemoteAddress];

    fn deref(&self) -> &Self::Target {
        &self.remotes
    }
}

impl Drop for RemoteBatch<'_> {
    fn drop(&mut self) {
        let count = self.remotes.len() as u64;
        self.remotes.clear();
        self.ledger.released.fetch_add(count, Ordering::Relaxed);
    }
}
