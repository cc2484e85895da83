//! Client node: the handle sessions use to reach a storage cluster.
//!
//! A node owns exactly one transport engine. It is responsible for the
//! connections to the server side: timeouts, maintenance and checking of
//! communication all happen inside that engine.

use tracing::{debug, info, warn};

use crate::address::RemoteAddress;
use crate::batch::{BatchLedger, RemoteBatch};
use crate::config::{NodeConfig, Timeouts};
use crate::engine::TransportEngine;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::status::Errno;

/// Connection handle to a storage cluster.
///
/// Built with [`Node::new`], configured with [`Node::set_timeouts`] and fed
/// remotes with [`Node::add_remote`] / [`Node::add_remotes`]. Registration
/// calls take `&mut self`: a node is driven from one place at a time.
///
/// The engine is released exactly once, by [`Node::dispose`] or when the node
/// is dropped. Sessions built on a node should borrow it so it cannot be
/// disposed underneath them.
pub struct Node<E: TransportEngine> {
    logger: Logger,
    engine: E,
    timeouts: Timeouts,
    ledger: BatchLedger,
}

impl<E: TransportEngine> Node<E> {
    /// Creates a node with the engine's default configuration.
    pub fn new(logger: &Logger) -> Result<Self>
    where
        E::Config: Default,
    {
        Self::with_engine_config(logger, E::Config::default())
    }

    /// Creates a node, building its engine from `config`.
    ///
    /// The engine starts with the default timeouts (5s wait, 60s check).
    pub fn with_engine_config(logger: &Logger, config: E::Config) -> Result<Self> {
        let mut engine = E::create(logger.clone(), config).map_err(|err| {
            warn!(error = %err, "transport engine construction failed");
            Error::Construction(err)
        })?;

        let timeouts = Timeouts::default();
        engine.set_timeouts(timeouts);
        info!(wait = timeouts.wait, check = timeouts.check, "node created");

        Ok(Self {
            logger: logger.clone(),
            engine,
            timeouts,
            ledger: BatchLedger::default(),
        })
    }

    /// Creates a node, applies the configured timeouts and registers the
    /// configured remotes as one batch.
    ///
    /// The node and its engine log through `logger`'s sink at the configured
    /// `log_level`, not at `logger`'s own threshold.
    pub fn from_config(logger: &Logger, config: &NodeConfig, engine_config: E::Config) -> Result<Self> {
        let logger = logger.with_level(config.log_level);
        let mut node = Self::with_engine_config(&logger, engine_config)?;
        node.set_timeouts(config.wait_timeout, config.check_timeout);
        if !config.remotes.is_empty() {
            node.add_remotes(&config.remotes)?;
        }
        Ok(node)
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Timeouts last handed to the engine.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Transient buffer accounting for batch registrations.
    pub fn batch_ledger(&self) -> &BatchLedger {
        &self.ledger
    }

    /// Overrides the default timeouts.
    ///
    /// `wait_timeout` applies to every transaction sent to the cluster.
    /// `check_timeout` is the interval for refreshing the routing table and
    /// checking connections. Both are in seconds and are not validated.
    pub fn set_timeouts(&mut self, wait_timeout: i32, check_timeout: i32) {
        let timeouts = Timeouts::new(wait_timeout, check_timeout);
        self.engine.set_timeouts(timeouts);
        self.timeouts = timeouts;
        debug!(wait = wait_timeout, check = check_timeout, "timeouts updated");
    }

    /// Adds a connection to one storage server.
    ///
    /// The address is `Host:Port:Family`; family may be omitted, otherwise it
    /// is 2 (IPv4) or 10 (IPv6).
    pub fn add_remote(&mut self, addr: &str) -> Result<()> {
        let remote = addr.parse::<RemoteAddress>().map_err(|err| {
            warn!(addr, error = %err, "rejected remote address");
            Error::RemoteConnect { code: Errno::EINVAL }
        })?;

        let result = self.engine.add_remote(&remote).into_result();
        match &result {
            Ok(()) => debug!(%remote, "remote added"),
            Err(err) => warn!(%remote, error = %err, "remote not added"),
        }
        result
    }

    /// Adds connections to several storage servers at once.
    ///
    /// The engine connects to all of them in parallel and reports a single
    /// status for the set; which individual remotes succeeded is not known.
    /// An empty slice is handed to the engine unchanged.
    pub fn add_remotes<S: AsRef<str>>(&mut self, addrs: &[S]) -> Result<()> {
        let batch = RemoteBatch::marshal(addrs, &self.ledger).map_err(|(index, err)| {
            warn!(index, addr = addrs[index].as_ref(), error = %err, "rejected remote address in batch");
            Error::RemoteConnect { code: Errno::EINVAL }
        })?;

        let result = self.engine.add_remotes(&batch).into_result();
        match &result {
            Ok(()) => debug!(count = batch.len(), "remotes added"),
            Err(err) => warn!(count = batch.len(), error = %err, "remotes not added"),
        }
        result
    }

    /// Releases the engine. Do not dispose a node that a session still uses.
    pub fn dispose(self) {
        drop(self);
    }
}

impl<E: TransportEngine> Drop for Node<E> {
    fn drop(&mut self) {
        self.engine.shutdown();
        info!("node disposed");
    }
}

impl<E: TransportEngine> std::fmt::Debug for Node<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("logger", &self.logger)
            .field("timeouts", &self.timeouts)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
