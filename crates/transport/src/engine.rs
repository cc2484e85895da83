//! TCP transport engine.
//!
//! Owns a multi-threaded tokio runtime. Registration calls block the caller
//! on that runtime; batches fan out into one task per remote. A background
//! task re-validates the routing table every `check` seconds.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use corelib::{
    is_fatal, AddressFamily, EngineInitError, Errno, LogLevel, Logger, RemoteAddress, Status, Timeouts,
    TransportEngine,
};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::config::TcpEngineConfig;
use crate::routes::RoutingTable;

/// State shared between the blocking API and runtime tasks.
struct Shared {
    logger: Logger,
    routes: RoutingTable,
    timeouts: RwLock<Timeouts>,
    /// Wakes the check loop when timeouts change.
    wakeup: Notify,
}

impl Shared {
    async fn connect(self: Arc<Self>, remote: RemoteAddress) -> Status {
        let candidates = match resolve(&remote).await {
            Ok(candidates) => candidates,
            Err(code) => {
                self.logger.log(LogLevel::Error, &format!("{remote}: resolution failed: {code}"));
                return Status::from_errno(code);
            }
        };

        let wait = self.timeouts.read().wait;
        let mut last = Status::from_errno(Errno::ENXIO);
        for addr in candidates {
            if self.routes.contains(&addr) {
                return Status::from_errno(Errno::EISCONN);
            }
            match connect_with_deadline(addr, wait).await {
                Ok(stream) => {
                    if !self.routes.insert(addr, remote.clone(), stream) {
                        return Status::from_errno(Errno::EISCONN);
                    }
                    self.logger.log(LogLevel::Info, &format!("{remote}: connected to {addr}"));
                    return Status::OK;
                }
                Err(code) => {
                    self.logger.log(LogLevel::Notice, &format!("{remote}: {addr} failed: {code}"));
                    last = Status::from_errno(code);
                }
            }
        }
        last
    }

    async fn connect_all(self: Arc<Self>, remotes: Vec<RemoteAddress>) -> Status {
        let mut tasks = JoinSet::new();
        for remote in remotes {
            tasks.spawn(Arc::clone(&self).connect(remote));
        }

        let mut connected = false;
        let mut last_failure = None;
        while let Some(joined) = tasks.join_next().await {
            let status = joined.unwrap_or_else(|_| Status::from_errno(Errno::EIO));
            match status.errno() {
                Some(code) if is_fatal(code) => last_failure = Some(status),
                _ => connected = true,
            }
        }

        match last_failure {
            Some(status) if !connected => status,
            _ => Status::OK,
        }
    }

    async fn check_loop(self: Arc<Self>) {
        loop {
            let check = self.timeouts.read().check;
            if check <= 0 {
                self.wakeup.notified().await;
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(check as u64)) => {
                    Arc::clone(&self).check_routes().await;
                }
                _ = self.wakeup.notified() => {}
            }
        }
    }

    /// Drops dead connections and tries to bring them back.
    async fn check_routes(self: Arc<Self>) {
        let dead = self.routes.remove_dead().await;
        if dead.is_empty() {
            return;
        }
        self.logger.log(LogLevel::Notice, &format!("reconnecting {} dead routes", dead.len()));
        for remote in dead {
            let status = Arc::clone(&self).connect(remote.clone()).await;
            if let Some(code) = status.errno().filter(|code| is_fatal(*code)) {
                self.logger.log(LogLevel::Error, &format!("{remote}: dropped from routing table: {code}"));
            }
        }
    }
}

async fn resolve(remote: &RemoteAddress) -> Result<Vec<SocketAddr>, Errno> {
    let resolved = tokio::net::lookup_host((remote.host.as_str(), remote.port))
        .await
        .map_err(|_| Errno::ENXIO)?;
    let candidates: Vec<SocketAddr> = resolved
        .filter(|addr| match remote.family {
            AddressFamily::Unspecified => true,
            AddressFamily::Ipv4 => addr.is_ipv4(),
            AddressFamily::Ipv6 => addr.is_ipv6(),
        })
        .collect();

    if candidates.is_empty() {
        return Err(Errno::ENXIO);
    }
    Ok(candidates)
}

/// Connects to `addr`, giving up after `wait` seconds. Non-positive `wait`
/// means no deadline.
async fn connect_with_deadline(addr: SocketAddr, wait: i32) -> Result<TcpStream, Errno> {
    let attempt = TcpStream::connect(addr);
    if wait <= 0 {
        return attempt.await.map_err(|err| Errno::from_io(&err));
    }
    match tokio::time::timeout(Duration::from_secs(wait as u64), attempt).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(err)) => Err(Errno::from_io(&err)),
        Err(_) => Err(Errno::ETIMEDOUT),
    }
}

/// Transport engine that keeps plain TCP connections to storage servers.
///
/// Registration blocks the calling thread on the engine's own runtime, so it
/// must be called from synchronous code. Called from inside another tokio
/// runtime it does no work and reports `EDEADLK`.
pub struct TcpEngine {
    runtime: Option<Runtime>,
    shared: Arc<Shared>,
}

impl TcpEngine {
    /// Number of live routes.
    pub fn route_count(&self) -> usize {
        self.shared.routes.len()
    }

    /// Socket addresses currently routed.
    pub fn routed_addrs(&self) -> Vec<SocketAddr> {
        self.shared.routes.addrs()
    }

    pub fn timeouts(&self) -> Timeouts {
        *self.shared.timeouts.read()
    }

    fn block_on(&self, work: impl std::future::Future<Output = Status>) -> Status {
        let Some(runtime) = &self.runtime else {
            return Status::from_errno(Errno::ESHUTDOWN);
        };
        if Handle::try_current().is_ok() {
            self.shared
                .logger
                .log(LogLevel::Error, "registration called from inside an async runtime");
            return Status::from_errno(Errno::EDEADLK);
        }
        runtime.block_on(work)
    }
}

impl TransportEngine for TcpEngine {
    type Config = TcpEngineConfig;

    fn create(logger: Logger, config: Self::Config) -> Result<Self, EngineInitError> {
        if config.worker_threads == 0 {
            return Err(EngineInitError::Unavailable("worker_threads must be at least 1".to_string()));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()?;

        let shared = Arc::new(Shared {
            logger,
            routes: RoutingTable::new(),
            timeouts: RwLock::new(Timeouts::default()),
            wakeup: Notify::new(),
        });
        runtime.spawn(Arc::clone(&shared).check_loop());

        shared.logger.log(
            LogLevel::Info,
            &format!("tcp engine started with {} workers", config.worker_threads),
        );
        tracing::debug!(workers = config.worker_threads, thread_name = %config.thread_name, "tcp engine runtime built");

        Ok(Self {
            runtime: Some(runtime),
            shared,
        })
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) {
        *self.shared.timeouts.write() = timeouts;
        self.shared.wakeup.notify_one();
    }

    fn add_remote(&mut self, remote: &RemoteAddress) -> Status {
        self.block_on(Arc::clone(&self.shared).connect(remote.clone()))
    }

    fn add_remotes(&mut self, remotes: &[RemoteAddress]) -> Status {
        self.block_on(Arc::clone(&self.shared).connect_all(remotes.to_vec()))
    }

    fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        self.shared.routes.clear();
        self.shared.logger.log(LogLevel::Info, "tcp engine stopped");
    }
}
