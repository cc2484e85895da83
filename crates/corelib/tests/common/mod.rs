//! Recording transport engine used by the node tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use corelib::{EngineInitError, LogLevel, Logger, RemoteAddress, Status, Timeouts, TransportEngine};
use parking_lot::Mutex;

/// Shared view into everything a [`MockEngine`] was asked to do.
#[derive(Default)]
pub struct Recorder {
    pub fail_create: AtomicBool,
    pub created: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub drops: AtomicUsize,
    pub status: Mutex<Status>,
    pub timeouts: Mutex<Vec<Timeouts>>,
    pub remotes: Mutex<Vec<RemoteAddress>>,
    pub batches: Mutex<Vec<Vec<RemoteAddress>>>,
    pub logger: Mutex<Option<Logger>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Status the engine reports for every registration.
    pub fn respond_with(&self, status: Status) {
        *self.status.lock() = status;
    }

    pub fn last_timeouts(&self) -> Option<Timeouts> {
        self.timeouts.lock().last().copied()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

pub struct MockEngine {
    recorder: Arc<Recorder>,
    logger: Logger,
}

impl TransportEngine for MockEngine {
    type Config = Arc<Recorder>;

    fn create(logger: Logger, recorder: Self::Config) -> Result<Self, EngineInitError> {
        if recorder.fail_create.load(Ordering::SeqCst) {
            return Err(EngineInitError::Unavailable("mock refused".into()));
        }
        recorder.created.fetch_add(1, Ordering::SeqCst);
        logger.log(LogLevel::Info, "mock engine created");
        *recorder.logger.lock() = Some(logger.clone());
        Ok(Self { recorder, logger })
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.recorder.timeouts.lock().push(timeouts);
    }

    fn add_remote(&mut self, remote: &RemoteAddress) -> Status {
        self.recorder.remotes.lock().push(remote.clone());
        *self.recorder.status.lock()
    }

    fn add_remotes(&mut self, remotes: &[RemoteAddress]) -> Status {
        self.recorder.batches.lock().push(remotes.to_vec());
        *self.recorder.status.lock()
    }

    fn shutdown(&mut self) {
        self.logger.log(LogLevel::Info, "mock engine shut down");
        self.recorder.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.recorder.drops.fetch_add(1, Ordering::SeqCst);
    }
}
