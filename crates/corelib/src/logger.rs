//! Logger handle shared between the caller, the node and its engine.
//!
//! The node never owns the sink: it keeps a clone of the handle so the engine
//! can emit records through it, and the caller decides what the sink does.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Verbosity of a log record. Lower values are more important.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Data = 0,
    Error = 1,
    #[default]
    Info = 2,
    Notice = 3,
    Debug = 4,
}

impl LogLevel {
    /// Numeric level as used in sink configuration.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(level: i32) -> Option<Self> {
        match level {
            0 => Some(LogLevel::Data),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Notice),
            4 => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Sink that forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Data | LogLevel::Error => tracing::error!(target: "storage_node", "{message}"),
            LogLevel::Info => tracing::info!(target: "storage_node", "{message}"),
            LogLevel::Notice => tracing::debug!(target: "storage_node", "{message}"),
            LogLevel::Debug => tracing::trace!(target: "storage_node", "{message}"),
        }
    }
}

/// Cheaply cloneable handle to a [`LogSink`] with a level threshold.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    level: LogLevel,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, level: LogLevel) -> Self {
        Self { sink, level }
    }

    /// Logger that bridges into `tracing`.
    pub fn tracing(level: LogLevel) -> Self {
        Self::new(Arc::new(TracingSink), level)
    }

    /// Current threshold.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Handle on the same sink with a different threshold.
    pub fn with_level(&self, level: LogLevel) -> Logger {
        Self::new(Arc::clone(&self.sink), level)
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    /// Emits `message` if `level` passes the threshold.
    pub fn log(&self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            self.sink.log(level, message);
        }
    }

    /// Returns true if both handles point at the same sink.
    pub fn same_sink(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(LogLevel, String)>>);

    impl LogSink for Capture {
        fn log(&self, level: LogLevel, message: &str) {
            self.0.lock().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_threshold_filters_records() {
        let sink = Arc::new(Capture::default());
        let logger = Logger::new(sink.clone(), LogLevel::Info);

        logger.log(LogLevel::Error, "kept");
        logger.log(LogLevel::Info, "kept too");
        logger.log(LogLevel::Debug, "dropped");

        let records = sink.0.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (LogLevel::Error, "kept".to_string()));
    }

    #[test]
    fn test_clones_share_sink() {
        let logger = Logger::tracing(LogLevel::Debug);
        let clone = logger.clone();
        assert!(logger.same_sink(&clone));
        assert!(!logger.same_sink(&Logger::tracing(LogLevel::Debug)));
        assert_eq!(clone.level(), LogLevel::Debug);
    }

    #[test]
    fn test_with_level_keeps_sink() {
        let sink = Arc::new(Capture::default());
        let verbose = Logger::new(sink.clone(), LogLevel::Debug);
        let quiet = verbose.with_level(LogLevel::Error);

        assert!(quiet.same_sink(&verbose));
        assert_eq!(quiet.level(), LogLevel::Error);
        assert_eq!(verbose.level(), LogLevel::Debug);

        quiet.log(LogLevel::Info, "dropped");
        quiet.log(LogLevel::Error, "kept");
        assert_eq!(*sink.0.lock(), vec![(LogLevel::Error, "kept".to_string())]);
    }

    #[test]
    fn test_level_numbers() {
        assert_eq!(LogLevel::Debug.as_i32(), 4);
        assert_eq!(LogLevel::from_i32(1), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_i32(9), None);
    }
}
