//! Logging setup
//! Records go to stderr and are mirrored to the application as `log-message`
//! events so the control panel can show them.

use std::sync::{Arc, OnceLock};

use chrono::Local;
use log::{Level, Metadata, Record, SetLoggerError};
use serde::Serialize;

use crate::emitter::EventEmitter;

/// Event name used for forwarded log records
pub const EVENT_LOG_MESSAGE: &str = "log-message";

static LOGGER: OnceLock<EventLogger> = OnceLock::new();

#[derive(Debug, Serialize, Clone)]
pub struct LogMessage {
    pub level: String,
    pub message: String,
    pub timestamp: String,
}

pub struct EventLogger {
    emitter: Arc<dyn EventEmitter>,
    level: Level,
}

impl EventLogger {
    pub fn new(emitter: Arc<dyn EventEmitter>, level: Level) -> Self {
        Self { emitter, level }
    }

    /// Installs the logger process-wide. Fails if another logger is already set.
    pub fn init(emitter: Arc<dyn EventEmitter>, level: Level) -> Result<(), SetLoggerError> {
        let logger = LOGGER.get_or_init(|| EventLogger::new(emitter, level));
        log::set_logger(logger).map(|()| log::set_max_level(level.to_level_filter()))
    }

    fn emit_log(&self, record: &Record) {
        let log_message = LogMessage {
            level: record.level().to_string(),
            message: record.args().to_string(),
            timestamp: Local::now().to_rfc3339(),
        };

        // Never log from here, the record would loop back into this logger.
        if let Err(e) = self
            .emitter
            .emit(EVENT_LOG_MESSAGE, serde_json::json!(log_message))
        {
            eprintln!("Failed to emit log message: {}", e);
        }
    }
}

impl log::Log for EventLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
            self.emit_log(record);
        }
    }

    fn flush(&self) {}
}

/// Installs the forwarding logger, or `env_logger` at the same level if a
/// logger is already registered.
pub fn init(emitter: Arc<dyn EventEmitter>, level: Level) {
    if EventLogger::init(emitter, level).is_err() {
        let _ = env_logger::builder()
            .filter_level(level.to_level_filter())
            .try_init();
    }
}
