use std::time::{SystemTime, UNIX_EPOCH};

use crate::log::log_level::LogLevel;

/// Milliseconds since the UNIX epoch. Saturates to 0 on a clock before 1970.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Represents a single log message event.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// The severity level of the log.
    pub level: LogLevel,
    /// The timestamp of the log event in milliseconds.
    pub ts_ms: u128,
    /// The actual content or payload of the log message.
    pub text: String,
    /// The target source of the log, typically the static module path.
    pub target: &'static str,
}

impl LogMsg {
    pub fn new(level: LogLevel, text: impl Into<String>, target: &'static str) -> Self {
        Self {
            level,
            ts_ms: now_millis(),
            text: text.into(),
            target,
        }
    }
}
