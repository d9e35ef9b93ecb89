//! Log levels and the mapping between native statuses and severities.

use crate::status::{RawStatus, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log message, ordered from least to most verbose.
///
/// A message is delivered when its level is less than or equal to the configured
/// minimum, so `LogLevel::Warning` lets fatal, error and warning messages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only usable as a filter: suppresses everything.
    Nothing,
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    All,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Nothing => "NOTHING",
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
            LogLevel::All => "ALL",
        }
    }

    /// Whether a message at this level passes a `minimum` filter.
    pub fn passes(self, minimum: LogLevel) -> bool {
        self != LogLevel::Nothing && self <= minimum
    }

    /// Level used when forwarding to the `log` facade.
    pub fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Nothing | LogLevel::Fatal | LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Verbose => log::Level::Debug,
            LogLevel::Debug | LogLevel::All => log::Level::Trace,
        }
    }

    /// Status reported to an FMI style logger for a message at this level.
    pub fn to_status(self) -> Status {
        match self {
            LogLevel::Nothing => Status::Ok,
            LogLevel::Fatal => Status::Fatal,
            LogLevel::Error => Status::Error,
            LogLevel::Warning => Status::Warning,
            LogLevel::Info | LogLevel::Verbose | LogLevel::Debug | LogLevel::All => Status::Ok,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a message reported by a module with the given status.
///
/// Total over all raw values: anything outside the known status range is fatal.
pub fn severity_for_status(raw: RawStatus) -> LogLevel {
    match Status::from_raw(raw) {
        Some(Status::Ok) | Some(Status::Discard) | Some(Status::Pending) => LogLevel::Info,
        Some(Status::Warning) => LogLevel::Warning,
        Some(Status::Error) => LogLevel::Error,
        Some(Status::Fatal) | None => LogLevel::Fatal,
    }
}
