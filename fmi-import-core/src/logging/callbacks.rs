//! Host-side logging callbacks.

use super::level::LogLevel;
use super::lock;
use crate::binding::ffi::{
    default_allocate_memory, default_free_memory, AllocateMemoryCallback, FreeMemoryCallback,
};
use crate::config::ImportConfig;
use crate::status::Status;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, RwLock};

/// Receiver of all messages produced by the import library and by loaded modules.
///
/// `module` is the tag of the producer: the instance name for module messages, or a
/// library tag such as `FMILIB`, `FMICAPI` or `LOGGER` for the library's own diagnostics.
///
/// Implementations must not call back into the handle that produced the message.
pub trait HostLogger: Send + Sync {
    fn log(&self, module: &str, level: LogLevel, message: &str);
}

impl<F> HostLogger for F
where
    F: Fn(&str, LogLevel, &str) + Send + Sync,
{
    fn log(&self, module: &str, level: LogLevel, message: &str) {
        self(module, level, message)
    }
}

/// Forwards messages to the [`log`] facade, using the module tag as target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateLogger;

impl HostLogger for LogCrateLogger {
    fn log(&self, module: &str, level: LogLevel, message: &str) {
        log::log!(target: module, level.to_log_level(), "{}", message);
    }
}

/// A message captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub module: String,
    pub level: LogLevel,
    pub message: String,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.records).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.records)
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl HostLogger for MemoryLogger {
    fn log(&self, module: &str, level: LogLevel, message: &str) {
        lock(&self.records).push(LogRecord {
            module: module.to_string(),
            level,
            message: message.to_string(),
        });
    }
}

/// Adapter for hosts whose logger speaks FMI statuses instead of log levels.
///
/// The callback receives the module tag, the status equivalent of the level, the level
/// name as category and the message.
pub struct FmiStyleLogger<F> {
    callback: F,
}

impl<F> FmiStyleLogger<F>
where
    F: Fn(&str, Status, &str, &str) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> HostLogger for FmiStyleLogger<F>
where
    F: Fn(&str, Status, &str, &str) + Send + Sync,
{
    fn log(&self, module: &str, level: LogLevel, message: &str) {
        (self.callback)(module, level.to_status(), level.as_str(), message)
    }
}

/// Callbacks supplied by the host.
#[derive(Clone)]
pub struct Callbacks {
    pub logger: Arc<dyn HostLogger>,
    /// Least severe level that is still delivered.
    pub log_level: LogLevel,
    /// Memory allocation offered to the module.
    pub allocate_memory: AllocateMemoryCallback,
    pub free_memory: FreeMemoryCallback,
}

impl Callbacks {
    pub fn new(logger: Arc<dyn HostLogger>, log_level: LogLevel) -> Self {
        Self {
            logger,
            log_level,
            allocate_memory: default_allocate_memory,
            free_memory: default_free_memory,
        }
    }

    /// Callbacks logging through the `log` facade at the configured level.
    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(Arc::new(LogCrateLogger), config.log_level)
    }

    pub fn with_logger(mut self, logger: Arc<dyn HostLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_allocator(
        mut self,
        allocate_memory: AllocateMemoryCallback,
        free_memory: FreeMemoryCallback,
    ) -> Self {
        self.allocate_memory = allocate_memory;
        self.free_memory = free_memory;
        self
    }

    /// Deliver a message if it passes the level filter.
    pub fn emit(&self, module: &str, level: LogLevel, message: &str) {
        if level.passes(self.log_level) {
            self.logger.log(module, level, message);
        }
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new(Arc::new(LogCrateLogger), LogLevel::Info)
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Callbacks used when no handle is available, e.g. for messages logged before a module
/// was instantiated.
static DEFAULT_CALLBACKS: LazyLock<RwLock<Callbacks>> =
    LazyLock::new(|| RwLock::new(Callbacks::default()));

pub fn default_callbacks() -> Callbacks {
    DEFAULT_CALLBACKS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

pub fn set_default_callbacks(callbacks: Callbacks) {
    *DEFAULT_CALLBACKS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = callbacks;
}
