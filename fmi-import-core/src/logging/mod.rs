//! Logging of module and library messages.
//!
//! Module messages reach the host through [`forward`]. The library's own diagnostics
//! go straight to [`Callbacks::emit`] under one of the module tags `FMILIB`, `FMICAPI`
//! or `LOGGER`.

mod buffer;
mod callbacks;
mod format;
mod level;
mod pipeline;

pub use buffer::{BufferError, MessageBuffer, SENTINEL};
pub use callbacks::{
    default_callbacks, set_default_callbacks, Callbacks, FmiStyleLogger, HostLogger,
    LogCrateLogger, LogRecord, MemoryLogger,
};
pub use format::{format_template, format_to_string, LogArg};
pub use level::{severity_for_status, LogLevel};
pub use pipeline::{configure_default_buffer, forward, LogMessage, LogSink};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, ignoring poisoning.
///
/// A panic in a host logger must not make the logging state unusable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
