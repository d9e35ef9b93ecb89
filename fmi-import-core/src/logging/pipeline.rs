//! Forwarding of module log messages to the host.
//!
//! Every message a module reports goes through the same steps:
//!
//! 1. the native status is mapped to a [`LogLevel`] (unknown statuses are fatal);
//! 2. messages below the host's level filter are dropped before any formatting;
//! 3. a header with the category and the status name is written to the coded buffer;
//! 4. the message itself is rendered after the header, growing the buffer if needed;
//! 5. variable references are expanded into the expanded buffer;
//! 6. the host logger receives the instance name, the level and the final text.
//!
//! Nothing in here fails towards the caller. Problems along the way degrade the message
//! (unexpanded text, or the sentinel) and are reported as warnings.

use super::buffer::{BufferError, MessageBuffer};
use super::callbacks::{default_callbacks, Callbacks};
use super::format::{format_template, LogArg};
use super::level::{severity_for_status, LogLevel};
use super::lock;
use crate::config::BufferConfig;
use crate::expand::expand_variable_references;
use crate::status::{status_name, RawStatus};
use crate::variables::VariableIndex;
use std::sync::{Arc, LazyLock, Mutex};

/// Body of a log message.
#[derive(Debug, Clone, Copy)]
pub enum LogMessage<'a> {
    /// Text that is already rendered and is copied verbatim.
    Rendered(&'a str),
    /// printf-style template with its arguments.
    Template {
        template: &'a str,
        args: &'a [LogArg],
    },
}

/// Message buffer used for messages that cannot be attributed to a handle.
///
/// This is the only mutable state shared between handles. It is created on first use,
/// or explicitly through [`configure_default_buffer`], and lives until the process exits.
static DEFAULT_BUFFER: LazyLock<Mutex<MessageBuffer>> = LazyLock::new(|| {
    let config = BufferConfig::default();
    Mutex::new(MessageBuffer::new(config.initial_capacity, config.max_size))
});

/// Replace the default buffer with one sized according to `config`.
pub fn configure_default_buffer(config: &BufferConfig) {
    *lock(&DEFAULT_BUFFER) = MessageBuffer::new(config.initial_capacity, config.max_size);
}

#[derive(Debug)]
struct Buffers {
    /// Header and rendered message, references still unexpanded.
    coded: MessageBuffer,
    expanded: MessageBuffer,
}

/// Per-handle logging state.
///
/// The sink is shared with native code during calls into a module (its address is the
/// environment pointer handed to the module), so all mutation goes through locks.
#[derive(Debug)]
pub struct LogSink {
    callbacks: Callbacks,
    index: Arc<VariableIndex>,
    buffers: Mutex<Buffers>,
    last_error: Mutex<Option<String>>,
}

impl LogSink {
    pub fn new(callbacks: Callbacks, index: Arc<VariableIndex>, config: &BufferConfig) -> Self {
        Self {
            callbacks,
            index,
            buffers: Mutex::new(Buffers {
                coded: MessageBuffer::new(config.initial_capacity, config.max_size),
                expanded: MessageBuffer::new(config.initial_capacity, config.max_size),
            }),
            last_error: Mutex::new(None),
        }
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn index(&self) -> &VariableIndex {
        &self.index
    }

    /// Report a diagnostic of the import library itself.
    ///
    /// Error and fatal messages are remembered as the last error, whether or not they pass
    /// the level filter.
    pub fn emit(&self, module: &str, level: LogLevel, message: &str) {
        if level != LogLevel::Nothing && level <= LogLevel::Error {
            *lock(&self.last_error) = Some(message.to_string());
        }
        self.callbacks.emit(module, level, message);
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// Expand the variable references in `message`.
    ///
    /// Returns the unexpanded message (or the sentinel) if expansion fails.
    pub fn expand(&self, message: &str) -> String {
        let mut buffers = lock(&self.buffers);
        expand_variable_references(&mut buffers.expanded, message, &self.index, &self.callbacks);
        buffers.expanded.as_str().to_string()
    }

    /// Current capacity of the coded buffer.
    pub fn coded_capacity(&self) -> usize {
        lock(&self.buffers).coded.capacity()
    }

    /// Free the storage of both buffers.
    pub fn release_buffers(&self) {
        let mut buffers = lock(&self.buffers);
        buffers.coded.release();
        buffers.expanded.release();
    }

    fn forward(
        &self,
        instance_name: &str,
        level: LogLevel,
        status: RawStatus,
        category: Option<&str>,
        message: LogMessage<'_>,
    ) {
        let text = {
            let mut buffers = lock(&self.buffers);
            let Buffers { coded, expanded } = &mut *buffers;
            coded.clear();
            if let Err(err) = render_coded(coded, status, category, message) {
                self.callbacks
                    .emit(crate::expand::MODULE, LogLevel::Warning, &err.to_string());
                coded.set_sentinel();
            }
            expand_variable_references(expanded, coded.as_str(), &self.index, &self.callbacks);
            expanded.as_str().to_string()
        };
        self.callbacks.logger.log(instance_name, level, &text);
    }
}

/// Forward a module message to the host.
///
/// Without a sink the process-wide default callbacks and buffer are used and references
/// are left unexpanded.
pub fn forward(
    sink: Option<&LogSink>,
    instance_name: &str,
    status: RawStatus,
    category: Option<&str>,
    message: LogMessage<'_>,
) {
    let level = severity_for_status(status);
    match sink {
        Some(sink) => {
            if level.passes(sink.callbacks.log_level) {
                sink.forward(instance_name, level, status, category, message);
            }
        }
        None => {
            let callbacks = default_callbacks();
            if level.passes(callbacks.log_level) {
                forward_default(&callbacks, instance_name, level, status, category, message);
            }
        }
    }
}

fn forward_default(
    callbacks: &Callbacks,
    instance_name: &str,
    level: LogLevel,
    status: RawStatus,
    category: Option<&str>,
    message: LogMessage<'_>,
) {
    let text = {
        let mut buffer = lock(&DEFAULT_BUFFER);
        buffer.clear();
        if render_coded(&mut buffer, status, category, message).is_err() {
            buffer.set_sentinel();
        }
        buffer.as_str().to_string()
    };
    callbacks.logger.log(instance_name, level, &text);
}

fn render_coded(
    coded: &mut MessageBuffer,
    status: RawStatus,
    category: Option<&str>,
    message: LogMessage<'_>,
) -> Result<(), BufferError> {
    if let Some(category) = category {
        coded.try_append_with(|w| write!(w, "[{category}]"))?;
    }
    coded.try_append_with(|w| write!(w, "[FMU status:{}] ", status_name(status)))?;
    match message {
        LogMessage::Rendered(text) => coded.try_push_str(text)?,
        LogMessage::Template { template, args } => {
            coded.try_append_with(|w| format_template(w, template, args))?;
        }
    }
    Ok(())
}
