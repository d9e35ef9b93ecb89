//! Import configuration.
//!
//! All values have defaults, so an empty document is a valid configuration:
//!
//! ```toml
//! log_level = "warning"
//!
//! [buffer]
//! initial_capacity = 1024
//! max_size = 1048576
//!
//! [instance]
//! logging_on = true
//! ```

use crate::errors::ImportResult;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Least severe level delivered to the host logger.
    pub log_level: LogLevel,
    pub buffer: BufferConfig,
    pub instance: InstanceConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            buffer: BufferConfig::default(),
            instance: InstanceConfig::default(),
        }
    }
}

impl ImportConfig {
    pub fn from_toml_str(content: &str) -> ImportResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ImportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Sizing of the message buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes reserved up front for each buffer.
    pub initial_capacity: usize,
    /// Largest message a buffer may hold before it degrades to the sentinel.
    pub max_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_size: 1024 * 1024,
        }
    }
}

/// Flags passed to the module on instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Whether the module should produce log messages at all.
    pub logging_on: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            logging_on: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ImportError;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ImportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.buffer.initial_capacity, 1024);
        assert_eq!(config.buffer.max_size, 1048576);
        assert!(config.instance.logging_on);
    }

    #[test]
    fn partial_document() {
        let config = ImportConfig::from_toml_str(
            r#"
log_level = "debug"

[buffer]
max_size = 4096
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.buffer.initial_capacity, 1024);
        assert_eq!(config.buffer.max_size, 4096);
        assert_eq!(config.instance, InstanceConfig::default());
    }

    #[test]
    fn invalid_level_is_rejected() {
        let result = ImportConfig::from_toml_str(r#"log_level = "loud""#);
        assert!(matches!(result, Err(ImportError::Config(_))));
    }

    #[test]
    fn missing_file() {
        let result = ImportConfig::from_file("does/not/exist.toml");
        assert!(matches!(result, Err(ImportError::Io(_))));
    }
}
