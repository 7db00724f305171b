//! Tracing subscriber setup for hosts embedding the manager
//!
//! The library only emits `tracing` events under the `incall_core` target.
//! Hosts without their own subscriber call [`setup_logging`] once at startup;
//! `RUST_LOG` still wins when set.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{InCallError, InCallResult};

/// Target the library logs under
pub const LOG_TARGET: &str = "incall_core";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single lines
    #[default]
    Text,
    /// One JSON object per event, for device log collectors
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the `incall_core` target
    pub level: Level,
    /// Level for every other target, `None` silences them
    pub host_level: Option<Level>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            host_level: Some(Level::WARN),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_host_level(mut self, level: Option<Level>) -> Self {
        self.host_level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter directives this configuration stands for
    pub fn directives(&self) -> String {
        let host = self
            .host_level
            .map_or_else(|| "off".to_string(), |level| level.to_string().to_lowercase());
        format!("{},{}={}", host, LOG_TARGET, self.level.to_string().to_lowercase())
    }
}

/// Install a global `fmt` subscriber
///
/// Fails if a global subscriber is already set.
pub fn setup_logging(config: LoggingConfig) -> InCallResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives()))
        .map_err(|e| InCallError::config(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| InCallError::internal(format!("failed to install subscriber: {}", e)))?;

    tracing::info!(level = %config.level, "in-call logging ready, v{}", crate::VERSION);
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> InCallResult<Level> {
    Level::from_str(level).map_err(|_| InCallError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(matches!(
            parse_log_level("loud"),
            Err(InCallError::Configuration { .. })
        ));
    }

    #[test]
    fn test_directives_scope_library_target() {
        let config = LoggingConfig::new(Level::DEBUG);
        assert_eq!(config.directives(), "warn,incall_core=debug");

        let config = config.with_host_level(None).with_format(LogFormat::Json);
        assert_eq!(config.directives(), "off,incall_core=debug");
        assert!(EnvFilter::try_new(config.directives()).is_ok());
    }
}
