//! Manager configuration
//!
//! [`InCallConfig`] carries the handful of knobs the manager needs: where the
//! tone files live, how the keep-alive task behaves and how many application
//! events may queue up. Every field has a default that matches the packaged
//! resources, so `InCallConfig::default()` is a working configuration.
//!
//! ```rust
//! use incall_core::config::InCallConfig;
//!
//! let config = InCallConfig::new()
//!     .with_keep_alive_update_delay_ms(2000)
//!     .with_event_channel_capacity(64);
//!
//! assert_eq!(config.keep_alive_update_delay_ms, 2000);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{InCallError, InCallResult};
use crate::types::ToneKind;

/// Path fragment appended to the descriptor location by `get_audio_uri`
pub const DEFAULT_RAWFILE_PREFIX: &str = "/src/main/resources/rawfile/";

/// A tone file as base name plus extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneFile {
    pub name: String,
    pub ext: String,
}

impl ToneFile {
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
        }
    }

    /// `name.ext`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.ext)
    }
}

/// Bundled override and packaged default for one tone kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneFileSet {
    pub bundle: ToneFile,
    pub default: ToneFile,
}

impl ToneFileSet {
    fn same(name: &str) -> Self {
        Self {
            bundle: ToneFile::new(name, "mp3"),
            default: ToneFile::new(name, "mp3"),
        }
    }
}

/// Tone files for all three kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneFiles {
    pub ringtone: ToneFileSet,
    pub ringback: ToneFileSet,
    pub busytone: ToneFileSet,
}

impl ToneFiles {
    pub fn for_kind(&self, kind: ToneKind) -> &ToneFileSet {
        match kind {
            ToneKind::Ringtone => &self.ringtone,
            ToneKind::Ringback => &self.ringback,
            ToneKind::Busytone => &self.busytone,
        }
    }
}

impl Default for ToneFiles {
    fn default() -> Self {
        Self {
            ringtone: ToneFileSet::same("incallmanager_ringtone"),
            ringback: ToneFileSet::same("incallmanager_ringback"),
            busytone: ToneFileSet::same("incallmanager_busytone"),
        }
    }
}

/// In-call manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InCallConfig {
    /// Tone file names
    pub tones: ToneFiles,
    /// Path fragment used when building tone URIs
    pub rawfile_prefix: String,
    /// Delay before the keep-alive task adds the recording mode
    pub keep_alive_update_delay_ms: u64,
    /// Capacity of the application event broadcast channel
    pub event_channel_capacity: usize,
    /// Hold timeout for the proximity screen lock, 0 holds until released
    pub proximity_lock_timeout_ms: u64,
}

impl Default for InCallConfig {
    fn default() -> Self {
        Self {
            tones: ToneFiles::default(),
            rawfile_prefix: DEFAULT_RAWFILE_PREFIX.to_string(),
            keep_alive_update_delay_ms: 5000,
            event_channel_capacity: 256,
            proximity_lock_timeout_ms: 0,
        }
    }
}

impl InCallConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document; missing fields take their defaults
    pub fn from_json(json: &str) -> InCallResult<Self> {
        let config: InCallConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_tones(mut self, tones: ToneFiles) -> Self {
        self.tones = tones;
        self
    }

    pub fn with_rawfile_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rawfile_prefix = prefix.into();
        self
    }

    pub fn with_keep_alive_update_delay_ms(mut self, delay_ms: u64) -> Self {
        self.keep_alive_update_delay_ms = delay_ms;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn with_proximity_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.proximity_lock_timeout_ms = timeout_ms;
        self
    }

    pub fn keep_alive_update_delay(&self) -> Duration {
        Duration::from_millis(self.keep_alive_update_delay_ms)
    }

    /// Check the configuration for values the manager cannot work with
    pub fn validate(&self) -> InCallResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(InCallError::config("event_channel_capacity must be greater than 0"));
        }
        for kind in [ToneKind::Ringtone, ToneKind::Ringback, ToneKind::Busytone] {
            let set = self.tones.for_kind(kind);
            if set.default.name.is_empty() || set.bundle.name.is_empty() {
                return Err(InCallError::config(format!("{} tone file name is empty", kind)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tone_files() {
        let config = InCallConfig::default();
        assert_eq!(
            config.tones.for_kind(ToneKind::Ringback).default.file_name(),
            "incallmanager_ringback.mp3"
        );
        assert_eq!(
            config.tones.for_kind(ToneKind::Busytone).bundle.file_name(),
            "incallmanager_busytone.mp3"
        );
        assert_eq!(config.rawfile_prefix, DEFAULT_RAWFILE_PREFIX);
        assert_eq!(config.keep_alive_update_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_json_partial() {
        let config = InCallConfig::from_json(r#"{ "keep_alive_update_delay_ms": 10 }"#).unwrap();
        assert_eq!(config.keep_alive_update_delay_ms, 10);
        assert_eq!(config.event_channel_capacity, 256);
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config = InCallConfig::new().with_event_channel_capacity(0);
        assert!(matches!(config.validate(), Err(InCallError::Configuration { .. })));

        let err = InCallConfig::from_json(r#"{ "event_channel_capacity": 0 }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = InCallConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, InCallError::Configuration { .. }));
    }
}
