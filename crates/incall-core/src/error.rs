//! Error types for the in-call audio library
//!
//! Two layers of errors exist:
//!
//! - [`PlatformError`] is what an OS collaborator (audio session service,
//!   routing manager, sensor service, media engine, ...) reports. The manager
//!   logs these and carries on; they almost never reach the application.
//! - [`InCallError`] is what the public surface returns. Only the operations
//!   that have no equivalent on this platform binding reject with it.

use thiserror::Error;

/// Result type for platform collaborator calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Result type for public in-call operations
pub type InCallResult<T> = Result<T, InCallError>;

/// Failure reported by an OS collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The service call failed with a platform status code
    #[error("{operation} failed with code {code}: {message}")]
    Call {
        operation: String,
        code: i32,
        message: String,
    },

    /// The capability does not exist on this device or binding
    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: String },
}

impl PlatformError {
    /// Create a status-code failure
    pub fn call(operation: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self::Call {
            operation: operation.into(),
            code,
            message: message.into(),
        }
    }

    /// Create an unsupported-capability failure
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Platform status code, `-1` when the failure carries none
    pub fn code(&self) -> i32 {
        match self {
            PlatformError::Call { code, .. } => *code,
            _ => -1,
        }
    }

    /// Whether this failure means the capability is missing rather than broken
    pub fn is_unsupported(&self) -> bool {
        matches!(self, PlatformError::Unsupported { .. })
    }
}

/// Errors returned to the application
#[derive(Debug, Error)]
pub enum InCallError {
    /// Operation has no implementation on this platform binding
    #[error("not support {operation}")]
    Unsupported { operation: String },

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Collaborator failure that had to be surfaced
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl InCallError {
    /// Create an unsupported-operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for InCallError {
    fn from(err: serde_json::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_code() {
        let err = PlatformError::call("activate", 6600101, "session service error");
        assert_eq!(err.code(), 6600101);
        assert!(!err.is_unsupported());
        assert_eq!(
            err.to_string(),
            "activate failed with code 6600101: session service error"
        );

        let err = PlatformError::unsupported("setCommunicationDevice");
        assert_eq!(err.code(), -1);
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_unsupported_message_matches_bridge_text() {
        let err = InCallError::unsupported("chooseAudioRoute");
        assert_eq!(err.to_string(), "not support chooseAudioRoute");
    }

    #[test]
    fn test_platform_error_converts() {
        let err: InCallError = PlatformError::unsupported("setTorchMode").into();
        assert!(matches!(err, InCallError::Platform(PlatformError::Unsupported { .. })));
        assert_eq!(
            err.to_string(),
            "Platform error: setTorchMode is not supported on this platform"
        );
    }
}
