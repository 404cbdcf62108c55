//! Configuration error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading or validating configuration
///
/// Variants name the environment variable responsible, so a failing
/// startup points straight at the setting to fix.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {var}")]
    MissingEnvVar { var: &'static str },

    /// Set, but not parseable as the expected type
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} is not a valid URL: {reason}")]
    InvalidWsUrl { var: &'static str, reason: String },

    /// Parses as a URL but cannot carry a WebSocket
    #[error("{var} must use ws:// or wss://, got {scheme}://")]
    UnsupportedScheme { var: &'static str, scheme: String },

    #[error("{var} must use wss:// in production")]
    InsecureInProduction { var: &'static str },

    #[error("{var} must be greater than zero")]
    ZeroDuration { var: &'static str },

    #[error("reconnect max delay ({max:?}) is shorter than the base delay ({base:?})")]
    DelayCeilingBelowBase { base: Duration, max: Duration },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_variable() {
        let err = ConfigError::UnsupportedScheme {
            var: "LIVE_WS_URL",
            scheme: "https".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LIVE_WS_URL must use ws:// or wss://, got https://"
        );

        let err = ConfigError::InvalidValue {
            var: "LIVE_HEARTBEAT_INTERVAL_MS",
            value: "soon".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"soon\" for LIVE_HEARTBEAT_INTERVAL_MS: invalid digit found in string"
        );
    }
}
