//! Live notification channel configuration types

use std::time::Duration;

use url::Url;

use crate::{get_env_or_default, parse_env, parse_optional_env, ConfigError, ConfigResult};

pub(crate) const WS_URL_VAR: &str = "LIVE_WS_URL";
const HEARTBEAT_INTERVAL_VAR: &str = "LIVE_HEARTBEAT_INTERVAL_MS";
const RECONNECT_BASE_DELAY_VAR: &str = "LIVE_RECONNECT_BASE_DELAY_MS";
const RECONNECT_MAX_DELAY_VAR: &str = "LIVE_RECONNECT_MAX_DELAY_MS";
const RECONNECT_MAX_ATTEMPTS_VAR: &str = "LIVE_RECONNECT_MAX_ATTEMPTS";
const CONNECT_TIMEOUT_VAR: &str = "LIVE_CONNECT_TIMEOUT_SECS";

/// Default push endpoint base URL
const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Default keep-alive period in milliseconds
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 20_000;

/// Default reconnect delay step in milliseconds
const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 2_000;

/// Default reconnect delay ceiling in milliseconds
const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 30_000;

/// Default connect timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Live notification / live-class channel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    /// Base URL of the push service (`ws://` or `wss://`)
    pub ws_url: String,

    /// Interval between keep-alive pings while connected
    pub heartbeat_interval: Duration,

    /// Reconnect delay step; the n-th retry waits `n * base`
    pub reconnect_base_delay: Duration,

    /// Upper bound for a single reconnect delay
    pub reconnect_max_delay: Duration,

    /// Give up after this many consecutive failures (`None` retries forever)
    pub reconnect_max_attempts: Option<u32>,

    /// Time allowed for the WebSocket handshake
    pub connect_timeout: Duration,
}

impl LiveConfig {
    /// Load live channel configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            ws_url: get_env_or_default(WS_URL_VAR, DEFAULT_WS_URL),
            heartbeat_interval: Duration::from_millis(parse_env(
                HEARTBEAT_INTERVAL_VAR,
                DEFAULT_HEARTBEAT_INTERVAL_MS,
            )?),
            reconnect_base_delay: Duration::from_millis(parse_env(
                RECONNECT_BASE_DELAY_VAR,
                DEFAULT_RECONNECT_BASE_DELAY_MS,
            )?),
            reconnect_max_delay: Duration::from_millis(parse_env(
                RECONNECT_MAX_DELAY_VAR,
                DEFAULT_RECONNECT_MAX_DELAY_MS,
            )?),
            reconnect_max_attempts: parse_optional_env(RECONNECT_MAX_ATTEMPTS_VAR)?,
            connect_timeout: Duration::from_secs(parse_env(
                CONNECT_TIMEOUT_VAR,
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            ws_url: url.into(),
            ..Self::default()
        }
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        let url = Url::parse(&self.ws_url).map_err(|e| ConfigError::InvalidWsUrl {
            var: WS_URL_VAR,
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::UnsupportedScheme {
                var: WS_URL_VAR,
                scheme: url.scheme().to_string(),
            });
        }
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                var: HEARTBEAT_INTERVAL_VAR,
            });
        }
        if self.reconnect_base_delay.is_zero() {
            return Err(ConfigError::ZeroDuration {
                var: RECONNECT_BASE_DELAY_VAR,
            });
        }
        if self.reconnect_max_delay < self.reconnect_base_delay {
            return Err(ConfigError::DelayCeilingBelowBase {
                base: self.reconnect_base_delay,
                max: self.reconnect_max_delay,
            });
        }
        Ok(())
    }

    /// Whether the endpoint uses TLS
    pub fn is_secure(&self) -> bool {
        self.ws_url.starts_with("wss://")
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            reconnect_base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_DELAY_MS),
            reconnect_max_delay: Duration::from_millis(DEFAULT_RECONNECT_MAX_DELAY_MS),
            reconnect_max_attempts: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}
