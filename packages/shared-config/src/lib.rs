//! Shared configuration types for CourseHub services
//!
//! This crate provides the configuration consumed by the live notification
//! client and the binaries that embed it, so every consumer reads the same
//! environment variables with the same defaults.

mod error;
mod live;

pub use error::{ConfigError, ConfigResult};
pub use live::LiveConfig;

use std::env;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Live notification channel configuration
    pub live: LiveConfig,

    /// Environment mode (development, staging, production)
    pub environment: Environment,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            live: LiveConfig::from_env()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse()
                .unwrap_or_default(),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        };

        if config.environment.is_production() && !config.live.is_secure() {
            return Err(ConfigError::InsecureInProduction {
                var: live::WS_URL_VAR,
            });
        }

        Ok(config)
    }
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &'static str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar { var: name })
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &'static str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional_env(name)?.unwrap_or(default))
}

/// Parse an environment variable that has no default; unset or empty is `None`
pub fn parse_optional_env<T>(name: &'static str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var: name,
                value: val.clone(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "stage".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "dev".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "anything".parse::<Environment>().unwrap(),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(format!("{}", Environment::Production), "production");
        assert_eq!(format!("{}", Environment::Staging), "staging");
        assert_eq!(format!("{}", Environment::Development), "development");
    }

    #[test]
    fn test_environment_checks() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Production.is_development());
        assert!(Environment::Development.is_development());
    }

    #[test]
    fn test_parse_optional_env_unset_and_empty() {
        temp_env::with_var("COURSEHUB_TEST_OPTIONAL", None::<&str>, || {
            let value: Option<u32> = parse_optional_env("COURSEHUB_TEST_OPTIONAL").unwrap();
            assert_eq!(value, None);
        });
        temp_env::with_var("COURSEHUB_TEST_OPTIONAL", Some("  "), || {
            let value: Option<u32> = parse_optional_env("COURSEHUB_TEST_OPTIONAL").unwrap();
            assert_eq!(value, None);
        });
    }

    #[test]
    fn test_parse_env_invalid_value_names_variable() {
        temp_env::with_var("COURSEHUB_TEST_NUMBER", Some("abc"), || {
            let err = parse_env::<u64>("COURSEHUB_TEST_NUMBER", 1).unwrap_err();
            assert!(err.to_string().contains("COURSEHUB_TEST_NUMBER"));
        });
    }

    #[test]
    fn test_get_required_env_missing() {
        temp_env::with_var("COURSEHUB_TEST_REQUIRED", None::<&str>, || {
            let result = get_required_env("COURSEHUB_TEST_REQUIRED");
            assert_eq!(
                result,
                Err(ConfigError::MissingEnvVar {
                    var: "COURSEHUB_TEST_REQUIRED"
                })
            );
        });
    }

    #[test]
    fn test_common_config_requires_tls_in_production() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", Some("production")),
                ("LIVE_WS_URL", Some("ws://push.coursehub.example")),
            ],
            || {
                let result = CommonConfig::from_env();
                assert_eq!(
                    result.unwrap_err(),
                    ConfigError::InsecureInProduction { var: "LIVE_WS_URL" }
                );
            },
        );
    }

    #[test]
    fn test_common_config_development_defaults() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", None::<&str>),
                ("LIVE_WS_URL", None),
                ("RUST_LOG", None),
                ("LOG_LEVEL", Some("warn")),
            ],
            || {
                let config = CommonConfig::from_env().unwrap();
                assert!(config.environment.is_development());
                assert_eq!(config.log_level, "warn");
                assert_eq!(config.live.ws_url, "ws://localhost:8000");
            },
        );
    }
}
