//! Watcher configuration

use anyhow::{Context, Result};
use coursehub_live_client::Channel;
use coursehub_shared_config::{get_required_env, parse_optional_env, CommonConfig};

/// Watcher configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Session token for the push service
    pub token: String,

    /// Course to follow; the user's notification feed when unset
    pub course_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Requires `LIVE_TOKEN`. `LIVE_COURSE_ID` switches to a live-class channel.
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Invalid live channel configuration")?;
        let token = get_required_env("LIVE_TOKEN")?;
        let course_id = parse_optional_env::<String>("LIVE_COURSE_ID")?;

        Ok(Self {
            common,
            token,
            course_id,
        })
    }

    pub fn channel(&self) -> Channel {
        Channel::from_scope(self.course_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_requires_token() {
        temp_env::with_vars([("LIVE_TOKEN", None::<&str>)], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("LIVE_TOKEN"));
        });
    }

    #[test]
    fn test_config_defaults_to_notification_feed() {
        temp_env::with_vars(
            [
                ("LIVE_TOKEN", Some("abc")),
                ("LIVE_COURSE_ID", None),
                ("LIVE_WS_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.token, "abc");
                assert_eq!(config.channel(), Channel::Notifications);
            },
        );
    }

    #[test]
    fn test_config_course_id_selects_live_class() {
        temp_env::with_vars(
            [("LIVE_TOKEN", Some("abc")), ("LIVE_COURSE_ID", Some("42"))],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.channel(), Channel::LiveClass("42".to_string()));
            },
        );
    }
}
