//! Push endpoint selection

use std::fmt;

use url::Url;

use crate::error::LiveResult;

/// Which push channel a client listens on
///
/// Fixed for the lifetime of a client; switching scope means building a new
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The user's global notification feed
    Notifications,
    /// A course's live-class channel
    LiveClass(String),
}

impl Channel {
    /// Live-class channel when a course id is present, global feed otherwise
    pub fn from_scope(course_id: Option<impl Into<String>>) -> Self {
        match course_id {
            Some(id) => Channel::LiveClass(id.into()),
            None => Channel::Notifications,
        }
    }

    fn path(&self) -> String {
        match self {
            Channel::Notifications => "ws/notifications/".to_string(),
            Channel::LiveClass(course_id) => format!("ws/liveclass/{}/", course_id),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Notifications => write!(f, "notifications"),
            Channel::LiveClass(course_id) => write!(f, "liveclass:{}", course_id),
        }
    }
}

/// Resolved channel URL, minus the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    channel: Channel,
    url: Url,
}

impl Endpoint {
    pub fn new(base_url: &str, channel: Channel) -> LiveResult<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        let url = base.join(&channel.path())?;
        Ok(Self { channel, url })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// URL for one connection attempt
    pub fn url_with_token(&self, token: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().clear().append_pair("token", token);
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiveError;
    use assert_matches::assert_matches;

    #[test]
    fn test_notifications_url() {
        let endpoint = Endpoint::new("wss://api.coursehub.example", Channel::Notifications).unwrap();
        assert_eq!(
            endpoint.url_with_token("abc").as_str(),
            "wss://api.coursehub.example/ws/notifications/?token=abc"
        );
    }

    #[test]
    fn test_live_class_url_keeps_base_path() {
        let endpoint = Endpoint::new(
            "wss://api.coursehub.example/v2/",
            Channel::LiveClass("course-17".to_string()),
        )
        .unwrap();
        assert_eq!(
            endpoint.url_with_token("abc").as_str(),
            "wss://api.coursehub.example/v2/ws/liveclass/course-17/?token=abc"
        );
    }

    #[test]
    fn test_token_is_query_encoded() {
        let endpoint = Endpoint::new("ws://localhost:8000", Channel::Notifications).unwrap();
        let url = endpoint.url_with_token("a b&c=d");
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("a b&c=d"));
    }

    #[test]
    fn test_rotated_token_replaces_previous() {
        let endpoint = Endpoint::new("ws://localhost:8000", Channel::Notifications).unwrap();
        let _ = endpoint.url_with_token("old");
        let url = endpoint.url_with_token("new");
        assert_eq!(url.query(), Some("token=new"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert_matches!(
            Endpoint::new("not a url", Channel::Notifications),
            Err(LiveError::InvalidUrl(_))
        );
    }

    #[test]
    fn test_channel_from_scope() {
        assert_eq!(Channel::from_scope(None::<String>), Channel::Notifications);
        assert_eq!(
            Channel::from_scope(Some("42")),
            Channel::LiveClass("42".to_string())
        );
        assert_eq!(Channel::LiveClass("42".to_string()).to_string(), "liveclass:42");
    }
}
