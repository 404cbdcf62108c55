//! Shared test utilities for the CourseHub workspace
//!
//! This crate provides mock implementations of external services for testing
//! without a running backend.
//!
//! # Mock Services
//!
//! - [`MockPushServer`] - Local WebSocket server standing in for the notification push service
//!
//! # Example
//!
//! ```rust,ignore
//! use coursehub_test_utils::MockPushServer;
//!
//! #[tokio::test]
//! async fn test_with_push_server() {
//!     let server = MockPushServer::start().await;
//!     server.greet_with(r#"[{"id":1,"read":false}]"#);
//!
//!     // Point LIVE_WS_URL at server.url(), then push frames:
//!     server.push(r#"{"id":2,"read":false}"#);
//! }
//! ```

mod push_server;

pub use push_server::MockPushServer;
