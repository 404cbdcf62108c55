//! Common test utilities for live client integration tests
//!
//! Provides an in-memory transport that the tests drive frame by frame,
//! plus fixtures and helpers for paused-clock scheduling.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
