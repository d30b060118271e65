//! REST API client module for the remote identity provider.
//!
//! This module provides the `ApiClient` used by the login flow to exchange
//! a username and password for an opaque bearer token.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_AUTH_URL, REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
