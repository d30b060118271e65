//! Session boundary of the natasha storefront admin.
//!
//! The storefront's products, carts and users belong to a third-party demo
//! API; what this crate owns is who is signed in. A bearer token from the
//! remote identity provider is kept in an HTTP-only cookie behind a
//! same-origin endpoint, mirrored into an in-process session cell, and
//! changed only by the login and logout flows.

pub mod api;
pub mod auth;
pub mod config;
pub mod nav;
pub mod wire;

pub use api::{ApiClient, ApiError};
pub use auth::{
    Credentials, FlowSettings, HttpCredentialStore, LoginOutcome, LogoutOutcome, SessionContext,
    SessionToken,
};
pub use config::Config;
pub use nav::{HeaderAction, HeaderLinks, Route};

/// Session context wired to the real endpoints
pub type LiveSession = SessionContext<ApiClient, HttpCredentialStore>;
