//! Same-origin credential endpoint for the natasha storefront admin.
//!
//! Holds the operator's bearer token in an HTTP-only, `SameSite=Strict`
//! cookie and exposes it to page scripts through `POST`/`GET`/`DELETE /api`.

pub mod config;
pub mod cookies;
pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use config::ServerConfig;
use state::AppState;

/// Build the application router with its middleware stack.
pub fn app(config: ServerConfig) -> Router {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Router::new()
        .merge(routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(AppState::new(config))
}
