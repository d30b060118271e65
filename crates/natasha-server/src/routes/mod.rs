pub mod credentials;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All routes served by the credential endpoint.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(credentials::router())
}
