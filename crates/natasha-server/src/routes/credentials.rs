//! Same-origin bridge between page scripts and the HTTP-only session cookie.
//!
//! Scripts cannot touch an HTTP-only cookie, so they ask this route to set,
//! report, or expire it on their behalf.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use natasha_core::wire::{MessageResponse, TokenBody, TokenResponse};

use crate::cookies;
use crate::error::AppResult;
use crate::state::AppState;

pub const CREDENTIALS_PATH: &str = "/api";

pub fn router() -> Router<AppState> {
    Router::new().route(
        CREDENTIALS_PATH,
        get(read_token).post(save_token).delete(remove_token),
    )
}

/// POST /api -- store the token in the session cookie. The token is not validated.
async fn save_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<TokenBody>, JsonRejection>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let Json(body) = payload?;

    let cookie = cookies::session_cookie(body.token, state.config.secure_cookies);
    tracing::info!("Session token saved to cookie");

    Ok((jar.add(cookie), Json(MessageResponse::new("Token saved to cookie"))))
}

/// GET /api -- report the token currently held in the cookie, if any.
async fn read_token(jar: CookieJar) -> Json<TokenResponse> {
    let token = cookies::session_token(&jar);
    tracing::debug!(present = token.is_some(), "Session token read");
    Json(TokenResponse { token })
}

/// DELETE /api -- expire the cookie. Succeeds whether or not one was set.
async fn remove_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let cookie = cookies::clear_session_cookie(state.config.secure_cookies);
    tracing::info!("Session token removed from cookie");

    (jar.add(cookie), Json(MessageResponse::new("Token removed from cookie")))
}
