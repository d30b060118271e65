use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use natasha_core::auth::{SESSION_COOKIE_NAME, SESSION_TTL_SECS};
use time::Duration;

/// Session cookie carrying the bearer token for 7 days.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Same cookie, emptied and expiring immediately.
///
/// Keeps every attribute of [`session_cookie`] so the browser treats it as
/// the same slot.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Token from the request's cookies. An empty value counts as absent.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
