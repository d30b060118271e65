//! Request-level tests for the cookie endpoint.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn post_sets_http_only_strict_cookie() {
    let response = send(build_test_app(), post_json("/api", r#"{"token":"abc123"}"#)).await;
    assert_status(&response, StatusCode::OK);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("authToken=abc123"), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("SameSite=Strict"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(cookie.contains("Max-Age=604800"), "{cookie}");

    let json = body_json(response).await;
    assert_eq!(json["message"], "Token saved to cookie");
}

#[tokio::test]
async fn post_marks_cookie_secure_by_default() {
    let app = natasha_server::app(natasha_server::config::ServerConfig::default());
    let response = send(app, post_json("/api", r#"{"token":"abc123"}"#)).await;
    assert!(set_cookie(&response).contains("Secure"));
}

#[tokio::test]
async fn post_stores_token_verbatim() {
    // Not validated; any string is accepted
    let response = send(build_test_app(), post_json("/api", r#"{"token":"not-a-jwt"}"#)).await;
    assert_status(&response, StatusCode::OK);
    assert!(set_cookie(&response).starts_with("authToken=not-a-jwt"));
}

#[tokio::test]
async fn post_without_token_is_bad_request() {
    let response = send(build_test_app(), post_json("/api", r#"{"tok":"abc123"}"#)).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert!(response.headers().get("set-cookie").is_none());

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn post_malformed_json_is_bad_request() {
    let response = send(build_test_app(), post_json("/api", "{token:")).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn get_without_cookie_returns_null() {
    let response = send(build_test_app(), get("/api")).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "token": null }));
}

#[tokio::test]
async fn get_returns_cookie_value() {
    let response = send(build_test_app(), get_with_cookie("/api", "authToken=abc123")).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await["token"], "abc123");
}

#[tokio::test]
async fn get_ignores_unrelated_and_empty_cookies() {
    let response = send(build_test_app(), get_with_cookie("/api", "theme=dark")).await;
    assert!(body_json(response).await["token"].is_null());

    let response = send(build_test_app(), get_with_cookie("/api", "authToken=")).await;
    assert!(body_json(response).await["token"].is_null());
}

#[tokio::test]
async fn delete_expires_cookie() {
    let response = send(build_test_app(), delete("/api")).await;
    assert_status(&response, StatusCode::OK);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("authToken="), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");

    assert_eq!(body_json(response).await["message"], "Token removed from cookie");
}

#[tokio::test]
async fn delete_with_cookie_present_also_expires_it() {
    let request = axum::http::Request::delete("/api")
        .header("cookie", "authToken=abc123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(build_test_app(), request).await;
    assert_status(&response, StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let request = axum::http::Request::put("/api")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(build_test_app(), request).await;
    assert_status(&response, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_reports_version() {
    let response = send(build_test_app(), get("/health")).await;
    assert_status(&response, StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = send(build_test_app(), get("/api/unknown")).await;
    assert_status(&response, StatusCode::NOT_FOUND);
}
