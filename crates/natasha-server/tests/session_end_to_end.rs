//! Drives the client-side session stack against a live server.
//!
//! A stand-in identity provider is mounted next to the cookie endpoint so
//! the whole round trip stays on loopback.

mod common;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use natasha_core::auth::login::{MSG_INVALID_CREDENTIALS, MSG_LOGIN_ERROR};
use natasha_core::auth::logout::MSG_LOGOUT_ERROR;
use natasha_core::auth::{
    CredentialStore, HttpCredentialStore, LoginFailure, LogoutFailure, StoreError,
};
use natasha_core::{
    ApiClient, Credentials, FlowSettings, LiveSession, LoginOutcome, LogoutOutcome, Route,
    SessionContext, SessionToken,
};
use serde_json::{json, Value};

const DEMO_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.demo";

async fn fake_login(Json(body): Json<Value>) -> axum::response::Response {
    let demo = Credentials::demo();
    match (body["username"].as_str(), body["password"].as_str()) {
        (Some(u), Some(p)) if u == demo.username && p == demo.password => {
            Json(json!({ "token": DEMO_TOKEN })).into_response()
        }
        (Some("teapot"), _) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => (StatusCode::UNAUTHORIZED, "username or password is incorrect").into_response(),
    }
}

/// Start the server on an ephemeral port and return its address
async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/auth/login", post(fake_login))
        .merge(common::build_test_app());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings() -> FlowSettings {
    FlowSettings {
        operation_timeout: Duration::from_secs(5),
    }
}

fn store_for(addr: SocketAddr) -> HttpCredentialStore {
    HttpCredentialStore::new(format!("http://{addr}/api"), Duration::from_secs(5)).unwrap()
}

fn jar_store_for(addr: SocketAddr, jar: &Path) -> HttpCredentialStore {
    HttpCredentialStore::with_jar_file(format!("http://{addr}/api"), Duration::from_secs(5), jar)
        .unwrap()
}

fn temp_jar(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("natasha-e2e-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("cookies.json")
}

fn session_for(addr: SocketAddr, store: HttpCredentialStore) -> LiveSession {
    let api = ApiClient::new(format!("http://{addr}/auth/login"), Duration::from_secs(5)).unwrap();
    SessionContext::new(api, store, settings())
}

#[tokio::test]
async fn store_round_trip_over_cookie() {
    let addr = spawn_server().await;
    let store = store_for(addr);
    let token = SessionToken::new("abc123").unwrap();

    assert_eq!(store.read().await.unwrap(), None);

    store.persist(&token).await.unwrap();
    assert_eq!(store.read().await.unwrap(), Some(token));

    store.erase().await.unwrap();
    assert_eq!(store.read().await.unwrap(), None);

    // Erasing an empty slot is still a success
    store.erase().await.unwrap();
}

#[tokio::test]
async fn last_persist_wins() {
    let addr = spawn_server().await;
    let store = store_for(addr);

    store.persist(&SessionToken::new("first").unwrap()).await.unwrap();
    store.persist(&SessionToken::new("second").unwrap()).await.unwrap();

    assert_eq!(store.read().await.unwrap().unwrap().as_str(), "second");
}

#[tokio::test]
async fn cookie_is_scoped_to_one_client() {
    let addr = spawn_server().await;
    store_for(addr)
        .persist(&SessionToken::new("abc123").unwrap())
        .await
        .unwrap();

    assert_eq!(store_for(addr).read().await.unwrap(), None);
}

#[tokio::test]
async fn login_persists_and_sets_session() {
    let addr = spawn_server().await;
    let store = store_for(addr);
    let session = session_for(addr, store.clone());
    let mut rx = session.subscribe();

    assert_eq!(session.init().await, None);
    assert_eq!(Route::Dashboard.resolve(session.is_authenticated()), Route::Home);

    let outcome = session.login(&Credentials::demo()).await;

    assert!(matches!(outcome, LoginOutcome::Success { redirect: Route::Home }));
    assert_eq!(session.token().unwrap().as_str(), DEMO_TOKEN);
    assert_eq!(store.read().await.unwrap().unwrap().as_str(), DEMO_TOKEN);
    assert!(rx.has_changed().unwrap());
    assert_eq!(Route::Dashboard.resolve(session.is_authenticated()), Route::Dashboard);
}

#[tokio::test]
async fn rejected_login_leaves_everything_untouched() {
    let addr = spawn_server().await;
    let store = store_for(addr);
    let session = session_for(addr, store.clone());
    session.init().await;

    let outcome = session
        .login(&Credentials::new("mor_2314", "wrong"))
        .await;

    assert!(matches!(outcome, LoginOutcome::Failed(LoginFailure::InvalidCredentials)));
    assert_eq!(outcome.user_message(), Some(MSG_INVALID_CREDENTIALS));
    assert_eq!(session.token(), None);
    assert_eq!(store.read().await.unwrap(), None);
}

#[tokio::test]
async fn provider_error_is_a_generic_failure() {
    let addr = spawn_server().await;
    let store = store_for(addr);
    let session = session_for(addr, store.clone());
    session.init().await;

    let outcome = session.login(&Credentials::new("teapot", "x")).await;

    assert!(matches!(outcome, LoginOutcome::Failed(LoginFailure::Remote(_))));
    assert_eq!(outcome.user_message(), Some(MSG_LOGIN_ERROR));
    assert_eq!(session.token(), None);
    assert_eq!(store.read().await.unwrap(), None);
}

#[tokio::test]
async fn logout_erases_cookie_and_clears_session() {
    let addr = spawn_server().await;
    let store = store_for(addr);
    let session = session_for(addr, store.clone());
    session.init().await;
    assert!(session.login(&Credentials::demo()).await.is_success());

    let outcome = session.logout().await;

    assert!(matches!(outcome, LogoutOutcome::Done { redirect: Route::Home }));
    assert_eq!(session.token(), None);
    assert_eq!(store.read().await.unwrap(), None);
}

#[tokio::test]
async fn logout_with_unreachable_store_keeps_session() {
    let addr = spawn_server().await;
    // Nothing listens on the discard port
    let unreachable =
        HttpCredentialStore::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
    let session = session_for(addr, unreachable);
    session.provider().set(SessionToken::new(DEMO_TOKEN));

    let outcome = session.logout().await;

    assert!(matches!(
        outcome,
        LogoutOutcome::Failed(LogoutFailure::Store(StoreError::Transport(_)))
    ));
    assert_eq!(outcome.user_message(), Some(MSG_LOGOUT_ERROR));
    assert_eq!(session.token().unwrap().as_str(), DEMO_TOKEN);
}

#[tokio::test]
async fn new_session_restores_persisted_token() {
    let addr = spawn_server().await;
    let store = store_for(addr);

    let first = session_for(addr, store.clone());
    first.init().await;
    assert!(first.login(&Credentials::demo()).await.is_success());
    drop(first);

    // Same cookie jar, fresh in-memory state
    let second = session_for(addr, store);
    assert_eq!(second.token(), None);
    assert_eq!(second.init().await.unwrap().as_str(), DEMO_TOKEN);
    assert!(second.is_authenticated());
}

#[tokio::test]
async fn init_with_unreachable_store_is_signed_out() {
    let addr = spawn_server().await;
    let unreachable =
        HttpCredentialStore::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
    let session = session_for(addr, unreachable);

    assert_eq!(session.init().await, None);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn session_survives_restart_through_jar_file() {
    let addr = spawn_server().await;
    let jar = temp_jar("restart");

    let first = session_for(addr, jar_store_for(addr, &jar));
    first.init().await;
    assert!(first.login(&Credentials::demo()).await.is_success());
    drop(first);
    assert!(jar.exists());

    // A separate client with its own jar loaded from the same file
    let second = session_for(addr, jar_store_for(addr, &jar));
    assert_eq!(second.init().await.unwrap().as_str(), DEMO_TOKEN);
    assert!(second.is_authenticated());

    let _ = std::fs::remove_dir_all(jar.parent().unwrap());
}

#[tokio::test]
async fn logout_is_remembered_across_restart() {
    let addr = spawn_server().await;
    let jar = temp_jar("logout");

    let first = session_for(addr, jar_store_for(addr, &jar));
    first.init().await;
    assert!(first.login(&Credentials::demo()).await.is_success());
    assert!(first.logout().await.is_done());
    drop(first);

    let second = session_for(addr, jar_store_for(addr, &jar));
    assert_eq!(second.init().await, None);
    assert!(!second.is_authenticated());

    let _ = std::fs::remove_dir_all(jar.parent().unwrap());
}
