//! Client for the remote identity provider.
//!
//! The storefront data (products, carts, users) comes from the same public
//! demo API; only its login endpoint matters to the session boundary.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::auth::{Authenticator, Credentials, SessionToken};

// ============================================================================
// Constants
// ============================================================================

/// Default login endpoint of the remote identity provider
pub const DEFAULT_AUTH_URL: &str = "https://fakestoreapi.com/auth/login";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// API client for the remote identity provider.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    auth_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(auth_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            auth_url: auth_url.into(),
        })
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Turn a login response body into a token, rejecting anything else
    fn parse_auth_response(body: &str) -> Result<SessionToken, ApiError> {
        let auth: AuthResponse = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("auth response: {}", e)))?;
        SessionToken::new(auth.token)
            .ok_or_else(|| ApiError::InvalidResponse("auth response carried an empty token".into()))
    }
}

impl Authenticator for ApiClient {
    /// Exchange username and password for a bearer token
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, ApiError> {
        let body = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        let response = self
            .client
            .post(&self.auth_url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!("Auth response received");

        Self::parse_auth_response(&text)
    }
}
