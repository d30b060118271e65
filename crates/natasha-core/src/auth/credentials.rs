use std::future::Future;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cookie_store::CookieStore;
use reqwest::{header, Client};
use reqwest_cookie_store::CookieStoreMutex;
use thiserror::Error;
use tracing::{debug, warn};

use super::session::SessionToken;
use crate::api::error::truncate_body;
use crate::wire::{MessageResponse, TokenBody, TokenResponse};

/// Failure to reach or use the credential store.
///
/// Distinct from "no token present", which is `Ok(None)` from [`CredentialStore::read`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Credential endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid credential endpoint response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage unavailable: {0}")]
    Unavailable(String),
}

/// Single-slot persistence for the session token.
///
/// Backed in production by the HTTP-only cookie behind the same-origin
/// endpoint. All three operations are last-writer-wins on one slot.
pub trait CredentialStore: Send + Sync + 'static {
    /// Store the token, replacing whatever was there
    fn persist(&self, token: &SessionToken) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Current token, or `None` when absent or expired
    fn read(&self) -> impl Future<Output = Result<Option<SessionToken>, StoreError>> + Send;

    /// Expire the token immediately. Erasing an empty slot succeeds.
    fn erase(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Credential store talking to the same-origin cookie endpoint.
///
/// The cookie itself lives in the client's cookie jar; this type never sees
/// it directly, only the endpoint's JSON view of it. With a jar file the
/// jar outlives the process, the way a browser profile keeps its cookies.
/// Clone is cheap - reqwest::Client shares its pool and jar through an Arc.
#[derive(Clone)]
pub struct HttpCredentialStore {
    client: Client,
    endpoint: String,
    jar: Arc<CookieStoreMutex>,
    jar_path: Option<PathBuf>,
}

impl HttpCredentialStore {
    /// Store whose cookie jar lives only as long as the process
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        Self::build(endpoint.into(), timeout, CookieStore::default(), None)
    }

    /// Store whose cookie jar is loaded from `path` and written back after
    /// every persist and erase
    pub fn with_jar_file(
        endpoint: impl Into<String>,
        timeout: Duration,
        path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let jar = load_jar(&path);
        Self::build(endpoint.into(), timeout, jar, Some(path))
    }

    fn build(
        endpoint: String,
        timeout: Duration,
        jar: CookieStore,
        jar_path: Option<PathBuf>,
    ) -> Result<Self, StoreError> {
        let jar = Arc::new(CookieStoreMutex::new(jar));
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            jar,
            jar_path,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn jar_path(&self) -> Option<&Path> {
        self.jar_path.as_deref()
    }

    /// Write the jar back to its file, if it has one
    fn save_jar(&self) -> Result<(), StoreError> {
        let Some(path) = &self.jar_path else {
            return Ok(());
        };

        let mut contents = Vec::new();
        {
            let jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
            cookie_store::serde::json::save(&jar, &mut contents)
                .map_err(|e| StoreError::Unavailable(format!("could not encode cookie jar: {e}")))?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("could not create {}: {e}", parent.display())))?;
        }
        std::fs::write(path, contents)
            .map_err(|e| StoreError::Unavailable(format!("could not write {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Cookie jar saved");
        Ok(())
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Status {
                status,
                body: truncate_body(&body),
            })
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

impl CredentialStore for HttpCredentialStore {
    async fn persist(&self, token: &SessionToken) -> Result<(), StoreError> {
        let body = TokenBody {
            token: token.as_str().to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let ack: MessageResponse = Self::decode(response).await?;
        debug!(message = %ack.message, "Token persisted");
        self.save_jar()
    }

    async fn read(&self) -> Result<Option<SessionToken>, StoreError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let response = Self::check_response(response).await?;
        let body: TokenResponse = Self::decode(response).await?;
        Ok(body.token.and_then(SessionToken::new))
    }

    async fn erase(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let ack: MessageResponse = Self::decode(response).await?;
        debug!(message = %ack.message, "Token erased");
        self.save_jar()
    }
}

/// Load a saved jar. Expired cookies are dropped; a missing or unreadable
/// file yields an empty jar.
fn load_jar(path: &Path) -> CookieStore {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return CookieStore::default(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to open cookie jar, starting empty");
            return CookieStore::default();
        }
    };

    match cookie_store::serde::json::load(BufReader::new(file)) {
        Ok(jar) => jar,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to parse cookie jar, starting empty");
            CookieStore::default()
        }
    }
}
