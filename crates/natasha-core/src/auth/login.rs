use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::credentials::{CredentialStore, StoreError};
use super::lock;
use super::session::{SessionProvider, SessionToken};
use crate::api::ApiError;
use crate::nav::Route;

pub const MSG_LOGIN_SUCCESS: &str = "Login successful!";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MSG_LOGIN_ERROR: &str = "An error occurred during login";
pub const MSG_MISSING_FIELDS: &str = "Username and password required";

/// Demo account published by the remote storefront API
const DEMO_USERNAME: &str = "mor_2314";
const DEMO_PASSWORD: &str = "83r5^_";

/// Username and password as typed by the operator
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The public demo account, for the login form's autofill
    pub fn demo() -> Self {
        Self::new(DEMO_USERNAME, DEMO_PASSWORD)
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Remote identity provider
pub trait Authenticator: Send + Sync + 'static {
    /// Exchange credentials for a bearer token.
    ///
    /// An explicit refusal must come back as an error for which
    /// [`ApiError::is_rejection`] is true.
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SessionToken, ApiError>> + Send;
}

/// Login flow state.
///
/// A failed attempt is reported through [`LoginOutcome::Failed`]; by the time
/// the caller sees it the flow is back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Success,
}

#[derive(Error, Debug)]
pub enum LoginFailure {
    #[error("credentials rejected")]
    InvalidCredentials,

    #[error("identity provider error: {0}")]
    Remote(ApiError),

    #[error("could not persist token: {0}")]
    Store(StoreError),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl LoginFailure {
    /// One of exactly two messages shown to the operator
    pub fn user_message(&self) -> &'static str {
        match self {
            LoginFailure::InvalidCredentials => MSG_INVALID_CREDENTIALS,
            _ => MSG_LOGIN_ERROR,
        }
    }
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Token persisted and session set; navigate to `redirect`
    Success { redirect: Route },
    Failed(LoginFailure),
    /// A field was empty; nothing was submitted
    Incomplete,
    /// Another attempt was already in flight
    Ignored,
    /// Abandoned through [`LoginFlow::cancel`] before a token arrived
    Cancelled,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }

    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            LoginOutcome::Success { .. } => Some(MSG_LOGIN_SUCCESS),
            LoginOutcome::Failed(failure) => Some(failure.user_message()),
            LoginOutcome::Incomplete => Some(MSG_MISSING_FIELDS),
            LoginOutcome::Ignored | LoginOutcome::Cancelled => None,
        }
    }
}

/// Remote login, then persist, then update the session. Strictly in that order.
pub struct LoginFlow<A, S> {
    authenticator: Arc<A>,
    provider: Arc<SessionProvider<S>>,
    state: Mutex<LoginState>,
    pending: Mutex<Option<CancellationToken>>,
    timeout: Duration,
}

/// Releases the pending slot even if the submitting future is dropped
struct PendingSlot<'a> {
    state: &'a Mutex<LoginState>,
    pending: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        *lock(self.pending) = None;
        let mut state = lock(self.state);
        if *state == LoginState::Submitting {
            *state = LoginState::Idle;
        }
    }
}

impl<A: Authenticator, S: CredentialStore> LoginFlow<A, S> {
    pub fn new(authenticator: Arc<A>, provider: Arc<SessionProvider<S>>, timeout: Duration) -> Self {
        Self {
            authenticator,
            provider,
            state: Mutex::new(LoginState::Idle),
            pending: Mutex::new(None),
            timeout,
        }
    }

    pub fn state(&self) -> LoginState {
        *lock(&self.state)
    }

    /// True while an attempt is in flight; the form should refuse resubmission
    pub fn is_submitting(&self) -> bool {
        self.state() == LoginState::Submitting
    }

    /// Run one login attempt to completion.
    pub async fn submit(&self, credentials: &Credentials) -> LoginOutcome {
        if !credentials.is_complete() {
            return LoginOutcome::Incomplete;
        }

        let Some(cancel) = self.begin() else {
            debug!("Login already in progress, ignoring submission");
            return LoginOutcome::Ignored;
        };
        let _slot = PendingSlot {
            state: &self.state,
            pending: &self.pending,
        };

        let outcome = self.run(credentials, &cancel).await;
        if outcome.is_success() {
            *lock(&self.state) = LoginState::Success;
        }
        outcome
    }

    /// Abandon the in-flight attempt, if any. Returns whether one was pending.
    ///
    /// Only the remote call can be abandoned. Once a token has arrived the
    /// attempt finishes so the store and the session never disagree.
    pub fn cancel(&self) -> bool {
        match lock(&self.pending).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn begin(&self) -> Option<CancellationToken> {
        let mut state = lock(&self.state);
        if *state == LoginState::Submitting {
            return None;
        }
        *state = LoginState::Submitting;

        let cancel = CancellationToken::new();
        *lock(&self.pending) = Some(cancel.clone());
        Some(cancel)
    }

    async fn run(&self, credentials: &Credentials, cancel: &CancellationToken) -> LoginOutcome {
        info!(username = %credentials.username, "Submitting login");

        let remote = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Login cancelled");
                return LoginOutcome::Cancelled;
            }
            result = tokio::time::timeout(self.timeout, self.authenticator.authenticate(credentials)) => result,
        };

        let token = match remote {
            Ok(Ok(token)) => token,
            Ok(Err(e)) if e.is_rejection() => {
                warn!(error = %e, "Credentials rejected");
                return LoginOutcome::Failed(LoginFailure::InvalidCredentials);
            }
            Ok(Err(e)) => {
                error!(error = %e, "Login failed");
                return LoginOutcome::Failed(LoginFailure::Remote(e));
            }
            Err(_) => {
                error!(timeout_secs = self.timeout.as_secs(), "Login timed out");
                return LoginOutcome::Failed(LoginFailure::TimedOut(self.timeout));
            }
        };

        match tokio::time::timeout(self.timeout, self.provider.store().persist(&token)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "Failed to persist session token");
                return LoginOutcome::Failed(LoginFailure::Store(e));
            }
            Err(_) => {
                error!(timeout_secs = self.timeout.as_secs(), "Timed out persisting session token");
                return LoginOutcome::Failed(LoginFailure::TimedOut(self.timeout));
            }
        }

        self.provider.set(Some(token));
        info!("Login successful");

        LoginOutcome::Success {
            redirect: Route::Home,
        }
    }
}
