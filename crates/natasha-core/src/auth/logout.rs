use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use super::credentials::{CredentialStore, StoreError};
use super::lock;
use super::session::SessionProvider;
use crate::nav::Route;

pub const MSG_LOGOUT_FAILED: &str = "Failed to logout. Please try again.";
pub const MSG_LOGOUT_ERROR: &str = "An error occurred during logout. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutState {
    Idle,
    Clearing,
    Done,
    /// Last attempt failed; the session is untouched and logout may be retried
    Failure,
}

#[derive(Error, Debug)]
pub enum LogoutFailure {
    #[error("could not erase token: {0}")]
    Store(StoreError),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl LogoutFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            // The endpoint answered but refused
            LogoutFailure::Store(StoreError::Status { .. }) => MSG_LOGOUT_FAILED,
            _ => MSG_LOGOUT_ERROR,
        }
    }
}

#[derive(Debug)]
pub enum LogoutOutcome {
    /// Token erased and session cleared; navigate to `redirect`
    Done { redirect: Route },
    Failed(LogoutFailure),
    /// Another logout was already in flight
    Ignored,
}

impl LogoutOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, LogoutOutcome::Done { .. })
    }

    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            LogoutOutcome::Failed(failure) => Some(failure.user_message()),
            LogoutOutcome::Done { .. } | LogoutOutcome::Ignored => None,
        }
    }
}

/// Erase the persisted token, then clear the session.
///
/// The session is only cleared once the store confirms the erase, so the UI
/// never shows "signed out" while the cookie survives.
pub struct LogoutFlow<S> {
    provider: Arc<SessionProvider<S>>,
    state: Mutex<LogoutState>,
    timeout: Duration,
}

struct ClearingSlot<'a> {
    state: &'a Mutex<LogoutState>,
}

impl Drop for ClearingSlot<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if *state == LogoutState::Clearing {
            *state = LogoutState::Idle;
        }
    }
}

impl<S: CredentialStore> LogoutFlow<S> {
    pub fn new(provider: Arc<SessionProvider<S>>, timeout: Duration) -> Self {
        Self {
            provider,
            state: Mutex::new(LogoutState::Idle),
            timeout,
        }
    }

    pub fn state(&self) -> LogoutState {
        *lock(&self.state)
    }

    pub fn is_clearing(&self) -> bool {
        self.state() == LogoutState::Clearing
    }

    /// Run one logout attempt. Calling it again after a failure is the retry.
    pub async fn logout(&self) -> LogoutOutcome {
        {
            let mut state = lock(&self.state);
            if *state == LogoutState::Clearing {
                debug!("Logout already in progress, ignoring request");
                return LogoutOutcome::Ignored;
            }
            *state = LogoutState::Clearing;
        }
        let _slot = ClearingSlot { state: &self.state };

        info!("Logging out");

        let failure = match tokio::time::timeout(self.timeout, self.provider.store().erase()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to erase session token");
                Some(LogoutFailure::Store(e))
            }
            Err(_) => {
                error!(timeout_secs = self.timeout.as_secs(), "Timed out erasing session token");
                Some(LogoutFailure::TimedOut(self.timeout))
            }
        };

        if let Some(failure) = failure {
            *lock(&self.state) = LogoutState::Failure;
            return LogoutOutcome::Failed(failure);
        }

        self.provider.set(None);
        *lock(&self.state) = LogoutState::Done;
        info!("Logout successful");

        LogoutOutcome::Done {
            redirect: Route::Home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::{ManualClock, MemoryCredentialStore};
    use crate::auth::SessionToken;

    type Store = MemoryCredentialStore<ManualClock>;

    async fn signed_in() -> (Arc<Store>, Arc<SessionProvider<Store>>, LogoutFlow<Store>) {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        let token = SessionToken::new("abc123").unwrap();
        store.persist(&token).await.unwrap();

        let provider = Arc::new(SessionProvider::new(store.clone(), Duration::from_secs(5)));
        provider.init().await;
        assert_eq!(provider.get(), Some(token));

        let flow = LogoutFlow::new(provider.clone(), Duration::from_secs(5));
        (store, provider, flow)
    }

    #[tokio::test]
    async fn test_logout_erases_and_clears() {
        let (store, provider, flow) = signed_in().await;

        let outcome = flow.logout().await;

        assert!(matches!(outcome, LogoutOutcome::Done { redirect: Route::Home }));
        assert_eq!(store.read().await.unwrap(), None);
        assert_eq!(provider.get(), None);
        assert_eq!(flow.state(), LogoutState::Done);
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_session() {
        let (store, provider, flow) = signed_in().await;
        store.fail_requests(true);

        let outcome = flow.logout().await;

        assert!(matches!(outcome, LogoutOutcome::Failed(LogoutFailure::Store(_))));
        assert_eq!(outcome.user_message(), Some(MSG_LOGOUT_ERROR));
        assert_eq!(provider.get().unwrap().as_str(), "abc123");
        assert_eq!(flow.state(), LogoutState::Failure);

        // Retry once the endpoint is back
        store.fail_requests(false);
        assert!(flow.logout().await.is_done());
        assert_eq!(provider.get(), None);
    }

    #[tokio::test]
    async fn test_logout_when_signed_out_succeeds() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        let provider = Arc::new(SessionProvider::new(store, Duration::from_secs(5)));
        let flow = LogoutFlow::new(provider.clone(), Duration::from_secs(5));

        assert!(flow.logout().await.is_done());
        assert!(flow.logout().await.is_done());
        assert_eq!(provider.get(), None);
    }

    #[test]
    fn test_status_failure_message() {
        let failure = LogoutFailure::Store(StoreError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(failure.user_message(), MSG_LOGOUT_FAILED);
        assert_eq!(
            LogoutFailure::TimedOut(Duration::from_secs(30)).user_message(),
            MSG_LOGOUT_ERROR
        );
    }
}
