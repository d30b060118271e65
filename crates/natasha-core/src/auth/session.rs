use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;

/// Cookie name the same-origin endpoint stores the token under
pub const SESSION_COOKIE_NAME: &str = "authToken";

/// Session lifetime in seconds (7 days).
/// Enforced only by cookie expiry; the client never tracks issue time.
pub const SESSION_TTL_SECS: i64 = 604_800;

/// Opaque bearer token issued by the remote identity provider.
///
/// Never parsed or inspected. `Debug` is redacted so tokens stay out of logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token. Empty strings are not tokens.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Holder of the current session token for one process.
///
/// Starts empty, is filled once from the credential store by [`init`](Self::init),
/// and is written afterwards only by the login and logout flows. Readers can
/// [`subscribe`](Self::subscribe) to re-render when the value changes.
pub struct SessionProvider<S> {
    store: Arc<S>,
    cell: watch::Sender<Option<SessionToken>>,
    initialized: AtomicBool,
    /// Raised by `set`; once up, `init` leaves the cell alone.
    overridden: AtomicBool,
    read_timeout: Duration,
}

impl<S: CredentialStore> SessionProvider<S> {
    pub fn new(store: Arc<S>, read_timeout: Duration) -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            store,
            cell,
            initialized: AtomicBool::new(false),
            overridden: AtomicBool::new(false),
            read_timeout,
        }
    }

    /// Load the persisted token into the cell. Runs once per process.
    ///
    /// A failed or stalled read leaves the session empty and is logged,
    /// never propagated. A value written by [`set`](Self::set) before the
    /// read lands is kept.
    pub async fn init(&self) -> Option<SessionToken> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Session provider already initialized");
            return self.get();
        }

        let token = match tokio::time::timeout(self.read_timeout, self.store.read()).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read session from credential store");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.read_timeout.as_secs(),
                    "Timed out reading session from credential store"
                );
                None
            }
        };

        // Checked and written under the cell's lock, same as `set`
        let applied = self.cell.send_if_modified(|current| {
            if self.overridden.load(Ordering::SeqCst) {
                return false;
            }
            *current = token.clone();
            true
        });

        if !applied {
            debug!("Session changed while loading, keeping newer value");
            return self.get();
        }

        info!(authenticated = token.is_some(), "Session loaded");
        token
    }

    /// Current token, or `None` when signed out or before `init` resolves.
    pub fn get(&self) -> Option<SessionToken> {
        self.cell.borrow().clone()
    }

    /// Overwrite the cell. Does not touch the credential store.
    pub fn set(&self, token: Option<SessionToken>) {
        self.cell.send_modify(|current| {
            self.overridden.store(true, Ordering::SeqCst);
            *current = token;
        });
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.borrow().is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Receiver notified on every change of the cell
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionToken>> {
        self.cell.subscribe()
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::{ManualClock, MemoryCredentialStore};

    fn token(value: &str) -> SessionToken {
        SessionToken::new(value).expect("non-empty test token")
    }

    #[test]
    fn test_session_token_rejects_empty() {
        assert!(SessionToken::new("").is_none());
        assert_eq!(token("abc123").as_str(), "abc123");
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let debug = format!("{:?}", token("super-secret"));
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_get_before_init_is_none() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        store.persist(&token("abc123")).await.unwrap();

        let provider = SessionProvider::new(store, Duration::from_secs(5));
        let mut rx = provider.subscribe();

        // Early readers see "none" even though a cookie exists
        assert_eq!(provider.get(), None);
        assert!(!provider.is_initialized());

        provider.init().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clone(), Some(token("abc123")));
        assert_eq!(provider.get(), Some(token("abc123")));
    }

    #[tokio::test]
    async fn test_init_failure_leaves_session_empty() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        store.persist(&token("abc123")).await.unwrap();
        store.fail_requests(true);

        let provider = SessionProvider::new(store, Duration::from_secs(5));
        assert_eq!(provider.init().await, None);
        assert_eq!(provider.get(), None);
        assert!(provider.is_initialized());
    }

    #[tokio::test]
    async fn test_init_runs_once() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        let provider = SessionProvider::new(store.clone(), Duration::from_secs(5));
        assert_eq!(provider.init().await, None);

        // A cookie appearing later is not picked up without a fresh process
        store.persist(&token("late")).await.unwrap();
        assert_eq!(provider.init().await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_notifies() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        let provider = SessionProvider::new(store.clone(), Duration::from_secs(5));
        let mut rx = provider.subscribe();

        provider.set(Some(token("abc123")));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clone(), Some(token("abc123")));
        assert!(provider.is_authenticated());

        provider.set(None);
        assert_eq!(provider.get(), None);

        // The provider never writes through to the store
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_before_init_is_kept() {
        let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
        store.persist(&token("stale")).await.unwrap();
        let provider = SessionProvider::new(store, Duration::from_secs(5));

        provider.set(None);

        assert_eq!(provider.init().await, None);
        assert_eq!(provider.get(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_set_always_wins_over_init() {
        for _ in 0..200 {
            let store = Arc::new(MemoryCredentialStore::new(ManualClock::default()));
            store.persist(&token("stale")).await.unwrap();
            let provider = Arc::new(SessionProvider::new(store, Duration::from_secs(5)));

            let loader = tokio::spawn({
                let provider = provider.clone();
                async move { provider.init().await }
            });
            provider.set(Some(token("fresh")));
            loader.await.unwrap();

            assert_eq!(provider.get(), Some(token("fresh")));
        }
    }
}
