use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::credentials::CredentialStore;
use super::login::{Authenticator, Credentials, LoginFlow, LoginOutcome};
use super::logout::{LogoutFlow, LogoutOutcome};
use super::session::{SessionProvider, SessionToken};
use crate::api::REQUEST_TIMEOUT_SECS;

/// Tuning shared by the provider and both flows
#[derive(Debug, Clone, Copy)]
pub struct FlowSettings {
    /// Deadline for each remote call and each credential store operation
    pub operation_timeout: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Everything a UI needs to know about, and do to, the session.
///
/// Built once at startup and handed to whatever composes the views.
pub struct SessionContext<A, S> {
    provider: Arc<SessionProvider<S>>,
    login: LoginFlow<A, S>,
    logout: LogoutFlow<S>,
}

impl<A: Authenticator, S: CredentialStore> SessionContext<A, S> {
    pub fn new(authenticator: A, store: S, settings: FlowSettings) -> Self {
        let provider = Arc::new(SessionProvider::new(
            Arc::new(store),
            settings.operation_timeout,
        ));
        let login = LoginFlow::new(
            Arc::new(authenticator),
            provider.clone(),
            settings.operation_timeout,
        );
        let logout = LogoutFlow::new(provider.clone(), settings.operation_timeout);

        Self {
            provider,
            login,
            logout,
        }
    }

    /// Load the persisted session. Call once at startup.
    pub async fn init(&self) -> Option<SessionToken> {
        self.provider.init().await
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.provider.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.provider.is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionToken>> {
        self.provider.subscribe()
    }

    pub fn provider(&self) -> &Arc<SessionProvider<S>> {
        &self.provider
    }

    pub async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        self.login.submit(credentials).await
    }

    pub fn cancel_login(&self) -> bool {
        self.login.cancel()
    }

    pub fn login_flow(&self) -> &LoginFlow<A, S> {
        &self.login
    }

    pub async fn logout(&self) -> LogoutOutcome {
        self.logout.logout().await
    }

    pub fn logout_flow(&self) -> &LogoutFlow<S> {
        &self.logout
    }
}
