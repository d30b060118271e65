//! Application state management for the natasha console.
//!
//! This module contains the core `App` struct: UI state, the login form, and
//! coordination of the session flows, which run as background tasks and
//! report back over a channel so the screen stays live while they are pending.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use natasha_core::auth::login::MSG_MISSING_FIELDS;
use natasha_core::{
    ApiClient, Config, Credentials, HeaderAction, HeaderLinks, HttpCredentialStore, LiveSession,
    LoginOutcome, LogoutOutcome, Route, SessionContext, SessionToken,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// At most one login, one logout and the startup read are in flight at once.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Views reachable from the number keys, in header order
pub const NAV_ROUTES: [Route; 5] = [
    Route::Home,
    Route::Dashboard,
    Route::Users,
    Route::Carts,
    Route::Contact,
];

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
    Demo,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Demo,
            LoginFocus::Demo => LoginFocus::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Demo,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
            LoginFocus::Demo => LoginFocus::Button,
        }
    }
}

/// How the status bar should present a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned session tasks.
enum TaskResult {
    /// The persisted session was read at startup
    SessionLoaded(bool),
    Login {
        username: String,
        outcome: LoginOutcome,
    },
    Logout(LogoutOutcome),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    /// Where `config` is written back; `None` keeps it in memory only
    config_path: Option<PathBuf>,
    session: Arc<LiveSession>,
    session_rx: watch::Receiver<Option<SessionToken>>,

    // UI State
    pub state: AppState,
    pub current_route: Route,
    pub has_session: bool,
    /// False until the persisted session has been read
    pub session_ready: bool,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    pub logout_pending: bool,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    // Status message
    pub status: Option<StatusMessage>,
}

impl App {
    /// Create a new application instance wired to the configured endpoints
    pub fn new(config: Config) -> Result<Self> {
        let timeout = config.request_timeout();
        let api = ApiClient::new(config.auth_url.clone(), timeout)?;
        let store = match Config::cookie_jar_path() {
            Ok(path) => {
                HttpCredentialStore::with_jar_file(config.credential_url.clone(), timeout, path)?
            }
            Err(e) => {
                warn!(error = %e, "No cache directory, cookies will not outlive this run");
                HttpCredentialStore::new(config.credential_url.clone(), timeout)?
            }
        };
        debug!(
            credential_url = %store.endpoint(),
            cookie_jar = ?store.jar_path(),
            auth_url = %api.auth_url(),
            "Endpoints configured"
        );

        let session = SessionContext::new(api, store, config.flow_settings());
        let mut app = Self::with_session(config, Arc::new(session));
        app.config_path = Config::config_path().ok();
        Ok(app)
    }

    pub fn with_session(config: Config, session: Arc<LiveSession>) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.subscribe();
        let has_session = session.is_authenticated();

        // Get credentials from env vars or config
        let login_username = std::env::var("NATASHA_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        let login_password = std::env::var("NATASHA_PASSWORD").unwrap_or_default();

        Self {
            config,
            config_path: None,
            session,
            session_rx,

            state: AppState::Normal,
            current_route: Route::Home,
            has_session,
            session_ready: false,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,
            login_pending: false,

            logout_pending: false,

            task_rx,
            task_tx,

            status: None,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Read the persisted session in the background
    pub fn start_session_init(&self) {
        let session = self.session.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let token = session.init().await;
            Self::send_result(&tx, TaskResult::SessionLoaded(token.is_some())).await;
        });
    }

    /// Pick up session changes published by the flows
    pub fn sync_session(&mut self) {
        match self.session_rx.has_changed() {
            Ok(true) => {}
            Ok(false) => return,
            Err(_) => {
                warn!("Session channel closed");
                return;
            }
        }

        let has_session = self.session_rx.borrow_and_update().is_some();
        if has_session != self.has_session {
            debug!(has_session, "Session changed");
        }
        self.has_session = has_session;
        self.apply_route_guard();
    }

    fn apply_route_guard(&mut self) {
        if !self.session_ready {
            return;
        }
        let resolved = self.current_route.resolve(self.has_session);
        if resolved != self.current_route {
            debug!(from = ?self.current_route, to = ?resolved, "Route redirected");
            self.current_route = resolved;
        }
        if self.current_route != Route::Login && self.state == AppState::LoggingIn {
            self.state = AppState::Normal;
        }
    }

    pub fn header(&self) -> HeaderLinks {
        HeaderLinks::for_session(self.has_session, self.current_route)
    }

    // =========================================================================
    // Status bar
    // =========================================================================

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level: StatusLevel::Info,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level: StatusLevel::Error,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to `route`, subject to the session guard
    pub fn navigate(&mut self, route: Route) {
        if route == Route::Login {
            self.start_login();
            return;
        }

        self.current_route = route;
        if self.session_ready && route.resolve(self.has_session) != route {
            self.set_error(format!("Login to view {}", route.title()));
        }
        self.apply_route_guard();
    }

    pub fn next_route(&mut self) {
        self.step_route(true);
    }

    pub fn prev_route(&mut self) {
        self.step_route(false);
    }

    /// Move through the header links, which only list reachable views
    fn step_route(&mut self, forward: bool) {
        let links = self.header().links;
        let len = links.len();
        let current = links
            .iter()
            .position(|r| *r == self.current_route)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.navigate(links[next]);
    }

    /// Trigger whichever action the header offers
    pub fn header_action(&mut self) {
        match self.header().action {
            Some(HeaderAction::Login) => self.start_login(),
            Some(HeaderAction::Logout) => self.submit_logout(),
            None => {}
        }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Show the login form
    pub fn start_login(&mut self) {
        if self.has_session {
            self.current_route = Route::Home;
            return;
        }
        self.current_route = Route::Login;
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Leave the login form, abandoning any attempt in flight
    pub fn close_login(&mut self) {
        if self.login_pending && self.session.cancel_login() {
            info!("Login attempt cancelled");
        }
        self.state = AppState::Normal;
        self.current_route = Route::Home;
    }

    /// Fill the form with the public demo account
    pub fn autofill_demo(&mut self) {
        let demo = Credentials::demo();
        self.login_username = demo.username;
        self.login_password = demo.password;
        self.login_focus = LoginFocus::Button;
        self.login_error = None;
    }

    /// The form fields exactly as typed
    fn form_credentials(&self) -> Credentials {
        Credentials::new(self.login_username.clone(), self.login_password.clone())
    }

    /// Submit the login form in the background
    pub fn submit_login(&mut self) {
        if self.login_pending {
            debug!("Login already pending, ignoring submit");
            return;
        }

        let credentials = self.form_credentials();
        if !credentials.is_complete() {
            self.login_error = Some(MSG_MISSING_FIELDS.to_string());
            return;
        }

        self.login_error = None;
        self.login_pending = true;

        let session = self.session.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = session.login(&credentials).await;
            let result = TaskResult::Login {
                username: credentials.username,
                outcome,
            };
            Self::send_result(&tx, result).await;
        });
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Sign out in the background
    pub fn submit_logout(&mut self) {
        if !self.has_session || self.logout_pending {
            return;
        }
        self.logout_pending = true;
        self.set_info("Logging out...");

        let session = self.session.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = session.logout().await;
            Self::send_result(&tx, TaskResult::Logout(outcome)).await;
        });
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("Task result dropped - app is shutting down");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        self.sync_session();
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
    }

    /// Wait for the next task result, up to `timeout`.
    ///
    /// Returns false if nothing arrived in time.
    pub async fn wait_for_task(&mut self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.task_rx.recv()).await {
            Ok(Some(result)) => {
                self.sync_session();
                self.process_task_result(result);
                true
            }
            _ => false,
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::SessionLoaded(found) => {
                debug!(found, "Persisted session loaded");
                self.session_ready = true;
                self.apply_route_guard();
            }
            TaskResult::Login { username, outcome } => {
                self.login_pending = false;
                self.process_login_outcome(username, outcome);
            }
            TaskResult::Logout(outcome) => {
                self.logout_pending = false;
                match outcome {
                    LogoutOutcome::Done { redirect } => {
                        self.set_info("Logged out");
                        self.navigate(redirect);
                    }
                    // Session untouched; pressing the key again retries
                    LogoutOutcome::Failed(_) => {
                        if let Some(msg) = outcome.user_message() {
                            self.set_error(msg);
                        }
                    }
                    LogoutOutcome::Ignored => {}
                }
            }
        }
    }

    fn process_login_outcome(&mut self, username: String, outcome: LoginOutcome) {
        match outcome {
            LoginOutcome::Success { redirect } => {
                self.config.last_username = Some(username);
                if let Some(path) = &self.config_path {
                    if let Err(e) = self.config.save_to(path) {
                        warn!(error = %e, "Failed to save config");
                    }
                }

                self.login_password.clear();
                if let Some(msg) = outcome.user_message() {
                    self.set_info(msg);
                }
                self.state = AppState::Normal;
                self.navigate(redirect);
            }
            LoginOutcome::Failed(_) | LoginOutcome::Incomplete => {
                self.login_error = outcome.user_message().map(str::to_string);
            }
            LoginOutcome::Ignored | LoginOutcome::Cancelled => {}
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
