//! Authentication module for managing the operator session.
//!
//! This module provides:
//! - `SessionProvider`: the in-process "current token" cell
//! - `CredentialStore`: persistence of the token behind an HTTP-only cookie
//! - `LoginFlow` / `LogoutFlow`: the only writers of the session
//! - `SessionContext`: the three bundled together for a UI
//!
//! Tokens live for 7 days in the cookie and are never refreshed.

pub mod context;
pub mod credentials;
pub mod login;
pub mod logout;
pub mod memory;
pub mod session;

use std::sync::{Mutex, MutexGuard};

pub use context::{FlowSettings, SessionContext};
pub use credentials::{CredentialStore, HttpCredentialStore, StoreError};
pub use login::{Authenticator, Credentials, LoginFailure, LoginFlow, LoginOutcome, LoginState};
pub use logout::{LogoutFailure, LogoutFlow, LogoutOutcome, LogoutState};
pub use memory::{Clock, ManualClock, MemoryCredentialStore, SystemClock};
pub use session::{SessionProvider, SessionToken, SESSION_COOKIE_NAME, SESSION_TTL_SECS};

/// Lock a flow mutex, recovering the value if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
