use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use super::credentials::{CredentialStore, StoreError};
use super::session::{SessionToken, SESSION_TTL_SECS};

/// Source of "now" for cookie expiry
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: SessionToken,
    expires_at: DateTime<Utc>,
}

impl StoredCookie {
    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-process stand-in for the cookie jar behind the credential endpoint.
///
/// Applies the same `Max-Age` expiry the browser would. Failures can be
/// switched on to simulate an unreachable endpoint.
pub struct MemoryCredentialStore<C = SystemClock> {
    clock: C,
    slot: Mutex<Option<StoredCookie>>,
    failing: AtomicBool,
}

impl<C: Clock> MemoryCredentialStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            slot: Mutex::new(None),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`]
    pub fn fail_requests(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated transport failure".into()))
        } else {
            Ok(())
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<StoredCookie>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryCredentialStore<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> CredentialStore for MemoryCredentialStore<C> {
    async fn persist(&self, token: &SessionToken) -> Result<(), StoreError> {
        self.check_available()?;
        let expires_at = self.clock.now() + Duration::seconds(SESSION_TTL_SECS);
        *self.slot() = Some(StoredCookie {
            value: token.clone(),
            expires_at,
        });
        Ok(())
    }

    async fn read(&self) -> Result<Option<SessionToken>, StoreError> {
        self.check_available()?;
        let now = self.clock.now();
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(cookie) if cookie.is_live_at(now) => Ok(Some(cookie.value.clone())),
            Some(_) => {
                // Expired cookies are dropped by the jar on the next access
                *slot = None;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn erase(&self) -> Result<(), StoreError> {
        self.check_available()?;
        *self.slot() = None;
        Ok(())
    }
}
