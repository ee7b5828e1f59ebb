//! User session model and the shared session store.

use crate::store::{keys, DurableCache};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Account status as reported by the backend (or derived locally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Trial,
    Activated,
    Expired,
}

/// Snapshot of the logged-in user.
///
/// Created from a login/registration response, downgraded when the trial is
/// consumed, upgraded on activation, and cleared on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub display_name: String,
    pub email: String,
    pub status: UserStatus,
    /// Derived from `status` + trial state, cached for fast checks.
    pub has_access: bool,
    pub is_admin: bool,
}

impl UserSession {
    /// Build a session from an auth response.
    pub fn new(display_name: String, email: String, status: UserStatus, is_admin: bool) -> Self {
        let has_access = !matches!(status, UserStatus::Expired);
        Self {
            display_name,
            email,
            status,
            has_access,
            is_admin,
        }
    }
}

/// Shared, cache-backed holder for the current user session.
///
/// This is the explicit state container the components get injected with;
/// there is no global app-state object.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Option<UserSession>>>,
    cache: DurableCache,
}

impl SessionStore {
    /// Create an empty store, then try to restore a persisted snapshot.
    pub fn new(cache: DurableCache) -> Self {
        let restored: Option<UserSession> = cache.load(keys::USER_SNAPSHOT);
        Self {
            inner: Arc::new(Mutex::new(restored)),
            cache,
        }
    }

    /// Current session, if logged in.
    pub fn snapshot(&self) -> Option<UserSession> {
        self.inner.lock().expect("session store poisoned").clone()
    }

    /// Replace the session (login/registration) and persist it.
    pub fn set(&self, session: UserSession) {
        self.cache.save(keys::USER_SNAPSHOT, &session);
        *self.inner.lock().expect("session store poisoned") = Some(session);
    }

    /// Mutate the session in place and persist the result.
    ///
    /// No-op when logged out.
    pub fn update<F: FnOnce(&mut UserSession)>(&self, f: F) {
        let mut guard = self.inner.lock().expect("session store poisoned");
        if let Some(session) = guard.as_mut() {
            f(session);
            self.cache.save(keys::USER_SNAPSHOT, session);
        }
    }

    /// Drop the session and its cache entry (logout).
    pub fn clear(&self) {
        self.cache.remove(keys::USER_SNAPSHOT);
        *self.inner.lock().expect("session store poisoned") = None;
    }
}
