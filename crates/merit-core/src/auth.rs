//! Authentication state with change notifications.
//!
//! The API client owns the bearer token and signed-in user, persisted in the
//! device key-value store. Interested parties subscribe to [`AuthEvent`]s
//! instead of listening on a global event bus.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::{ApiError, ApiResult};
use crate::error::Result;
use crate::models::lenient_id;
use crate::storage::{SharedStore, AUTH_TOKEN_KEY, USER_KEY};

const EVENT_CAPACITY: usize = 16;

/// Length of the emailed one-time login code
pub const LOGIN_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Published whenever the session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn(AuthUser),
    LoggedOut,
}

/// Persisted session plus a broadcast channel of [`AuthEvent`]s.
#[derive(Clone)]
pub struct AuthState {
    inner: Arc<AuthStateInner>,
}

struct AuthStateInner {
    store: SharedStore,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthState {
    pub fn new(store: SharedStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(AuthStateInner { store, events }),
        }
    }

    /// Receive every future session change.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Stored bearer token, if any. Unreadable storage counts as signed out.
    pub fn token(&self) -> Option<String> {
        match self.inner.store.get(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(error) => {
                tracing::warn!("Failed to read auth token: {}", error);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        let raw = match self.inner.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Failed to read stored user: {}", error);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|error| tracing::warn!("Ignoring corrupt stored user: {}", error))
            .ok()
    }

    /// Persist a new session and announce [`AuthEvent::LoggedIn`].
    pub fn set_session(&self, session: &AuthSession) -> Result<()> {
        self.inner.store.set(AUTH_TOKEN_KEY, &session.token)?;
        self.inner
            .store
            .set(USER_KEY, &serde_json::to_string(&session.user)?)?;
        self.publish(AuthEvent::LoggedIn(session.user.clone()));
        Ok(())
    }

    /// Forget the session and announce [`AuthEvent::LoggedOut`].
    pub fn clear(&self) -> Result<()> {
        self.inner.store.remove(AUTH_TOKEN_KEY)?;
        self.inner.store.remove(USER_KEY)?;
        self.publish(AuthEvent::LoggedOut);
        Ok(())
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

/// Trim and check an email address: `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> ApiResult<&str> {
    let email = email.trim();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .rsplit_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    }) && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(email)
    } else {
        Err(ApiError::Rejected(format!("invalid email address: {email}")))
    }
}

/// Trim and check a login code: exactly six ASCII digits.
pub fn validate_login_code(code: &str) -> ApiResult<&str> {
    let code = code.trim();
    if code.len() == LOGIN_CODE_LEN && code.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(ApiError::Rejected(format!(
            "login code must be {LOGIN_CODE_LEN} digits"
        )))
    }
}
