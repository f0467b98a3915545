//! In-memory bearer-token holder.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `Session` per API client. The access token never leaves memory; the
//! long-lived refresh token stays in the HTTP cookie store and is opaque here.
//! Construct a fresh session per client (and per test) instead of sharing one.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct AccessToken {
    value: String,
    issued_at: Instant,
    lifetime: Duration,
}

/// Current access token, if any, plus its expiry bookkeeping.
#[derive(Default)]
pub struct Session {
    token: RwLock<Option<AccessToken>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored token. Overwrites any previous token.
    pub fn set_token(&self, value: impl Into<String>, expires_in_secs: u64) {
        self.set_token_at(value, expires_in_secs, Instant::now());
    }

    fn set_token_at(&self, value: impl Into<String>, expires_in_secs: u64, issued_at: Instant) {
        let token = AccessToken {
            value: value.into(),
            issued_at,
            lifetime: Duration::from_secs(expires_in_secs),
        };
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Token to send as `Authorization: Bearer <token>`.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.value.clone())
    }

    pub fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// True when a token is held and its lifetime has elapsed.
    ///
    /// Nothing refreshes automatically on expiry; this is informational.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| now.saturating_duration_since(t.issued_at) >= t.lifetime)
    }

    /// Time left before the token expires. `None` when no token is held.
    pub fn remaining(&self) -> Option<Duration> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.lifetime.saturating_sub(t.issued_at.elapsed()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.has_token())
            .field("remaining", &self.remaining())
            .finish()
    }
}
