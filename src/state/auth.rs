//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by protected views to decide between rendering, waiting and
//! redirecting to login, and by the login/register forms to drive
//! transitions.
//!
//! DESIGN
//! ======
//! `AuthStore` owns the API client and publishes [`AuthState`] through a
//! `watch` channel. Every operation takes a ticket from a monotonically
//! increasing counter; a response only lands if no newer operation has
//! started since, so out-of-order responses cannot overwrite fresher state.
//! The bearer token is committed in the same step as the state, so a
//! discarded response leaves the token alone too. Settled states keep one
//! invariant: a token is held exactly when `authenticated` is set.
//! The caller always gets its own result back.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use crate::error::{ApiError, ErrorCode};
use crate::net::api::AuthApi;
use crate::net::types::{AuthPayload, LoginRequest, RegisterRequest, User};

/// Coarse phase derived from [`AuthState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup check or a first login still pending.
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Authentication state tracking the current user and loading status.
///
/// `authenticated` implies `user.is_some()`; the constructors are the only
/// way the store builds settled states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
    pub authenticated: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

impl AuthState {
    /// State at application start, before the refresh check resolves.
    #[must_use]
    pub fn initial() -> Self {
        Self { user: None, loading: true, authenticated: false }
    }

    #[must_use]
    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user), loading: false, authenticated: true }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None, loading: false, authenticated: false }
    }

    pub fn phase(&self) -> AuthPhase {
        if self.authenticated && self.user.is_some() {
            AuthPhase::Authenticated
        } else if self.loading {
            AuthPhase::Unknown
        } else {
            AuthPhase::Unauthenticated
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Token change that lands together with a state transition.
enum TokenUpdate {
    Store { access_token: String, expires_in: u64 },
    Clear,
}

/// Holder of [`AuthState`]; the only place that mutates it.
pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    state: watch::Sender<AuthState>,
    started: AtomicBool,
    latest_op: AtomicU64,
}

impl AuthStore {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        Self { api, state, started: AtomicBool::new(false), latest_op: AtomicU64::new(0) }
    }

    pub fn api(&self) -> &Arc<dyn AuthApi> {
        &self.api
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait until no operation holds `loading`, then return that state.
    pub async fn wait_settled(&self) -> AuthState {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.state(),
        }
    }

    /// Startup transition. Runs [`check_auth`](Self::check_auth) on the first
    /// call only; later calls wait for the state to settle.
    pub async fn initialize(&self) -> AuthState {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.wait_settled().await;
        }
        self.check_auth().await
    }

    /// Try to restore the session from the refresh cookie.
    ///
    /// Failure is not an error here: it settles to signed-out.
    pub async fn check_auth(&self) -> AuthState {
        let ticket = self.begin(false);
        match self.api.refresh().await {
            Ok(payload) => {
                tracing::info!(user_id = %payload.user.id, "session restored");
                self.settle_signed_in(ticket, payload);
            }
            Err(e) => {
                tracing::debug!(error = %e, "no session to restore");
                self.settle(ticket, AuthState::signed_out(), TokenUpdate::Clear);
            }
        }
        self.state()
    }

    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend; state is then signed-out.
    pub async fn login(&self, req: LoginRequest) -> Result<(), ApiError> {
        let ticket = self.begin(true);
        let result = self.api.login(&req).await;
        self.finish_sign_in(ticket, "login", result)
    }

    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend; state is then signed-out.
    pub async fn register(&self, req: RegisterRequest) -> Result<(), ApiError> {
        let ticket = self.begin(true);
        let result = self.api.register(&req).await;
        self.finish_sign_in(ticket, "register", result)
    }

    /// Always ends signed-out with the token cleared; a failed server call is
    /// logged and dropped.
    pub async fn logout(&self) {
        let ticket = self.begin(false);
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout failed server-side");
        }
        self.settle(ticket, AuthState::signed_out(), TokenUpdate::Clear);
    }

    fn finish_sign_in(
        &self,
        ticket: u64,
        op: &'static str,
        result: Result<AuthPayload, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(payload) => {
                self.settle_signed_in(ticket, payload);
                Ok(())
            }
            Err(e) => {
                tracing::info!(op, code = e.error_code(), "sign-in failed");
                self.settle(ticket, AuthState::signed_out(), TokenUpdate::Clear);
                Err(e)
            }
        }
    }

    fn settle_signed_in(&self, ticket: u64, payload: AuthPayload) {
        let AuthPayload { user, access_token, expires_in } = payload;
        self.settle(ticket, AuthState::signed_in(user), TokenUpdate::Store { access_token, expires_in });
    }

    fn begin(&self, loading: bool) -> u64 {
        let ticket = self.latest_op.fetch_add(1, Ordering::SeqCst) + 1;
        if loading {
            self.state.send_modify(|s| s.loading = true);
        }
        ticket
    }

    /// Apply `next` and its token change unless a newer operation has
    /// started. Returns whether it landed.
    fn settle(&self, ticket: u64, next: AuthState, token: TokenUpdate) -> bool {
        let landed = self.state.send_if_modified(|current| {
            if self.latest_op.load(Ordering::SeqCst) != ticket {
                return false;
            }
            match token {
                TokenUpdate::Store { access_token, expires_in } => self.api.store_token(&access_token, expires_in),
                TokenUpdate::Clear => self.api.clear_token(),
            }
            *current = next;
            true
        });
        if !landed {
            tracing::debug!(ticket, "discarding stale auth response");
        }
        landed
    }
}
