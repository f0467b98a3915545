//! In-memory stand-in for the auth backend, shared by state and view tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use crate::error::ApiError;
use crate::net::api::AuthApi;
use crate::net::types::{AuthPayload, LoginRequest, RegisterRequest, User};

/// Logins for emails starting with this prefix wait on [`MockApi::gate`].
pub const SLOW_PREFIX: &str = "slow";

/// Stored token value for `user`, as written by the store on sign-in.
#[must_use]
pub fn token_for(user: &User) -> String {
    format!("tok-{}", user.id)
}

#[must_use]
pub fn user(id: &str, email: &str, name: &str) -> User {
    User {
        id: id.to_owned(),
        email: email.to_owned(),
        name: name.to_owned(),
        created_at: "2024-01-01T00:00:00Z".to_owned(),
        updated_at: "2024-01-01T00:00:00Z".to_owned(),
    }
}

#[must_use]
pub fn payload(user: User) -> AuthPayload {
    AuthPayload { access_token: token_for(&user), user, expires_in: 3600 }
}

#[must_use]
pub fn server_error(status: u16, code: &str, message: &str) -> ApiError {
    ApiError::Server { status, code: code.to_owned(), message: message.to_owned() }
}

pub struct MockApi {
    accounts: Mutex<HashMap<String, (String, User)>>,
    refresh_result: Mutex<Result<AuthPayload, ApiError>>,
    logout_fails: AtomicBool,
    slow_refresh: AtomicBool,
    slow_logout: AtomicBool,
    token: Mutex<Option<String>>,
    calls: Mutex<Vec<&'static str>>,
    gate: Arc<Notify>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            refresh_result: Mutex::new(Err(server_error(401, "UNAUTHORIZED", "Refresh token not found"))),
            logout_fails: AtomicBool::new(false),
            slow_refresh: AtomicBool::new(false),
            slow_logout: AtomicBool::new(false),
            token: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            gate: Arc::new(Notify::new()),
        }
    }

    #[must_use]
    pub fn with_account(self, password: &str, user: User) -> Self {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.email.clone(), (password.to_owned(), user));
        self
    }

    #[must_use]
    pub fn with_refresh(self, result: Result<AuthPayload, ApiError>) -> Self {
        *self.refresh_result.lock().unwrap_or_else(PoisonError::into_inner) = result;
        self
    }

    #[must_use]
    pub fn with_failing_logout(self) -> Self {
        self.logout_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make refresh wait on [`MockApi::gate`] as well.
    #[must_use]
    pub fn with_slow_refresh(self) -> Self {
        self.slow_refresh.store(true, Ordering::SeqCst);
        self
    }

    /// Make logout wait on [`MockApi::gate`] as well.
    #[must_use]
    pub fn with_slow_logout(self) -> Self {
        self.slow_logout.store(true, Ordering::SeqCst);
        self
    }

    pub fn gate(&self) -> Arc<Notify> {
        Arc::clone(&self.gate)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

#[async_trait::async_trait]
impl AuthApi for MockApi {
    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        self.record("register");
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&req.email) {
            return Err(server_error(409, "CONFLICT", "User with this email already exists"));
        }
        let created = user(&format!("u{}", accounts.len() + 1), &req.email, &req.name);
        accounts.insert(req.email.clone(), (req.password.clone(), created.clone()));
        drop(accounts);
        Ok(payload(created))
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        self.record("login");
        if req.email.starts_with(SLOW_PREFIX) {
            self.gate.notified().await;
        }
        let found = self.accounts.lock().unwrap_or_else(PoisonError::into_inner).get(&req.email).cloned();
        match found {
            Some((password, account)) if password == req.password => Ok(payload(account)),
            _ => Err(server_error(401, "INVALID_CREDENTIALS", "Invalid email or password")),
        }
    }

    async fn refresh(&self) -> Result<AuthPayload, ApiError> {
        self.record("refresh");
        if self.slow_refresh.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.refresh_result.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout");
        if self.slow_logout.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection reset".to_owned()));
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.record("current_user");
        let Some(token) = self.token() else {
            return Err(server_error(401, "UNAUTHORIZED", "User not authenticated"));
        };
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts
            .values()
            .map(|(_, u)| u)
            .find(|u| token_for(u) == token)
            .cloned()
            .ok_or_else(|| server_error(404, "NOT_FOUND", "User not found"))
    }

    fn store_token(&self, access_token: &str, _expires_in: u64) {
        self.set_token(Some(access_token.to_owned()));
    }

    fn clear_token(&self) {
        self.set_token(None);
    }
}
