//! REST client for the auth API.
//!
//! ARCHITECTURE
//! ============
//! [`AuthApi`] is the seam the state holder talks to; [`ApiClient`] is the
//! reqwest-backed implementation. The client owns its [`Session`] and an
//! in-memory cookie store, so the refresh cookie set by login/register is
//! replayed on `/auth/refresh` the way a browser would with
//! `credentials: include`.
//!
//! Network calls never write the session. The state holder commits the token
//! through [`AuthApi::store_token`] / [`AuthApi::clear_token`] in the same step
//! that settles its state, so the bearer always belongs to the user it shows.
//!
//! ERROR HANDLING
//! ==============
//! Every operation returns `Result<_, ApiError>`. Non-2xx responses are parsed
//! into `ApiError::Server` with the server's `code` and `message`; callers
//! never need to know which endpoint failed to render the message.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::session::Session;
use super::types::{Ack, AuthPayload, Envelope, LoginRequest, RegisterRequest, User};
use crate::config::ClientConfig;
use crate::error::ApiError;

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

const NO_BODY: Option<&()> = None;

// =============================================================================
// AUTH API TRAIT
// =============================================================================

/// Backend operations the auth state holder depends on. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/register`.
    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError>;

    /// `POST /auth/login`.
    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError>;

    /// `POST /auth/refresh` using the refresh cookie.
    async fn refresh(&self) -> Result<AuthPayload, ApiError>;

    /// `POST /auth/logout`. Expires the refresh cookie server-side.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /auth/me` with the current bearer token.
    async fn current_user(&self) -> Result<User, ApiError>;

    /// Use `access_token` as the bearer for subsequent requests.
    fn store_token(&self, access_token: &str, expires_in: u64);

    fn clear_token(&self);
}

// =============================================================================
// CLIENT
// =============================================================================

type RefreshFlight = Shared<BoxFuture<'static, Result<AuthPayload, ApiError>>>;

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<Session>,
}

/// HTTP implementation of [`AuthApi`].
pub struct ApiClient {
    inner: Arc<Inner>,
    refresh_flight: Mutex<Option<RefreshFlight>>,
}

impl ApiClient {
    /// Build a client with a fresh, empty session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_session(config, Arc::new(Session::new()))
    }

    /// Build a client around an existing session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_session(config: ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner { http, config, session }),
            refresh_flight: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl Inner {
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.config.endpoint(path);
        let mut request = self.http.request(method.clone(), &url).header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.session.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "auth api request failed");
            ApiError::from(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &text);
            tracing::debug!(%method, path, status = status.as_u16(), error = %err, "auth api returned error");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode { status: status.as_u16(), detail: e.to_string() })
    }

    async fn refresh_once(self: Arc<Self>) -> Result<AuthPayload, ApiError> {
        match self.send::<Envelope<AuthPayload>, _>(Method::POST, REFRESH_PATH, NO_BODY).await {
            Ok(envelope) => {
                tracing::info!(user_id = %envelope.data.user.id, "session refreshed");
                Ok(envelope.data)
            }
            Err(e) => {
                tracing::info!(error = %e, "session refresh failed");
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let envelope: Envelope<AuthPayload> = self.inner.send(Method::POST, REGISTER_PATH, Some(req)).await?;
        tracing::info!(user_id = %envelope.data.user.id, "registered");
        Ok(envelope.data)
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        let envelope: Envelope<AuthPayload> = self.inner.send(Method::POST, LOGIN_PATH, Some(req)).await?;
        tracing::info!(user_id = %envelope.data.user.id, "logged in");
        Ok(envelope.data)
    }

    async fn refresh(&self) -> Result<AuthPayload, ApiError> {
        // At most one refresh per client; overlapping callers share its outcome.
        let flight = {
            let mut slot = self.refresh_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = slot.clone() {
                tracing::debug!("joining in-flight refresh");
                existing
            } else {
                let flight = Arc::clone(&self.inner).refresh_once().boxed().shared();
                *slot = Some(flight.clone());
                flight
            }
        };

        let outcome = flight.clone().await;

        let mut slot = self.refresh_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&flight)) {
            *slot = None;
        }
        outcome
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.inner.send::<Ack, _>(Method::POST, LOGOUT_PATH, NO_BODY).await?;
        tracing::info!("logged out");
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        let envelope: Envelope<User> = self.inner.send(Method::GET, ME_PATH, NO_BODY).await?;
        Ok(envelope.data)
    }

    fn store_token(&self, access_token: &str, expires_in: u64) {
        self.inner.session.set_token(access_token, expires_in);
    }

    fn clear_token(&self) {
        self.inner.session.clear();
    }
}
