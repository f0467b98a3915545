//! Wire DTOs for the auth API.
//!
//! DESIGN
//! ======
//! Every success body is wrapped in `{success, data}` and every failure in
//! `{success:false, error:{code, message}}`. These types mirror that exactly
//! so serde does the envelope handling.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// An account as returned by the auth API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    pub email: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Payload of a successful register, login or refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Success wrapper: `{success, data}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// Body of `POST /auth/logout`; `data` is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
}

/// Error wrapper: `{success:false, error:{code, message}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// `POST /auth/login` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/register` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}
