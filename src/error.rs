//! Error taxonomy for API calls.
//!
//! DESIGN
//! ======
//! Transport, HTTP and decode failures all collapse into [`ApiError`] so the
//! state holder and views can treat every failed operation the same way:
//! show `message()`, branch on `error_code()` if needed.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag shared by all error types.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// API ERROR
// =============================================================================

/// Failure of a single API operation.
///
/// `Clone` so a single-flight refresh can hand the same outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("network request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, code: String, message: String },

    /// A success response body did not match the expected shape.
    #[error("unexpected response (status {status}): {detail}")]
    Decode { status: u16, detail: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Build a server error from a non-2xx status and its raw body.
    ///
    /// Falls back to `HTTP_<status>` when the body is not the structured
    /// `{success:false, error:{code, message}}` shape.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<crate::net::types::ErrorEnvelope>(body) {
            return Self::Server {
                status: status.as_u16(),
                code: parsed.error.code,
                message: parsed.error.message,
            };
        }
        Self::Server {
            status: status.as_u16(),
            code: format!("HTTP_{}", status.as_u16()),
            message: status
                .canonical_reason()
                .map_or_else(|| format!("request failed with status {}", status.as_u16()), str::to_owned),
        }
    }

    /// Human-readable message suitable for showing verbatim.
    pub fn message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(_) | Self::ClientBuild(_) => None,
            Self::Server { status, .. } | Self::Decode { status, .. } => Some(*status),
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &str {
        match self {
            Self::Transport(_) => "NETWORK_ERROR",
            Self::Server { code, .. } => code,
            Self::Decode { .. } => "INVALID_RESPONSE",
            Self::ClientBuild(_) => "CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
