//! Screen-level view models over [`AuthStore`](crate::state::auth::AuthStore).
//!
//! ARCHITECTURE
//! ============
//! Each view owns its local input validation and returns the [`Route`] to
//! navigate to; rendering is a `Display` impl so the terminal front-end (or
//! any other) only has to print.


pub mod dashboard;
pub mod home;
pub mod login;
pub mod register;

use crate::error::ErrorCode;

/// Navigation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Local input failure, raised before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {min} characters", min = MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

impl ErrorCode for FormError {
    fn error_code(&self) -> &str {
        match self {
            Self::Required(_) => "REQUIRED_FIELD",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::PasswordTooShort => "PASSWORD_TOO_SHORT",
        }
    }
}

pub const MIN_PASSWORD_LEN: usize = 8;

/// Outcome of submitting a form: navigate, or stay and show a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Redirect(Route),
    Rejected(String),
}

/// Whitespace-only input counts as missing.
fn require(value: &str, field: &'static str) -> Result<(), FormError> {
    require_verbatim(value.trim(), field)
}

/// Passwords are taken as typed; only an empty value is missing.
fn require_verbatim(value: &str, field: &'static str) -> Result<(), FormError> {
    if value.is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

/// Server message verbatim, or `fallback` when the server sent an empty one.
fn failure_message(err: &crate::error::ApiError, fallback: &str) -> String {
    let message = err.message();
    if message.trim().is_empty() { fallback.to_owned() } else { message }
}
