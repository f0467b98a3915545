//! Login form: email + password.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use super::{FormError, Route, Submission, failure_message, require, require_verbatim};
use crate::net::types::LoginRequest;
use crate::state::auth::AuthStore;

pub const LOGIN_FAILED: &str = "Login failed";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Message from the last failed submit.
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into(), error: None }
    }

    /// Trim the email and require both fields.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Required`] naming the first empty field.
    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        require(&self.email, "Email")?;
        require_verbatim(&self.password, "Password")?;
        Ok(LoginRequest { email: self.email.trim().to_owned(), password: self.password.clone() })
    }

    /// Validate, then log in through the store.
    ///
    /// Success redirects to the dashboard; any failure is stored in `error`
    /// and returned verbatim.
    pub async fn submit(&mut self, store: &AuthStore) -> Submission {
        self.error = None;
        let req = match self.validate() {
            Ok(req) => req,
            Err(e) => return self.reject(e.to_string()),
        };
        match store.login(req).await {
            Ok(()) => Submission::Redirect(Route::Dashboard),
            Err(e) => self.reject(failure_message(&e, LOGIN_FAILED)),
        }
    }

    fn reject(&mut self, message: String) -> Submission {
        self.error = Some(message.clone());
        Submission::Rejected(message)
    }
}

impl std::fmt::Display for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Log in")?;
        writeln!(f, "  Email:    {}", self.email)?;
        writeln!(f, "  Password: {}", "*".repeat(self.password.chars().count()))?;
        if let Some(error) = &self.error {
            writeln!(f, "  ! {error}")?;
        }
        write!(f, "No account yet? Register at {}", Route::Register)
    }
}
