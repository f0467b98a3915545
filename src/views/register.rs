//! Registration form with local password rules.
//!
//! Rules are checked in order: required fields, confirmation match, minimum
//! length. None of them touch the network.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use super::{FormError, MIN_PASSWORD_LEN, Route, Submission, failure_message, require, require_verbatim};
use crate::net::types::RegisterRequest;
use crate::state::auth::AuthStore;

pub const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub error: Option<String>,
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            error: None,
        }
    }

    /// # Errors
    ///
    /// Returns the first [`FormError`] in rule order.
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        require(&self.name, "Name")?;
        require(&self.email, "Email")?;
        require_verbatim(&self.password, "Password")?;
        require_verbatim(&self.confirm_password, "Password confirmation")?;
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        Ok(RegisterRequest {
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
            name: self.name.trim().to_owned(),
        })
    }

    /// Validate, then register through the store.
    pub async fn submit(&mut self, store: &AuthStore) -> Submission {
        self.error = None;
        let req = match self.validate() {
            Ok(req) => req,
            Err(e) => return self.reject(e.to_string()),
        };
        match store.register(req).await {
            Ok(()) => Submission::Redirect(Route::Dashboard),
            Err(e) => self.reject(failure_message(&e, REGISTRATION_FAILED)),
        }
    }

    fn reject(&mut self, message: String) -> Submission {
        self.error = Some(message.clone());
        Submission::Rejected(message)
    }
}

impl std::fmt::Display for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Register")?;
        writeln!(f, "  Name:     {}", self.name)?;
        writeln!(f, "  Email:    {}", self.email)?;
        writeln!(f, "  Password: {}", "*".repeat(self.password.chars().count()))?;
        if let Some(error) = &self.error {
            writeln!(f, "  ! {error}")?;
        }
        write!(f, "Already registered? Log in at {}", Route::Login)
    }
}
