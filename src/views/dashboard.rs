//! Protected dashboard showing the signed-in user's profile.
//!
//! SYSTEM CONTEXT
//! ==============
//! The only protected route. It renders nothing until the store settles and
//! redirects to `/login` whenever the settled state is signed-out.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use super::Route;
use crate::net::types::User;
use crate::state::auth::{AuthState, AuthStore};

/// Redirect to `/login` whenever auth has settled and nobody is signed in.
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    !state.loading && (!state.authenticated || state.user.is_none())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    Redirect(Route),
    Profile(User),
}

impl DashboardView {
    pub fn from_state(state: &AuthState) -> Self {
        if should_redirect_unauth(state) {
            return Self::Redirect(Route::Login);
        }
        match (&state.user, state.authenticated) {
            (Some(user), true) => Self::Profile(user.clone()),
            _ => Self::Loading,
        }
    }

    /// Wait for the store to settle, then build the view.
    pub async fn open(store: &AuthStore) -> Self {
        Self::from_state(&store.wait_settled().await)
    }
}

/// Log out and head back to the landing page.
pub async fn logout(store: &AuthStore) -> Route {
    store.logout().await;
    Route::Home
}

impl std::fmt::Display for DashboardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading..."),
            Self::Redirect(route) => write!(f, "Not signed in. Redirecting to {route}"),
            Self::Profile(user) => {
                writeln!(f, "Dashboard")?;
                writeln!(f, "  Name:  {}", user.name)?;
                writeln!(f, "  Email: {}", user.email)?;
                write!(f, "  ID:    {}", user.id)
            }
        }
    }
}
