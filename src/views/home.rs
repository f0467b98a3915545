//! Landing screen.

use super::Route;

pub const APP_TITLE: &str = "authflow";

/// Static landing view linking to login and registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HomeView;

impl HomeView {
    pub fn links(self) -> [(&'static str, Route); 2] {
        [("Log in", Route::Login), ("Register", Route::Register)]
    }
}

impl std::fmt::Display for HomeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{APP_TITLE}")?;
        for (label, route) in self.links() {
            write!(f, "\n  {label}: {route}")?;
        }
        Ok(())
    }
}
