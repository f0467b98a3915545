//! Client side of an email/password auth flow: API client, session state
//! machine and the views that sit on top of it.

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod views;

pub use config::ClientConfig;
pub use error::{ApiError, ErrorCode};
pub use net::api::{ApiClient, AuthApi};
pub use net::session::Session;
pub use state::auth::{AuthPhase, AuthState, AuthStore};
