//! Client-side state containers.
//!
//! DESIGN
//! ======
//! State lives here, apart from `net` (transport) and `views` (presentation),
//! so transitions can be tested against a mock API without any rendering.

pub mod auth;

#[cfg(test)]
pub(crate) mod test_helpers;
