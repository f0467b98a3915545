//! Networking modules for the auth API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs REST calls, `session` holds the in-memory access token, and
//! `types` defines the wire schema.

pub mod api;
pub mod session;
pub mod types;
