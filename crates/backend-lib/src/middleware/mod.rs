// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `StreamHub` account API.

pub mod auth;

pub use auth::require_auth;
