// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const USER_REGISTERED: &str = "auth.user.registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const REFRESH_SUCCEEDED: &str = "auth.refresh.succeeded";
pub const REFRESH_REUSED: &str = "auth.refresh.reused";
pub const LOGOUT: &str = "auth.logout";
pub const GUARD_REJECTED: &str = "auth.guard.rejected";
