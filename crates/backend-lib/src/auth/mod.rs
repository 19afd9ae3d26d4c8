// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cookies;
pub mod guard;
pub mod password;
pub mod session;
pub mod token;

pub use guard::{authenticate, extract_access_token, AuthenticatedUser};
pub use password::PasswordHasher;
pub use session::{LoginOutcome, MediaField, SessionService};
pub use token::{AccessClaims, RefreshClaims, TokenError, TokenIssuer};
