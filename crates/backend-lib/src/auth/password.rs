// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use zeroize::Zeroizing;

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};

/// Length of the derived key in bytes
const OUTPUT_LEN: usize = 32;

/// scrypt hasher with a configurable work factor.
///
/// Hashing and verification are CPU-bound; the async wrappers move them to the
/// blocking pool so they never stall the runtime.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher from explicit scrypt parameters
    pub fn new(log_n: u8, r: u32, p: u32) -> AppResult<Self> {
        let params = Params::new(log_n, r, p, OUTPUT_LEN)
            .map_err(|e| AppError::Hashing(format!("invalid scrypt parameters: {e}")))?;
        Ok(Self { params })
    }

    pub fn from_settings(settings: &AuthSettings) -> AppResult<Self> {
        Self::new(settings.hash_log_n, settings.hash_r, settings.hash_p)
    }

    /// Hash a password with a fresh random salt, returning a PHC string
    pub fn hash(&self, plain: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params.clone(), &salt)
            .map_err(|e| AppError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// The work factor is read from the hash itself, so hashes created under an
    /// older configuration still verify. A malformed hash never matches.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        // The final digest comparison in `verify_password` is constant-time
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// [`PasswordHasher::hash`] on the blocking pool
    pub async fn hash_async(&self, plain: &str) -> AppResult<String> {
        let hasher = self.clone();
        let plain = Zeroizing::new(plain.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// [`PasswordHasher::verify`] on the blocking pool
    pub async fn verify_async(&self, plain: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.clone();
        let plain = Zeroizing::new(plain.to_owned());
        let hash = hash.to_owned();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?)
    }
}
