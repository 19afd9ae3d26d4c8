// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then
//! `config/default.toml`, then an optional explicit file, then
//! `STREAMHUB_`-prefixed environment variables (`__` separates sections,
//! e.g. `STREAMHUB_AUTH__ACCESS_TOKEN_SECRET`).
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STREAMHUB_";

/// Default config file, merged when present
pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest accepted token lifetime (365 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IP literal to bind, e.g. `127.0.0.1` or `::1`; hostnames are rejected
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; credentials are allowed for it
    pub cors_origin: Option<String>,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origin: None,
            body_limit_bytes: 16 * 1024,
        }
    }
}

/// Which user store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    FlatFile,
}

/// User store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Directory of the flat-file store
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::FlatFile,
            path: PathBuf::from("data"),
        }
    }
}

/// Token signing, token lifetime and password hashing parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub access_token_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl_secs: u64,
    /// scrypt cost parameter, log2(N)
    pub hash_log_n: u8,
    /// scrypt block size
    pub hash_r: u32,
    /// scrypt parallelism
    pub hash_p: u32,
    /// Upper bound for a single store or hashing call
    pub operation_timeout_ms: u64,
    /// Whether auth cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            access_token_ttl_secs: 15 * 60,
            refresh_token_secret: String::new(),
            refresh_token_ttl_secs: 60 * 60 * 24 * 10, // 10 days
            hash_log_n: 15,
            hash_r: 8,
            hash_p: 1,
            operation_timeout_ms: 5_000,
            secure_cookies: true,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_token_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_secret", &"<redacted>")
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("hash_log_n", &self.hash_log_n)
            .field("hash_r", &self.hash_r)
            .field("hash_p", &self.hash_p)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl AuthSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// Emit JSON lines instead of the human formatter
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `config/default.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(None).extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Same as [`Settings::load`] with an extra file merged before the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::figment(Some(path.as_ref()))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE));
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.host.parse().map_err(|e| {
            ConfigError::Invalid(format!("server.host must be an IP address: {e}"))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;
        if auth.access_token_secret.is_empty() || auth.refresh_token_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "access and refresh token secrets must be set".into(),
            ));
        }
        if auth.access_token_secret == auth.refresh_token_secret {
            return Err(ConfigError::Invalid(
                "access and refresh token secrets must differ".into(),
            ));
        }
        if auth.access_token_ttl_secs == 0 || auth.refresh_token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token TTLs must be positive".into()));
        }
        if auth.access_token_ttl_secs > MAX_TOKEN_TTL_SECS
            || auth.refresh_token_ttl_secs > MAX_TOKEN_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "token TTLs cannot exceed {MAX_TOKEN_TTL_SECS} seconds"
            )));
        }
        if auth.refresh_token_ttl_secs <= auth.access_token_ttl_secs {
            return Err(ConfigError::Invalid(
                "refresh token TTL must exceed access token TTL".into(),
            ));
        }
        if !(1..=24).contains(&auth.hash_log_n) || auth.hash_r == 0 || auth.hash_p == 0 {
            return Err(ConfigError::Invalid("scrypt parameters out of range".into()));
        }
        if auth.operation_timeout_ms == 0 {
            return Err(ConfigError::Invalid("operation timeout must be positive".into()));
        }
        if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}'",
                self.log.level
            )));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid("body limit must be positive".into()));
        }
        self.bind_addr()?;
        Ok(())
    }
}
