// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the `StreamHub` account API: registration, login,
//! refresh-token rotation, logout and the per-request auth guard.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod storage;
pub mod telemetry;
pub mod validation;

use std::sync::Arc;

use crate::auth::SessionService;
use crate::config::Settings;
use crate::error::AppResult;
use crate::storage::UserStore;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Session and account operations
    pub sessions: Arc<SessionService<S>>,
    /// Loaded settings
    pub settings: Arc<Settings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: UserStore> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> AppResult<Self> {
        let sessions = SessionService::new(store, &settings.auth)?;
        Ok(Self {
            sessions: Arc::new(sessions),
            settings: Arc::new(settings),
        })
    }
}
