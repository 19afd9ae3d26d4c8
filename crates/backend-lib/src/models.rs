// ============================
// crates/backend-lib/src/models.rs
// ============================
//! Persisted user record and the shapes used to create and patch it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streamhub_common::{UserId, UserProfile};
use uuid::Uuid;

/// Trim and lower-case a username or email.
/// Applied on every write and on every lookup.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A registered user as held by the store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub watch_history: Vec<String>,
    /// scrypt PHC string
    pub password_hash: String,
    /// The only refresh token currently accepted for rotation
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a record from creation fields, assigning id and timestamps
    pub fn from_new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: normalize_key(&new.username),
            email: normalize_key(&new.email),
            fullname: new.fullname.trim().to_string(),
            avatar: new.avatar,
            cover_image: new.cover_image,
            watch_history: Vec::new(),
            password_hash: new.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `key` (already normalized) names this record
    pub fn matches_key(&self, key: &str) -> bool {
        self.username == key || self.email == key
    }

    /// Public projection without the hash and refresh token
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            fullname: self.fullname.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            watch_history: self.watch_history.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Apply a patch in place and bump `updated_at`
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = normalize_key(&email);
        }
        if let Some(fullname) = patch.fullname {
            self.fullname = fullname.trim().to_string();
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar;
        }
        if let Some(cover) = patch.cover_image {
            self.cover_image = Some(cover);
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(slot) = patch.refresh_token {
            self.refresh_token = slot;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

/// Partial update; `None` leaves a field untouched.
///
/// `refresh_token` is doubly optional: `Some(None)` clears the slot.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: Option<String>,
    pub refresh_token: Option<Option<String>>,
}

impl UserPatch {
    pub fn set_refresh_token(token: impl Into<String>) -> Self {
        Self {
            refresh_token: Some(Some(token.into())),
            ..Self::default()
        }
    }

    pub fn clear_refresh_token() -> Self {
        Self {
            refresh_token: Some(None),
            ..Self::default()
        }
    }
}

/// Match condition for a compare-and-swap update of the refresh slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshMatch {
    /// Apply only if the stored slot equals this token
    Exactly(String),
}

impl RefreshMatch {
    pub fn holds_for(&self, record: &UserRecord) -> bool {
        match self {
            RefreshMatch::Exactly(expected) => record.refresh_token.as_deref() == Some(expected.as_str()),
        }
    }
}
