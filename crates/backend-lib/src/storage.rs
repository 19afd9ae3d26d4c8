// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! User store abstraction with in-memory and flat-file implementations.
//!
//! Both implementations apply `update_fields` atomically with respect to its
//! match condition, which is what makes refresh-token rotation a
//! compare-and-swap rather than a read-then-write.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use streamhub_common::UserId;
use tokio::{fs as tokio_fs, sync::Mutex};

use crate::error::{AppError, AppResult};
use crate::models::{normalize_key, NewUser, RefreshMatch, UserPatch, UserRecord};

const USERS_FILE: &str = "users.json";

/// Trait for user store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by username or email
    async fn find_by_key(&self, username_or_email: &str) -> AppResult<Option<UserRecord>>;

    /// Look a user up by id
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserRecord>>;

    /// Insert a new user. Fails with `Conflict` if the username or email is taken.
    async fn create(&self, new: NewUser) -> AppResult<UserRecord>;

    /// Apply `patch` to the user `id`.
    ///
    /// Returns `Ok(None)` when no user has that id or when `condition` does not
    /// hold for the stored record. The check and the write are one atomic step.
    async fn update_fields(
        &self,
        id: UserId,
        patch: UserPatch,
        condition: Option<RefreshMatch>,
    ) -> AppResult<Option<UserRecord>>;
}

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_by_key(&self, username_or_email: &str) -> AppResult<Option<UserRecord>> {
        (**self).find_by_key(username_or_email).await
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserRecord>> {
        (**self).find_by_id(id).await
    }

    async fn create(&self, new: NewUser) -> AppResult<UserRecord> {
        (**self).create(new).await
    }

    async fn update_fields(
        &self,
        id: UserId,
        patch: UserPatch,
        condition: Option<RefreshMatch>,
    ) -> AppResult<Option<UserRecord>> {
        (**self).update_fields(id, patch, condition).await
    }
}

/// Reject `username`/`email` if another record (other than `except`) owns them
fn ensure_unique<'a>(
    records: impl Iterator<Item = &'a UserRecord>,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> AppResult<()> {
    for record in records {
        if Some(record.id) == except {
            continue;
        }
        if username.is_some_and(|u| record.username == u) {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        if email.is_some_and(|e| record.email == e) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
    }
    Ok(())
}

/// In-memory store backed by a `DashMap`
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<UserId, UserRecord>>,
    // Serializes writes that touch the unique username/email columns
    unique_guard: Arc<Mutex<()>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn snapshot(&self) -> Vec<UserRecord> {
        self.users.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_key(&self, username_or_email: &str) -> AppResult<Option<UserRecord>> {
        let key = normalize_key(username_or_email);
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().matches_key(&key))
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, new: NewUser) -> AppResult<UserRecord> {
        let record = UserRecord::from_new(new);
        let _guard = self.unique_guard.lock().await;
        ensure_unique(
            self.snapshot().iter(),
            Some(&record.username),
            Some(&record.email),
            None,
        )?;
        self.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_fields(
        &self,
        id: UserId,
        patch: UserPatch,
        condition: Option<RefreshMatch>,
    ) -> AppResult<Option<UserRecord>> {
        let _guard = match &patch.email {
            Some(email) => {
                let guard = self.unique_guard.lock().await;
                let email = normalize_key(email);
                ensure_unique(self.snapshot().iter(), None, Some(&email), Some(id))?;
                Some(guard)
            },
            None => None,
        };

        // The shard write lock held by `get_mut` makes check-and-apply atomic
        let Some(mut entry) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(condition) = &condition {
            if !condition.holds_for(entry.value()) {
                return Ok(None);
            }
        }
        entry.value_mut().apply(patch);
        Ok(Some(entry.value().clone()))
    }
}

/// Flat-file store: one JSON document holding every user.
///
/// The whole table is cached in memory behind an async mutex; every mutation
/// rewrites the file (temp file + rename) before the lock is released.
#[derive(Clone)]
pub struct FlatFileUserStore {
    root: PathBuf,
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl FlatFileUserStore {
    /// Open (or create) the store under `root`
    pub fn new<P: AsRef<Path>>(root: P) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let path = root.join(USERS_FILE);
        let users = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let records: Vec<UserRecord> = serde_json::from_str(&content)?;
            records.into_iter().map(|r| (r.id, r)).collect()
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), users = users.len(), "opened flat-file user store");

        Ok(Self {
            root,
            users: Arc::new(Mutex::new(users)),
        })
    }

    fn file_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    async fn persist(&self, users: &HashMap<UserId, UserRecord>) -> AppResult<()> {
        let mut records: Vec<&UserRecord> = users.values().collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        let json = serde_json::to_string_pretty(&records)?;

        let tmp = self.root.join(format!("{USERS_FILE}.tmp"));
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, self.file_path()).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_key(&self, username_or_email: &str) -> AppResult<Option<UserRecord>> {
        let key = normalize_key(username_or_email);
        let users = self.users.lock().await;
        Ok(users.values().find(|r| r.matches_key(&key)).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, new: NewUser) -> AppResult<UserRecord> {
        let record = UserRecord::from_new(new);
        let mut users = self.users.lock().await;
        ensure_unique(users.values(), Some(&record.username), Some(&record.email), None)?;

        users.insert(record.id, record.clone());
        if let Err(e) = self.persist(&users).await {
            users.remove(&record.id);
            return Err(e);
        }
        Ok(record)
    }

    async fn update_fields(
        &self,
        id: UserId,
        patch: UserPatch,
        condition: Option<RefreshMatch>,
    ) -> AppResult<Option<UserRecord>> {
        let mut users = self.users.lock().await;
        if let Some(email) = &patch.email {
            ensure_unique(users.values(), None, Some(&normalize_key(email)), Some(id))?;
        }

        let Some(current) = users.get(&id) else {
            return Ok(None);
        };
        if let Some(condition) = &condition {
            if !condition.holds_for(current) {
                return Ok(None);
            }
        }

        let previous = current.clone();
        let mut updated = previous.clone();
        updated.apply(patch);
        users.insert(id, updated.clone());
        if let Err(e) = self.persist(&users).await {
            users.insert(id, previous);
            return Err(e);
        }
        Ok(Some(updated))
    }
}
