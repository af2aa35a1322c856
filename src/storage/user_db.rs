// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser (JSON bytes)
//! - `username_index`: username → user_id (non-deleted rows only)
//! - `email_index`: email → user_id (non-deleted rows only)
//! - `phone_index`: phone → user_id (non-deleted rows only)
//! - `meta`: key → u64 (id counter)
//!
//! Soft delete flips the `deleted` flag and drops the index entries, so a
//! deleted username can be claimed again by a new row.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

/// Primary table: user_id → serialized StoredUser (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: username → user_id. Only non-deleted rows have an entry.
const USERNAME_INDEX: TableDefinition<&str, u64> = TableDefinition::new("username_index");

/// Index: email → user_id. Only non-deleted rows with an email have an entry.
const EMAIL_INDEX: TableDefinition<&str, u64> = TableDefinition::new("email_index");

/// Index: phone → user_id. Only non-deleted rows with a phone have an entry.
const PHONE_INDEX: TableDefinition<&str, u64> = TableDefinition::new("phone_index");

/// Meta state: key → u64 (e.g. "next_user_id").
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_USER_ID_KEY: &str = "next_user_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UserDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("phone already exists")]
    DuplicatePhone,

    #[error("user not found or deleted")]
    NotFound,
}

pub type UserDbResult<T> = Result<T, UserDbError>;

// =============================================================================
// Records
// =============================================================================

/// Account status. Disabled users cannot authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl UserStatus {
    /// Wire representation: 0 = active, 1 = disabled.
    pub fn as_code(self) -> u8 {
        match self {
            UserStatus::Active => 0,
            UserStatus::Disabled => 1,
        }
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A persisted user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Unique id, immutable once assigned.
    pub id: u64,
    /// Login name, unique among non-deleted rows (case-sensitive).
    pub username: String,
    /// bcrypt hash; never exposed via the API.
    pub password_hash: String,
    /// Display name.
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: UserStatus,
    /// Role names; permissions derive from these.
    pub roles: Vec<String>,
    /// Soft-delete flag. Deleted rows are invisible to normal lookups.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub roles: Vec<String>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Filters for the paged listing.
#[derive(Debug, Clone, Default)]
pub struct UserPageFilter {
    /// Username substring match.
    pub username: Option<String>,
    /// Exact phone match.
    pub phone: Option<String>,
    pub status: Option<UserStatus>,
}

// =============================================================================
// UserDatabase
// =============================================================================

/// Embedded ACID user store.
#[derive(Debug)]
pub struct UserDatabase {
    db: Database,
}

impl UserDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> UserDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
            let _ = write_txn.open_table(EMAIL_INDEX)?;
            let _ = write_txn.open_table(PHONE_INDEX)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Look up a non-deleted user by id.
    pub fn find_by_id(&self, id: u64) -> UserDbResult<Option<StoredUser>> {
        Ok(self.get_any(id)?.filter(|user| !user.deleted))
    }

    /// Look up a user by id including soft-deleted rows (admin retrieval).
    pub fn get_any(&self, id: u64) -> UserDbResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => {
                let user: StoredUser = serde_json::from_slice(value.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Look up a non-deleted user by username (case-sensitive).
    pub fn find_by_username(&self, username: &str) -> UserDbResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERNAME_INDEX)?;
        let id = match index.get(username)? {
            Some(value) => value.value(),
            None => return Ok(None),
        };
        drop(index);
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => {
                let user: StoredUser = serde_json::from_slice(value.value())?;
                Ok(Some(user).filter(|u| !u.deleted))
            }
            None => Ok(None),
        }
    }

    /// Paged listing of non-deleted users. `page_num` is 1-based.
    ///
    /// Returns `(total_matching, rows_on_page)` ordered by id.
    pub fn page(
        &self,
        filter: &UserPageFilter,
        page_num: u64,
        page_size: u64,
    ) -> UserDbResult<(u64, Vec<StoredUser>)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut matching = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let user: StoredUser = serde_json::from_slice(entry.1.value())?;
            if user.deleted {
                continue;
            }
            if let Some(ref needle) = filter.username {
                if !user.username.contains(needle.as_str()) {
                    continue;
                }
            }
            if let Some(ref phone) = filter.phone {
                if user.phone.as_deref() != Some(phone.as_str()) {
                    continue;
                }
            }
            if let Some(status) = filter.status {
                if user.status != status {
                    continue;
                }
            }
            matching.push(user);
        }

        let total = matching.len() as u64;
        let page_size = page_size.max(1);
        let start = (page_num.max(1) - 1).saturating_mul(page_size) as usize;
        let rows = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Ok((total, rows))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a new user, enforcing username/email/phone uniqueness among
    /// non-deleted rows. Check and insert share one write transaction.
    pub fn create(&self, new: NewUser) -> UserDbResult<u64> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let id;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_username = write_txn.open_table(USERNAME_INDEX)?;
            let mut by_email = write_txn.open_table(EMAIL_INDEX)?;
            let mut by_phone = write_txn.open_table(PHONE_INDEX)?;
            let mut meta = write_txn.open_table(META)?;

            if by_username.get(new.username.as_str())?.is_some() {
                return Err(UserDbError::DuplicateUsername);
            }
            if let Some(ref email) = new.email {
                if !email.is_empty() && by_email.get(email.as_str())?.is_some() {
                    return Err(UserDbError::DuplicateEmail);
                }
            }
            if let Some(ref phone) = new.phone {
                if !phone.is_empty() && by_phone.get(phone.as_str())?.is_some() {
                    return Err(UserDbError::DuplicatePhone);
                }
            }

            id = match meta.get(NEXT_USER_ID_KEY)? {
                Some(value) => value.value(),
                None => 1,
            };
            meta.insert(NEXT_USER_ID_KEY, id + 1)?;

            let user = StoredUser {
                id,
                username: new.username.clone(),
                password_hash: new.password_hash,
                nickname: new.nickname,
                email: new.email.clone(),
                phone: new.phone.clone(),
                status: new.status,
                roles: new.roles,
                deleted: false,
                created_at: now,
                updated_at: now,
            };
            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            by_username.insert(new.username.as_str(), id)?;
            if let Some(ref email) = new.email {
                if !email.is_empty() {
                    by_email.insert(email.as_str(), id)?;
                }
            }
            if let Some(ref phone) = new.phone {
                if !phone.is_empty() {
                    by_phone.insert(phone.as_str(), id)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(id)
    }

    /// Partially update a non-deleted user. Duplicate checks exclude the
    /// row itself; index entries follow any changed value.
    pub fn update(&self, id: u64, update: UserUpdate) -> UserDbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_username = write_txn.open_table(USERNAME_INDEX)?;
            let mut by_email = write_txn.open_table(EMAIL_INDEX)?;
            let mut by_phone = write_txn.open_table(PHONE_INDEX)?;

            let mut user = match users.get(id)? {
                Some(value) => serde_json::from_slice::<StoredUser>(value.value())?,
                None => return Err(UserDbError::NotFound),
            };
            if user.deleted {
                return Err(UserDbError::NotFound);
            }

            if let Some(username) = update.username {
                if username != user.username {
                    if let Some(existing) = by_username.get(username.as_str())? {
                        if existing.value() != id {
                            return Err(UserDbError::DuplicateUsername);
                        }
                    }
                    by_username.remove(user.username.as_str())?;
                    by_username.insert(username.as_str(), id)?;
                    user.username = username;
                }
            }
            if let Some(email) = update.email {
                if user.email.as_deref() != Some(email.as_str()) {
                    if !email.is_empty() {
                        if let Some(existing) = by_email.get(email.as_str())? {
                            if existing.value() != id {
                                return Err(UserDbError::DuplicateEmail);
                            }
                        }
                    }
                    if let Some(ref old) = user.email {
                        if !old.is_empty() {
                            by_email.remove(old.as_str())?;
                        }
                    }
                    if !email.is_empty() {
                        by_email.insert(email.as_str(), id)?;
                    }
                    user.email = Some(email);
                }
            }
            if let Some(phone) = update.phone {
                if user.phone.as_deref() != Some(phone.as_str()) {
                    if !phone.is_empty() {
                        if let Some(existing) = by_phone.get(phone.as_str())? {
                            if existing.value() != id {
                                return Err(UserDbError::DuplicatePhone);
                            }
                        }
                    }
                    if let Some(ref old) = user.phone {
                        if !old.is_empty() {
                            by_phone.remove(old.as_str())?;
                        }
                    }
                    if !phone.is_empty() {
                        by_phone.insert(phone.as_str(), id)?;
                    }
                    user.phone = Some(phone);
                }
            }
            if let Some(password_hash) = update.password_hash {
                user.password_hash = password_hash;
            }
            if let Some(nickname) = update.nickname {
                user.nickname = Some(nickname);
            }
            if let Some(roles) = update.roles {
                user.roles = roles;
            }
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Soft-delete a user. Returns false when the row is absent or already
    /// deleted ("0 rows affected"); callers treat that as not-found.
    pub fn soft_delete(&self, id: u64) -> UserDbResult<bool> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_username = write_txn.open_table(USERNAME_INDEX)?;
            let mut by_email = write_txn.open_table(EMAIL_INDEX)?;
            let mut by_phone = write_txn.open_table(PHONE_INDEX)?;

            let existing = match users.get(id)? {
                Some(value) => Some(serde_json::from_slice::<StoredUser>(value.value())?),
                None => None,
            };
            match existing {
                Some(mut user) if !user.deleted => {
                    user.deleted = true;
                    user.updated_at = Utc::now();
                    by_username.remove(user.username.as_str())?;
                    if let Some(ref email) = user.email {
                        if !email.is_empty() {
                            by_email.remove(email.as_str())?;
                        }
                    }
                    if let Some(ref phone) = user.phone {
                        if !phone.is_empty() {
                            by_phone.remove(phone.as_str())?;
                        }
                    }
                    let json = serde_json::to_vec(&user)?;
                    users.insert(id, json.as_slice())?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Set the status of a live user.
    pub fn set_status(&self, id: u64, status: UserStatus) -> UserDbResult<()> {
        self.mutate_live(id, |user| user.status = status)
    }

    /// Replace the password hash of a live user wholesale.
    pub fn set_password_hash(&self, id: u64, hash: String) -> UserDbResult<()> {
        self.mutate_live(id, |user| user.password_hash = hash)
    }

    /// Single-field mutation of a non-deleted row.
    fn mutate_live<F>(&self, id: u64, apply: F) -> UserDbResult<()>
    where
        F: FnOnce(&mut StoredUser),
    {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut user = match users.get(id)? {
                Some(value) => serde_json::from_slice::<StoredUser>(value.value())?,
                None => return Err(UserDbError::NotFound),
            };
            if user.deleted {
                return Err(UserDbError::NotFound);
            }
            apply(&mut user);
            user.updated_at = Utc::now();
            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db() -> (UserDatabase, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let db = UserDatabase::open(&dir.path().join("users.redb")).expect("open db");
        (db, dir)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$2b$10$hash".to_string(),
            nickname: None,
            email: None,
            phone: None,
            status: UserStatus::Active,
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn create_and_find_round_trip() {
        let (db, _dir) = open_db();
        let id = db.create(new_user("alice")).unwrap();
        assert_eq!(id, 1);

        let by_id = db.find_by_id(id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.status, UserStatus::Active);

        let by_name = db.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);
    }

    #[test]
    fn open_surfaces_an_unusable_parent_dir() {
        let dir = TempDir::new().expect("tempdir");
        // A plain file where a directory is needed
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = UserDatabase::open(&blocker.join("sub").join("users.redb")).unwrap_err();
        assert!(matches!(err, UserDbError::Io(_)));
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let (db, _dir) = open_db();
        let a = db.create(new_user("a")).unwrap();
        let b = db.create(new_user("b")).unwrap();
        assert_eq!(b, a + 1);

        db.soft_delete(b).unwrap();
        let c = db.create(new_user("c")).unwrap();
        assert_eq!(c, b + 1);
    }

    #[test]
    fn duplicate_username_rejected_until_soft_deleted() {
        let (db, _dir) = open_db();
        let first = db.create(new_user("alice")).unwrap();

        let err = db.create(new_user("alice")).unwrap_err();
        assert!(matches!(err, UserDbError::DuplicateUsername));

        // Soft delete frees the username for reuse
        assert!(db.soft_delete(first).unwrap());
        let second = db.create(new_user("alice")).unwrap();
        assert_ne!(first, second);
        assert_eq!(db.find_by_username("alice").unwrap().unwrap().id, second);
    }

    #[test]
    fn duplicate_email_and_phone_rejected() {
        let (db, _dir) = open_db();
        let mut user = new_user("a");
        user.email = Some("a@example.com".to_string());
        user.phone = Some("13800000000".to_string());
        db.create(user).unwrap();

        let mut email_clash = new_user("b");
        email_clash.email = Some("a@example.com".to_string());
        assert!(matches!(
            db.create(email_clash).unwrap_err(),
            UserDbError::DuplicateEmail
        ));

        let mut phone_clash = new_user("c");
        phone_clash.phone = Some("13800000000".to_string());
        assert!(matches!(
            db.create(phone_clash).unwrap_err(),
            UserDbError::DuplicatePhone
        ));
    }

    #[test]
    fn soft_delete_hides_user_but_keeps_row() {
        let (db, _dir) = open_db();
        let id = db.create(new_user("alice")).unwrap();
        assert!(db.soft_delete(id).unwrap());

        assert!(db.find_by_id(id).unwrap().is_none());
        assert!(db.find_by_username("alice").unwrap().is_none());

        // Admin retrieval still sees the row
        let row = db.get_any(id).unwrap().unwrap();
        assert!(row.deleted);

        // Second delete affects 0 rows
        assert!(!db.soft_delete(id).unwrap());
        assert!(!db.soft_delete(9999).unwrap());
    }

    #[test]
    fn partial_update_preserves_unsupplied_fields() {
        let (db, _dir) = open_db();
        let mut user = new_user("alice");
        user.email = Some("alice@example.com".to_string());
        user.phone = Some("13800000000".to_string());
        let id = db.create(user).unwrap();

        db.update(
            id,
            UserUpdate {
                nickname: Some("X".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let row = db.find_by_id(id).unwrap().unwrap();
        assert_eq!(row.nickname.as_deref(), Some("X"));
        assert_eq!(row.username, "alice");
        assert_eq!(row.email.as_deref(), Some("alice@example.com"));
        assert_eq!(row.phone.as_deref(), Some("13800000000"));
        assert_eq!(row.password_hash, "$2b$10$hash");
    }

    #[test]
    fn update_username_moves_index_entry() {
        let (db, _dir) = open_db();
        let id = db.create(new_user("alice")).unwrap();
        db.create(new_user("bob")).unwrap();

        // Renaming onto an existing username fails
        assert!(matches!(
            db.update(
                id,
                UserUpdate {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err(),
            UserDbError::DuplicateUsername
        ));

        db.update(
            id,
            UserUpdate {
                username: Some("carol".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(db.find_by_username("alice").unwrap().is_none());
        assert_eq!(db.find_by_username("carol").unwrap().unwrap().id, id);
    }

    #[test]
    fn update_missing_or_deleted_user_is_not_found() {
        let (db, _dir) = open_db();
        let err = db.update(42, UserUpdate::default()).unwrap_err();
        assert!(matches!(err, UserDbError::NotFound));

        let id = db.create(new_user("alice")).unwrap();
        db.soft_delete(id).unwrap();
        let err = db.set_status(id, UserStatus::Disabled).unwrap_err();
        assert!(matches!(err, UserDbError::NotFound));
    }

    #[test]
    fn set_status_and_password_hash() {
        let (db, _dir) = open_db();
        let id = db.create(new_user("alice")).unwrap();

        db.set_status(id, UserStatus::Disabled).unwrap();
        assert_eq!(
            db.find_by_id(id).unwrap().unwrap().status,
            UserStatus::Disabled
        );

        db.set_password_hash(id, "$2b$10$other".to_string()).unwrap();
        assert_eq!(db.find_by_id(id).unwrap().unwrap().password_hash, "$2b$10$other");
    }

    #[test]
    fn page_filters_and_paginates() {
        let (db, _dir) = open_db();
        for i in 0..5 {
            let mut user = new_user(&format!("user{i}"));
            user.phone = Some(format!("1380000000{i}"));
            db.create(user).unwrap();
        }
        db.set_status(3, UserStatus::Disabled).unwrap();
        db.soft_delete(5).unwrap();

        // All non-deleted
        let (total, rows) = db.page(&UserPageFilter::default(), 1, 10).unwrap();
        assert_eq!(total, 4);
        assert_eq!(rows.len(), 4);

        // Substring filter
        let filter = UserPageFilter {
            username: Some("user1".to_string()),
            ..Default::default()
        };
        let (total, rows) = db.page(&filter, 1, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].username, "user1");

        // Status filter
        let filter = UserPageFilter {
            status: Some(UserStatus::Disabled),
            ..Default::default()
        };
        let (total, _) = db.page(&filter, 1, 10).unwrap();
        assert_eq!(total, 1);

        // Phone filter
        let filter = UserPageFilter {
            phone: Some("13800000001".to_string()),
            ..Default::default()
        };
        let (total, rows) = db.page(&filter, 1, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, 2);

        // Pagination
        let (total, rows) = db.page(&UserPageFilter::default(), 2, 3).unwrap();
        assert_eq!(total, 4);
        assert_eq!(rows.len(), 1);
    }
}
