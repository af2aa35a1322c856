// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Embedded persistence for user records.
//!
//! A single redb database holds the user table plus the uniqueness index
//! tables. Because redb serializes write transactions, the duplicate check
//! and the insert run inside one transaction and cannot race.

pub mod user_db;

pub use user_db::{
    NewUser, StoredUser, UserDatabase, UserDbError, UserDbResult, UserPageFilter, UserStatus,
    UserUpdate,
};
