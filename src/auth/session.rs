// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! In-process session cache.
//!
//! A session is created at login and keyed by user id, so a new login
//! replaces any previous session for the same user. Entries live as long
//! as the access token they back; removing one (logout) makes every
//! outstanding token for that user unusable immediately, even before the
//! token itself expires.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Identity snapshot captured at login time.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: u64,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

struct CachedSession {
    session: Session,
    inserted_at: Instant,
}

/// Bounded TTL cache of live sessions, keyed by user id.
pub struct SessionCache {
    cache: Mutex<LruCache<u64, CachedSession>>,
    ttl: Duration,
}

impl SessionCache {
    /// Create a cache holding up to `capacity` sessions for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Store a session, replacing any existing one for the same user.
    pub fn insert(&self, session: Session) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                session.user_id,
                CachedSession {
                    session,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Look up a live session. Expired entries are evicted on access.
    pub fn get(&self, user_id: u64) -> Option<Session> {
        let mut cache = self.cache.lock().ok()?;
        let expired = match cache.get(&user_id) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            cache.pop(&user_id);
            return None;
        }
        cache.get(&user_id).map(|entry| entry.session.clone())
    }

    /// Drop the session for a user. Returns whether one existed.
    pub fn remove(&self, user_id: u64) -> bool {
        match self.cache.lock() {
            Ok(mut cache) => cache.pop(&user_id).is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: u64, username: &str) -> Session {
        Session {
            user_id,
            username: username.to_string(),
            roles: vec!["admin".to_string()],
            permissions: vec!["user:list".to_string()],
        }
    }

    #[test]
    fn insert_then_get_returns_the_session() {
        let cache = SessionCache::new(16, Duration::from_secs(60));
        cache.insert(session(1, "admin"));

        let found = cache.get(1).expect("live session");
        assert_eq!(found.username, "admin");
        assert_eq!(found.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn relogin_replaces_the_previous_session() {
        let cache = SessionCache::new(16, Duration::from_secs(60));
        cache.insert(session(1, "admin"));
        cache.insert(Session {
            roles: vec!["operator".to_string()],
            ..session(1, "admin")
        });

        assert_eq!(cache.get(1).unwrap().roles, vec!["operator".to_string()]);
    }

    #[test]
    fn remove_is_idempotent() {
        let cache = SessionCache::new(16, Duration::from_secs(60));
        cache.insert(session(1, "admin"));

        assert!(cache.remove(1));
        assert!(!cache.remove(1));
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn expired_session_is_gone() {
        let cache = SessionCache::new(16, Duration::from_millis(1));
        cache.insert(session(1, "admin"));

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get(1).is_none());
    }
}
