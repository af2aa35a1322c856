// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! TTL store for pending captcha challenges.
//!
//! Entries are consumed on the first lookup, so a challenge can be
//! attempted at most once regardless of outcome.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

struct StoredChallenge {
    answer: String,
    inserted_at: Instant,
}

/// In-process challenge store with per-entry TTL.
pub struct ChallengeStore {
    cache: Mutex<LruCache<String, StoredChallenge>>,
    ttl: Duration,
}

impl ChallengeStore {
    /// Create a new store with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Store the expected answer for a challenge id.
    pub fn insert(&self, challenge_id: &str, answer: String) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                challenge_id.to_string(),
                StoredChallenge {
                    answer,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Remove and return the stored answer.
    ///
    /// Returns `None` when the id was never issued, already consumed,
    /// or past its TTL; callers cannot tell the three cases apart.
    pub fn take(&self, challenge_id: &str) -> Option<String> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.pop(challenge_id)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.answer)
        } else {
            None
        }
    }
}
