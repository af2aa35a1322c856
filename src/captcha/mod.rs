// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! # Captcha Service
//!
//! Issues human-solvable image challenges and verifies submitted answers.
//!
//! ## Lifecycle
//!
//! 1. `issue` renders a challenge, stores `{id: answer}` with a short TTL
//!    and returns the id plus the image as a data URI.
//! 2. `verify` consumes the stored entry on its first call, success or
//!    failure, so replaying a challenge id always fails.
//!
//! Checking can be disabled wholesale via configuration, in which case
//! `verify` succeeds without consulting the store.

pub mod generator;
pub mod store;

use std::time::Duration;

use uuid::Uuid;

pub use generator::{CaptchaGenerator, CaptchaKind, RenderedCaptcha};
pub use store::ChallengeStore;

/// Challenge ids the store keeps before evicting the oldest.
const CHALLENGE_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// No entry for the id: expired, already consumed, or never issued.
    #[error("captcha expired")]
    Expired,

    /// The submitted answer does not match the stored one.
    #[error("captcha incorrect")]
    Mismatch,
}

/// An issued challenge handed to the client.
#[derive(Debug, Clone)]
pub struct IssuedCaptcha {
    pub id: String,
    pub image: String,
}

/// Captcha issue/verify service.
pub struct CaptchaService {
    generator: CaptchaGenerator,
    store: ChallengeStore,
    enabled: bool,
}

impl CaptchaService {
    pub fn new(kind: CaptchaKind, length: usize, ttl: Duration, enabled: bool) -> Self {
        Self {
            generator: CaptchaGenerator::new(kind, length),
            store: ChallengeStore::new(CHALLENGE_CAPACITY, ttl),
            enabled,
        }
    }

    /// Render a new challenge and remember its answer.
    pub fn issue(&self) -> IssuedCaptcha {
        let rendered = self.generator.render();
        let id = Uuid::new_v4().to_string();
        self.store.insert(&id, rendered.answer);

        tracing::debug!(challenge_id = %id, "issued captcha challenge");

        IssuedCaptcha {
            id,
            image: rendered.image,
        }
    }

    /// Test hook: plant a challenge with a known answer.
    #[cfg(test)]
    pub fn insert_challenge(&self, id: &str, answer: &str) {
        self.store.insert(id, answer.to_string());
    }

    /// Check a submitted answer, consuming the challenge either way.
    ///
    /// Comparison is ASCII case-insensitive. Always succeeds when captcha
    /// checking is disabled.
    pub fn verify(&self, challenge_id: &str, submitted: &str) -> Result<(), CaptchaError> {
        if !self.enabled {
            return Ok(());
        }

        let answer = self.store.take(challenge_id).ok_or(CaptchaError::Expired)?;
        if answer.eq_ignore_ascii_case(submitted) {
            Ok(())
        } else {
            tracing::debug!(challenge_id = %challenge_id, "captcha verification failed");
            Err(CaptchaError::Mismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(enabled: bool) -> CaptchaService {
        CaptchaService::new(
            CaptchaKind::Alphanumeric,
            4,
            Duration::from_secs(300),
            enabled,
        )
    }

    #[test]
    fn issue_then_verify_is_single_use() {
        let captcha = service(true);
        let issued = captcha.issue();

        // Feed back the stored answer via a fresh insert to know it
        captcha.store.insert(&issued.id, "AB3D".to_string());
        assert!(captcha.verify(&issued.id, "ab3d").is_ok());

        // Second attempt on the same id fails as expired
        assert!(matches!(
            captcha.verify(&issued.id, "ab3d").unwrap_err(),
            CaptchaError::Expired
        ));
    }

    #[test]
    fn verification_is_case_insensitive() {
        let captcha = service(true);
        captcha.store.insert("c1", "Ab3D".to_string());
        assert!(captcha.verify("c1", "aB3d").is_ok());
    }

    #[test]
    fn mismatch_also_consumes_the_challenge() {
        let captcha = service(true);
        captcha.store.insert("c1", "7531".to_string());

        assert!(matches!(
            captcha.verify("c1", "0000").unwrap_err(),
            CaptchaError::Mismatch
        ));
        // The correct answer no longer works
        assert!(matches!(
            captcha.verify("c1", "7531").unwrap_err(),
            CaptchaError::Expired
        ));
    }

    #[test]
    fn unknown_id_is_expired() {
        let captcha = service(true);
        assert!(matches!(
            captcha.verify("never-issued", "x").unwrap_err(),
            CaptchaError::Expired
        ));
    }

    #[test]
    fn disabled_service_accepts_anything() {
        let captcha = service(false);
        assert!(captcha.verify("whatever", "whatever").is_ok());
    }
}
