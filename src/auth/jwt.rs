// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Token issuance and validation (HS256).
//!
//! Tokens are stateless proofs: validity is signature plus expiry, nothing
//! else. Revocation is handled upstream by the session cache. Expiry is
//! computed at issuance as `now + configured_ttl`; no clock skew leeway is
//! applied at validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{AccessClaims, RefreshClaims};
use super::AuthError;

/// Issues and validates signed tokens with a process-wide secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Build from the configured secret and lifetimes (seconds).
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Access token lifetime in seconds (also the session TTL).
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Issue an access token carrying the username claim.
    pub fn issue_access_token(&self, user_id: u64, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_ttl_secs)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Issue a refresh token: subject only, longer expiry.
    pub fn issue_refresh_token(&self, user_id: u64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh_ttl_secs)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Decode and validate an access token, mapping each failure cause.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// Fails closed: any parse error, bad signature or expiry is invalid.
    pub fn validate(&self, token: &str) -> bool {
        self.decode_access(token).is_ok()
    }

    /// Extract the subject user id. Assumes `validate` already passed.
    pub fn decode_subject(&self, token: &str) -> Option<u64> {
        self.decode_access(token).ok()?.sub.parse().ok()
    }
}
