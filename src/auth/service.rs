// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Login, logout and current-user lookup.
//!
//! Login order is deliberate: the captcha is checked (and consumed) before
//! any credential work, and credential failures share one message so the
//! response does not reveal whether the username exists.

use std::sync::Arc;
use std::time::Duration;

use super::claims::permissions_for_roles;
use super::jwt::TokenService;
use super::session::{Session, SessionCache};
use crate::captcha::CaptchaService;
use crate::error::ApiError;
use crate::models::{LoginRequest, TokenResponse, UserInfoResponse, UserVo};
use crate::storage::{UserDatabase, UserStatus};

/// Client message for any credential failure.
const BAD_CREDENTIALS_MSG: &str = "incorrect username or password";

/// Sessions kept in memory at once.
const SESSION_CAPACITY: usize = 10_000;

/// Authentication orchestration over the user store, token service,
/// captcha service and session cache.
pub struct AuthService {
    db: Arc<UserDatabase>,
    tokens: Arc<TokenService>,
    captcha: Arc<CaptchaService>,
    sessions: Arc<SessionCache>,
}

impl AuthService {
    pub fn new(
        db: Arc<UserDatabase>,
        tokens: Arc<TokenService>,
        captcha: Arc<CaptchaService>,
        sessions: Arc<SessionCache>,
    ) -> Self {
        Self {
            db,
            tokens,
            captcha,
            sessions,
        }
    }

    /// Build the session cache sized to the access token lifetime.
    pub fn session_cache(access_ttl_secs: i64) -> SessionCache {
        SessionCache::new(
            SESSION_CAPACITY,
            Duration::from_secs(access_ttl_secs.max(0) as u64),
        )
    }

    /// Verify captcha and credentials, then issue tokens and open a session.
    pub fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ApiError> {
        if request.principal.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::bad_request("username and password are required"));
        }

        // Consumes the challenge whatever the outcome
        self.captcha
            .verify(&request.captcha_id, &request.captcha_code)?;

        let user = self
            .db
            .find_by_username(&request.principal)?
            .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS_MSG))?;

        // Same message as an unknown user so the response never reveals
        // whether the account exists or is disabled
        if user.status == UserStatus::Disabled {
            tracing::warn!(username = %user.username, "login attempt on disabled account");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS_MSG));
        }

        let password_ok = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(ApiError::internal)?;
        if !password_ok {
            tracing::debug!(username = %user.username, "password mismatch");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS_MSG));
        }

        let access_token = self
            .tokens
            .issue_access_token(user.id, &user.username)
            .map_err(ApiError::internal)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(user.id)
            .map_err(ApiError::internal)?;

        self.sessions.insert(Session {
            user_id: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            permissions: permissions_for_roles(&user.roles),
        });

        tracing::info!(user_id = user.id, username = %user.username, "user logged in");

        Ok(TokenResponse {
            access_token,
            refresh_token,
            expires_in: self.tokens.access_ttl_secs(),
        })
    }

    /// Drop the user's session. Safe to call when none exists.
    pub fn logout(&self, user_id: u64) {
        let removed = self.sessions.remove(user_id);
        tracing::info!(user_id, removed, "user logged out");
    }

    /// Current user info, read from the live row rather than the session
    /// snapshot so recent role or profile changes show through.
    pub fn current_user_info(&self, user_id: u64) -> Result<UserInfoResponse, ApiError> {
        let user = self
            .db
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::not_found("user not found or deleted"))?;

        let roles = user.roles.clone();
        let permissions = permissions_for_roles(&roles);

        Ok(UserInfoResponse {
            user_info: UserVo::from(user),
            roles,
            permissions,
        })
    }
}
