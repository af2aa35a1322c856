// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthService, SessionCache, TokenService};
use crate::captcha::CaptchaService;
use crate::config::Config;
use crate::storage::UserDatabase;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<UserDatabase>,
    pub tokens: Arc<TokenService>,
    pub sessions: Arc<SessionCache>,
    pub captcha: Arc<CaptchaService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wire all services from configuration and an opened database.
    pub fn new(config: &Config, db: UserDatabase) -> Self {
        let db = Arc::new(db);
        let tokens = Arc::new(TokenService::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ));
        let sessions = Arc::new(AuthService::session_cache(config.access_token_ttl_secs));
        let captcha = Arc::new(CaptchaService::new(
            config.captcha_kind,
            config.captcha_length,
            Duration::from_secs(config.captcha_ttl_secs),
            config.captcha_enabled,
        ));
        let auth = Arc::new(AuthService::new(
            db.clone(),
            tokens.clone(),
            captcha.clone(),
            sessions.clone(),
        ));

        Self {
            db,
            tokens,
            sessions,
            captcha,
            auth,
        }
    }

    /// State over a fresh database in `dir`, captcha disabled.
    #[cfg(test)]
    pub fn for_tests(dir: &std::path::Path) -> Self {
        let config = Config {
            jwt_secret: "test-secret".to_string(),
            captcha_enabled: false,
            ..Config::default()
        };
        let db = UserDatabase::open(&dir.join("users.redb")).expect("open test db");
        Self::new(&config, db)
    }
}
