// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the embedded database | `/data` |
//! | `JWT_SECRET` | HS256 signing secret | Required for production |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime | `7200` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `604800` |
//! | `CAPTCHA_ENABLED` | Whether login requires a captcha | `true` |
//! | `CAPTCHA_KIND` | `arithmetic`, `alphanumeric`, `chinese`, `gif`, `chinese_gif` | `arithmetic` |
//! | `CAPTCHA_LENGTH` | Captcha answer length / operand count | `4` |
//! | `CAPTCHA_TTL_SECS` | Challenge lifetime | `300` |
//! | `ADMIN_INITIAL_PASSWORD` | Password for the seeded `admin` account | `admin123` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use crate::captcha::CaptchaKind;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the HS256 signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
    /// Directory holding the embedded user database.
    pub data_dir: PathBuf,
    /// HS256 signing secret for access and refresh tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds. Also the session TTL.
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: i64,
    /// Whether login requires a captcha at all.
    pub captcha_enabled: bool,
    /// Which challenge variant to render.
    pub captcha_kind: CaptchaKind,
    /// Answer length (random-text kinds) or operand count (arithmetic).
    pub captcha_length: usize,
    /// Challenge lifetime in seconds.
    pub captcha_ttl_secs: u64,
    /// Password assigned to the seeded `admin` account on first run.
    pub admin_initial_password: String,
}

impl Config {
    /// Load configuration from the environment, applying defaults.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8080),
            data_dir: PathBuf::from(
                env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string()),
            ),
            jwt_secret: env::var(JWT_SECRET_ENV)
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            access_token_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", 7200),
            refresh_token_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", 604_800),
            captcha_enabled: env_parse("CAPTCHA_ENABLED", true),
            captcha_kind: env::var("CAPTCHA_KIND")
                .ok()
                .and_then(|s| CaptchaKind::parse(&s))
                .unwrap_or(CaptchaKind::Arithmetic),
            captcha_length: env_parse("CAPTCHA_LENGTH", 4),
            captcha_ttl_secs: env_parse("CAPTCHA_TTL_SECS", 300),
            admin_initial_password: env::var("ADMIN_INITIAL_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("/data"),
            jwt_secret: "change-me-in-production".to_string(),
            access_token_ttl_secs: 7200,
            refresh_token_ttl_secs: 604_800,
            captcha_enabled: true,
            captcha_kind: CaptchaKind::Arithmetic,
            captcha_length: 4,
            captcha_ttl_secs: 300,
            admin_initial_password: "admin123".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_secs, 7200);
        assert_eq!(config.captcha_ttl_secs, 300);
        assert!(config.captcha_enabled);
        assert_eq!(config.captcha_kind, CaptchaKind::Arithmetic);
    }
}
