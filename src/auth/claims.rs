// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! JWT claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user id in string form.
    pub sub: String,
    /// Login name of the subject.
    pub username: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

/// Claims embedded in a refresh token. No extra payload beyond the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject: user id in string form.
    pub sub: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

/// The identity handed to handlers after token validation and session
/// resolution. Handlers never read ambient security state; they receive
/// this explicitly via the `Auth` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthnUser {
    /// Unique user id.
    pub user_id: u64,
    /// Login name.
    pub username: String,
    /// Role names hydrated at login time.
    pub roles: Vec<String>,
    /// Permission strings derived from the roles.
    pub permissions: Vec<String>,
}

/// Fixed role → permission mapping.
///
/// Roles live on the user record; permissions are derived, not stored.
pub fn permissions_for_roles(roles: &[String]) -> Vec<String> {
    let mut permissions: Vec<String> = Vec::new();
    for role in roles {
        let granted: &[&str] = match role.as_str() {
            "admin" => &[
                "user:list",
                "user:read",
                "user:create",
                "user:update",
                "user:delete",
                "user:reset-password",
            ],
            "operator" => &["user:list", "user:read", "user:update"],
            "viewer" => &["user:list", "user:read"],
            _ => &[],
        };
        for permission in granted {
            if !permissions.iter().any(|p| p == permission) {
                permissions.push((*permission).to_string());
            }
        }
    }
    permissions
}
