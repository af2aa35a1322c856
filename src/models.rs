// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Wire types: the response envelope, request DTOs and response views.
//!
//! Every response body is wrapped in [`ApiResponse`]: `{code, msg, data}`
//! with `code = 200` on success. Field names on the wire are camelCase.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::storage::{StoredUser, UserStatus};

/// Standard response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 200 on success; any other integer is a failure code.
    pub code: u16,
    /// Human-readable outcome message.
    pub msg: String,
    /// Payload, `null` on failure or for bodiless operations.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Success envelope with a payload.
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Success envelope with a payload and a custom message.
    pub fn ok_msg(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: 200,
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Success envelope with no payload.
    pub fn ok_empty(msg: impl Into<String>) -> Self {
        Self {
            code: 200,
            msg: msg.into(),
            data: None,
        }
    }

    /// Failure envelope.
    pub fn fail(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// One page of results.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageResult<T> {
    /// Total matching rows before pagination.
    pub total: u64,
    /// Rows on this page.
    pub list: Vec<T>,
}

// ============================================================================
// Auth
// ============================================================================

/// Request body for POST /api/v1/auth/login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login identifier (username).
    pub principal: String,
    /// Plaintext password.
    pub password: String,
    /// Challenge id returned by GET /auth/captcha.
    pub captcha_id: String,
    /// The user's answer to the challenge.
    pub captcha_code: String,
}

/// Token pair returned on successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Longer-lived refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Challenge returned by GET /api/v1/auth/captcha.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaResponse {
    /// Opaque challenge id, single use.
    pub captcha_id: String,
    /// Data-URI encoded image rendering the answer.
    pub captcha_image: String,
}

/// Response for GET /api/v1/auth/me.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    /// The live user row (not the cached session copy).
    pub user_info: UserVo,
    /// Role names.
    pub roles: Vec<String>,
    /// Permission strings derived from the roles.
    pub permissions: Vec<String>,
}

// ============================================================================
// Users
// ============================================================================

/// User view returned to API clients (never includes the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserVo {
    /// Unique user id.
    pub user_id: u64,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// E-mail address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// 0 = active, 1 = disabled.
    pub status: u8,
    /// Role names.
    pub roles: Vec<String>,
    /// When the row was inserted.
    pub create_time: chrono::DateTime<chrono::Utc>,
    /// When the row was last written.
    pub update_time: chrono::DateTime<chrono::Utc>,
}

impl From<StoredUser> for UserVo {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            nickname: user.nickname,
            email: user.email,
            phone: user.phone,
            status: user.status.as_code(),
            roles: user.roles,
            create_time: user.created_at,
            update_time: user.updated_at,
        }
    }
}

/// Request body for creating or partially updating a user.
///
/// On update, only the supplied fields are written; an omitted password
/// leaves the stored hash untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Login name. Required on create.
    pub username: Option<String>,
    /// Plaintext password. Required on create; re-hashed before storage.
    pub password: Option<String>,
    /// Display name.
    pub nickname: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Role names to assign.
    pub roles: Option<Vec<String>>,
}

/// Query parameters for GET /api/v1/users/page.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserPageQuery {
    /// 1-based page number.
    #[serde(default = "default_page_num")]
    pub page_num: u64,
    /// Rows per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Username substring filter.
    pub username: Option<String>,
    /// Exact phone filter.
    pub phone: Option<String>,
    /// Status filter (0 = active, 1 = disabled).
    pub status: Option<u8>,
}

fn default_page_num() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

/// Query parameter for PUT /api/v1/users/{id}/status.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// 0 = active, 1 = disabled.
    pub status: u8,
}

/// Query parameter for PUT /api/v1/users/{id}/reset-password.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordQuery {
    /// Replacement plaintext password.
    pub new_password: String,
}

impl UserStatus {
    /// Parse the 0/1 wire representation.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UserStatus::Active),
            1 => Some(UserStatus::Disabled),
            _ => None,
        }
    }
}
