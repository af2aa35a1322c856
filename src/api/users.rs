// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! User management endpoints.
//!
//! All routes require authentication. Reads go straight to the store;
//! writes hash passwords here so the storage layer never sees plaintext.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{
    ApiResponse, PageResult, ResetPasswordQuery, StatusQuery, UserDto, UserPageQuery, UserVo,
};
use crate::state::AppState;
use crate::storage::{NewUser, UserPageFilter, UserStatus, UserUpdate};

/// Work factor for password hashing.
const BCRYPT_COST: u32 = 10;

fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(ApiError::bad_request(
            "username must be between 3 and 20 characters",
        ));
    }
    Ok(())
}

fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    if plaintext.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }
    bcrypt::hash(plaintext, BCRYPT_COST).map_err(ApiError::internal)
}

/// Paged user listing with optional filters.
#[utoipa::path(
    get,
    path = "/api/v1/users/page",
    tag = "Users",
    security(("bearer" = [])),
    params(UserPageQuery),
    responses(
        (status = 200, description = "One page of users", body = PageResult<UserVo>),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn page_users(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Query(query): Query<UserPageQuery>,
) -> Result<Json<ApiResponse<PageResult<UserVo>>>, ApiError> {
    let status = match query.status {
        Some(code) => Some(
            UserStatus::from_code(code)
                .ok_or_else(|| ApiError::bad_request("status must be 0 or 1"))?,
        ),
        None => None,
    };
    let filter = UserPageFilter {
        username: query.username,
        phone: query.phone,
        status,
    };

    let (total, rows) = state.db.page(&filter, query.page_num, query.page_size)?;
    let list = rows.into_iter().map(UserVo::from).collect();
    Ok(Json(ApiResponse::ok(PageResult { total, list })))
}

/// Fetch a single user by id.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserVo),
        (status = 404, description = "Unknown or deleted user"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<UserVo>>, ApiError> {
    let user = state
        .db
        .find_by_id(id)?
        .ok_or_else(|| ApiError::not_found("user not found or deleted"))?;
    Ok(Json(ApiResponse::ok(UserVo::from(user))))
}

/// Create a user. Username and password are required; the response is
/// the new user's id.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UserDto,
    responses(
        (status = 200, description = "Created; data is the new id", body = u64),
        (status = 400, description = "Validation failure or duplicate field"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Json(dto): Json<UserDto>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    let username = dto
        .username
        .ok_or_else(|| ApiError::bad_request("username is required"))?;
    validate_username(&username)?;
    let password = dto
        .password
        .ok_or_else(|| ApiError::bad_request("password is required"))?;
    let password_hash = hash_password(&password)?;

    let id = state.db.create(NewUser {
        username,
        password_hash,
        nickname: dto.nickname,
        email: dto.email,
        phone: dto.phone,
        status: UserStatus::Active,
        roles: dto.roles.unwrap_or_default(),
    })?;

    tracing::info!(user_id = id, "user created");
    Ok(Json(ApiResponse::ok_msg(id, "user created")))
}

/// Partially update a user. Omitted fields keep their stored values.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User id")),
    request_body = UserDto,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failure or duplicate field"),
        (status = 404, description = "Unknown or deleted user"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(id): Path<u64>,
    Json(dto): Json<UserDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if let Some(ref username) = dto.username {
        validate_username(username)?;
    }
    let password_hash = match dto.password.as_deref() {
        Some(plaintext) => Some(hash_password(plaintext)?),
        None => None,
    };

    state.db.update(
        id,
        UserUpdate {
            username: dto.username,
            password_hash,
            nickname: dto.nickname,
            email: dto.email,
            phone: dto.phone,
            roles: dto.roles,
        },
    )?;

    Ok(Json(ApiResponse::ok_empty("user updated")))
}

/// Soft-delete a user. The row is hidden, not destroyed; its username
/// becomes available again.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Unknown or already deleted user"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !state.db.soft_delete(id)? {
        return Err(ApiError::not_found("user not found or deleted"));
    }
    // Deleting an account also ends its session
    state.sessions.remove(id);
    tracing::info!(user_id = id, "user deleted");
    Ok(Json(ApiResponse::ok_empty("user deleted")))
}

/// Enable or disable a user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/status",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User id"), StatusQuery),
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Status out of range"),
        (status = 404, description = "Unknown or deleted user"),
    )
)]
pub async fn set_user_status(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(id): Path<u64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let status = UserStatus::from_code(query.status)
        .ok_or_else(|| ApiError::bad_request("status must be 0 or 1"))?;
    state.db.set_status(id, status)?;

    // A freshly disabled user must not keep an open session
    if status == UserStatus::Disabled {
        state.sessions.remove(id);
    }
    Ok(Json(ApiResponse::ok_empty("status updated")))
}

/// Replace a user's password.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/reset-password",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User id"), ResetPasswordQuery),
    responses(
        (status = 200, description = "Password replaced"),
        (status = 400, description = "Empty password"),
        (status = 404, description = "Unknown or deleted user"),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(id): Path<u64>,
    Query(query): Query<ResetPasswordQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let hash = hash_password(&query.new_password)?;
    state.db.set_password_hash(id, hash)?;
    tracing::info!(user_id = id, "password reset");
    Ok(Json(ApiResponse::ok_empty("password reset")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"x".repeat(20)).is_ok());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn empty_password_is_rejected_before_hashing() {
        let err = hash_password("").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn hash_verifies_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
        assert!(!bcrypt::verify("hunter3", &hash).unwrap());
    }
}
