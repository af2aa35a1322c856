// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Authentication endpoints: captcha, login, logout, current user.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{ApiResponse, CaptchaResponse, LoginRequest, TokenResponse, UserInfoResponse};
use crate::state::AppState;

/// Issue a captcha challenge.
///
/// Every challenge is single use and expires after a few minutes; the
/// image is returned inline as a data URI.
#[utoipa::path(
    get,
    path = "/api/v1/auth/captcha",
    tag = "Auth",
    responses(
        (status = 200, description = "Fresh challenge", body = CaptchaResponse),
    )
)]
pub async fn captcha(State(state): State<AppState>) -> Json<ApiResponse<CaptchaResponse>> {
    let issued = state.captcha.issue();
    Json(ApiResponse::ok(CaptchaResponse {
        captcha_id: issued.id,
        captcha_image: issued.image,
    }))
}

/// Log in with username, password and captcha answer.
///
/// On success the response carries an access/refresh token pair and a
/// session is opened for the user.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenResponse),
        (status = 400, description = "Missing fields or captcha failure"),
        (status = 401, description = "Bad credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let tokens = state.auth.login(&request)?;
    Ok(Json(ApiResponse::ok_msg(tokens, "login successful")))
}

/// Log out the current user.
///
/// Removes the session so outstanding tokens stop working. Calling it
/// again (or with no session) still succeeds.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Json<ApiResponse<serde_json::Value>> {
    state.auth.logout(user.user_id);
    Json(ApiResponse::ok_empty("logout successful"))
}

/// Current user's profile, roles and permissions.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user info", body = UserInfoResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User row no longer exists"),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ApiResponse<UserInfoResponse>>, ApiError> {
    let info = state.auth.current_user_info(user.user_id)?;
    Ok(Json(ApiResponse::ok(info)))
}
