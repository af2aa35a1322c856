// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! HTTP surface: routing, OpenAPI document and fallbacks.
//!
//! All business routes live under `/api/v1`; interactive docs are served
//! at `/docs`. Unknown paths and wrong methods answer with the standard
//! envelope rather than axum's bare defaults.

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        ApiResponse, CaptchaResponse, LoginRequest, PageResult, TokenResponse, UserDto,
        UserInfoResponse, UserVo,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/captcha", get(auth::captcha))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::create_user))
        .route("/users/page", get(users::page_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/status", put(users::set_user_status))
        .route("/users/{id}/reset-password", put(users::reset_password))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn not_found() -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::fail(404, "resource not found")),
    )
}

async fn method_not_allowed() -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiResponse::fail(405, "method not allowed")),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::captcha,
        auth::login,
        auth::logout,
        auth::me,
        users::page_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::set_user_status,
        users::reset_password
    ),
    components(
        schemas(
            CaptchaResponse,
            LoginRequest,
            TokenResponse,
            UserInfoResponse,
            UserDto,
            UserVo,
            PageResult<UserVo>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Captcha, login and session management"),
        (name = "Users", description = "User administration")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
