// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Liveness endpoint.

use axum::Json;

use crate::models::ApiResponse;

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up"),
    )
)]
pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("up"))
}
