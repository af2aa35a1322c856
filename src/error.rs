// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! API-level error type mapping failures to the response envelope.
//!
//! Business failures carry their message to the client; anything internal
//! is logged server-side and replaced with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::captcha::CaptchaError;
use crate::models::ApiResponse;
use crate::storage::UserDbError;

/// Client message used for every internal fault.
pub const INTERNAL_ERROR_MSG: &str = "internal error, contact the administrator";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal fault: the detail is logged, the client gets a generic body.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(%detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<serde_json::Value>::fail(
            self.status.as_u16(),
            self.message,
        ));
        (self.status, body).into_response()
    }
}

impl From<UserDbError> for ApiError {
    fn from(err: UserDbError) -> Self {
        match err {
            UserDbError::DuplicateUsername => Self::bad_request("username already exists"),
            UserDbError::DuplicateEmail => Self::bad_request("email already exists"),
            UserDbError::DuplicatePhone => Self::bad_request("phone already exists"),
            UserDbError::NotFound => Self::not_found("user not found or deleted"),
            other => Self::internal(other),
        }
    }
}

impl From<CaptchaError> for ApiError {
    fn from(err: CaptchaError) -> Self {
        match err {
            CaptchaError::Expired => Self::bad_request("captcha expired"),
            CaptchaError::Mismatch => Self::bad_request("captcha incorrect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_hides_detail_from_client() {
        let err = ApiError::internal("db exploded: stack trace here");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, INTERNAL_ERROR_MSG);
    }

    #[test]
    fn duplicate_maps_to_400_and_not_found_to_404() {
        let dup: ApiError = UserDbError::DuplicateUsername.into();
        assert_eq!(dup.status, StatusCode::BAD_REQUEST);

        let nf: ApiError = UserDbError::NotFound.into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn into_response_writes_the_envelope() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["code"], 400);
        assert_eq!(body["msg"], "bad data");
        assert!(body["data"].is_null());
    }
}
