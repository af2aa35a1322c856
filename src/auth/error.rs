// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Authentication errors.
//!
//! These are the rejections the `Auth` extractor can produce. They render
//! as the standard `{code, msg, data}` envelope so unauthenticated clients
//! see the same response shape as everyone else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::INTERNAL_ERROR_MSG;
use crate::models::ApiResponse;

/// Authentication failure, mapped per-variant to a status and message.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    InvalidAuthHeader,
    /// Token is structurally invalid
    MalformedToken,
    /// Token signature does not verify
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token verified but no live session backs it (logged out or evicted)
    SessionExpired,
    /// Internal error during authentication
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "authentication required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "invalid authorization header (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "token is malformed"),
            AuthError::InvalidSignature => write!(f, "token signature is invalid"),
            AuthError::TokenExpired => write!(f, "token has expired"),
            AuthError::SessionExpired => write!(f, "session expired, please log in again"),
            AuthError::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal detail stays in the log, never in the body
            AuthError::Internal(detail) => {
                tracing::error!(%detail, "authentication internal error");
                INTERNAL_ERROR_MSG.to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ApiResponse::<serde_json::Value>::fail(
            status.as_u16(),
            message,
        ));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401_envelope() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["code"], 401);
        assert_eq!(body["msg"], "authentication required");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let response = AuthError::Internal("key store unreadable".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["msg"], INTERNAL_ERROR_MSG);
    }

    #[test]
    fn all_client_faults_are_401() {
        for err in [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::SessionExpired,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
