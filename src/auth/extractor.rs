// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthnUser
//! }
//! ```
//!
//! Extraction is two-step: the bearer token must carry a valid signature
//! and be unexpired, and the subject must still have a live session. A
//! logged-out user fails the second step no matter how fresh the token is.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthnUser};
use crate::state::AppState;

/// Extractor for authenticated users.
pub struct Auth(pub AuthnUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A middleware layer may already have resolved the user
        if let Some(user) = parts.extensions.get::<AuthnUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = state.tokens.decode_access(token)?;
        let user_id: u64 = claims.sub.parse().map_err(|_| AuthError::MalformedToken)?;

        // Token validity is not enough: the session must still exist
        let session = state
            .sessions
            .get(user_id)
            .ok_or(AuthError::SessionExpired)?;

        Ok(Auth(AuthnUser {
            user_id: session.user_id,
            username: session.username,
            roles: session.roles,
            permissions: session.permissions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::state::AppState;
    use axum::http::Request;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let state = AppState::for_tests(temp_dir.path());
        (state, temp_dir)
    }

    fn parts_with_token(token: &str) -> Parts {
        Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn non_bearer_header_is_rejected() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn valid_token_with_live_session_succeeds() {
        let (state, _temp_dir) = test_state();
        state.sessions.insert(Session {
            user_id: 7,
            username: "admin".to_string(),
            roles: vec!["admin".to_string()],
            permissions: vec!["user:list".to_string()],
        });
        let token = state.tokens.issue_access_token(7, "admin").unwrap();

        let mut parts = parts_with_token(&token);
        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.username, "admin");
        assert_eq!(user.roles, vec!["admin".to_string()]);
    }

    #[tokio::test]
    async fn valid_token_without_session_is_rejected() {
        let (state, _temp_dir) = test_state();
        let token = state.tokens.issue_access_token(7, "admin").unwrap();

        let mut parts = parts_with_token(&token);
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn extractor_prefers_extensions() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;

        parts.extensions.insert(AuthnUser {
            user_id: 99,
            username: "preauth".to_string(),
            roles: vec![],
            permissions: vec![],
        });

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, 99);
        assert_eq!(user.username, "preauth");
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_token("not.a.jwt");

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }
}
