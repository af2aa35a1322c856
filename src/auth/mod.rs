// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! # Authentication
//!
//! Captcha-gated login issuing a signed token pair, with revocable
//! sessions on top of the stateless tokens.
//!
//! ## Pieces
//!
//! - [`TokenService`] - HS256 issuance and validation
//! - [`SessionCache`] - in-process session store keyed by user id
//! - [`AuthService`] - login / logout / current-user orchestration
//! - [`Auth`] - extractor handlers use to require authentication
//!
//! A request is authenticated only when its token verifies AND the
//! subject's session is still live; logout removes the session, so
//! revocation takes effect immediately without a token blacklist.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwt;
pub mod service;
pub mod session;

pub use claims::{permissions_for_roles, AccessClaims, AuthnUser, RefreshClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwt::TokenService;
pub use service::AuthService;
pub use session::{Session, SessionCache};
