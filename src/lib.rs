// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Spark Admin Server - Administrative Backend
//!
//! Captcha-gated login issuing JWT token pairs, revocable sessions and
//! user administration over an embedded redb store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Tokens, sessions and the authentication extractor
//! - `captcha` - Challenge generation and verification
//! - `storage` - Embedded user persistence (redb)

pub mod api;
pub mod auth;
pub mod captcha;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
