// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use spark_admin_server::api::router;
use spark_admin_server::config::Config;
use spark_admin_server::state::AppState;
use spark_admin_server::storage::{NewUser, UserDatabase, UserStatus};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env();

    if config.jwt_secret == "change-me-in-production" {
        tracing::warn!("JWT_SECRET not set, using the insecure default");
    }

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!(dir = %config.data_dir.display(), error = %e, "cannot create data dir");
        std::process::exit(1);
    }
    let db_path = config.data_dir.join("users.redb");
    let db = match UserDatabase::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "cannot open database");
            std::process::exit(1);
        }
    };

    if let Err(e) = seed_admin(&db, &config) {
        tracing::error!(error = %e, "cannot seed admin account");
        std::process::exit(1);
    }

    let state = AppState::new(&config, db);
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(host = %config.host, port = config.port, error = %e, "bad bind address");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "spark-admin-server listening (docs at /docs)");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "cannot bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

/// `LOG_FORMAT=json` switches to structured output; anything else is the
/// human-readable default. Level filtering comes from `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the `admin` account on first run so the instance is usable
/// without manual database surgery. Subsequent runs leave it alone.
fn seed_admin(db: &UserDatabase, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if db.find_by_username("admin")?.is_some() {
        return Ok(());
    }

    let id = db.create(NewUser {
        username: "admin".to_string(),
        password_hash: bcrypt::hash(&config.admin_initial_password, 10)?,
        nickname: Some("Administrator".to_string()),
        email: None,
        phone: None,
        status: UserStatus::Active,
        roles: vec!["admin".to_string()],
    })?;

    tracing::info!(user_id = id, "seeded initial admin account");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
