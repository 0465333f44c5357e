//! # BitSleuth API Server
//!
//! HTTP API for the BitSleuth subscription backend:
//! - Account registration, login, and email verification (JWT sessions)
//! - USDT invoice creation and payment submission
//! - Server-side Tron address balance checks
//! - Admin dashboard endpoints
//!
//! Payment settlement itself runs in the separate worker binary; this
//! server only records submissions.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bitsleuth-api
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitsleuth_api::app::{build_router, AppState};
use bitsleuth_api::config::Config;
use bitsleuth_shared::chain::TronGridClient;
use bitsleuth_shared::db::{migrations, pool};
use bitsleuth_shared::notify::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bitsleuth_api=debug,bitsleuth_shared=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "BitSleuth API server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(bitsleuth_shared::db::pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    migrations::run_migrations(&db).await?;

    let chain = Arc::new(TronGridClient::new(
        &config.payments.tron_api_base,
        config.payments.tron_api_key.clone(),
    )?);
    let notifier = Arc::new(Notifier::new(
        config.telegram.bot_token.clone(),
        config.telegram.admin_chat_id.clone(),
    )?);

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config, chain, notifier);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("API server shut down");

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
