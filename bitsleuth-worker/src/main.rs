//! # BitSleuth Payment Worker
//!
//! Runs the payment confirmation poller: watches pending payments, counts
//! confirmations against the current chain height, and grants premium
//! access once the threshold is met.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bitsleuth-worker
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitsleuth_shared::chain::TronGridClient;
use bitsleuth_shared::db::{migrations, pool};
use bitsleuth_shared::notify::Notifier;
use bitsleuth_worker::config::WorkerConfig;
use bitsleuth_worker::poller::{PaymentPoller, PollerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitsleuth_worker=debug,bitsleuth_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "BitSleuth payment worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let db = pool::create_pool(config.database.clone()).await?;
    migrations::run_migrations(&db).await?;

    let chain = Arc::new(TronGridClient::new(
        &config.tron_api_base,
        config.tron_api_key.clone(),
    )?);
    let notifier = Arc::new(Notifier::new(
        config.telegram_bot_token.clone(),
        config.admin_telegram_id.clone(),
    )?);

    let poller = PaymentPoller::new(
        db.clone(),
        chain,
        notifier,
        PollerConfig {
            poll_interval: std::time::Duration::from_secs(config.poll_interval_secs),
            error_backoff: std::time::Duration::from_secs(config.error_backoff_secs),
            batch_size: config.poll_batch_size,
            required_confirmations: config.required_confirmations,
        },
    );

    let shutdown_token = poller.shutdown_token();
    let poller_handle = tokio::spawn(async move { poller.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping poller...");
    shutdown_token.cancel();

    // Let the in-flight cycle finish
    if let Err(e) = poller_handle.await {
        tracing::error!(error = %e, "Poller task panicked");
    }

    pool::close_pool(db).await;
    tracing::info!("Worker shut down");

    Ok(())
}
