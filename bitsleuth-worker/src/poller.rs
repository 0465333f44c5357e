/// Payment confirmation poller
///
/// The main worker loop. Each cycle:
///
/// 1. Fetch the current chain block height; height 0 (gateway down or
///    malformed response) skips the entire cycle; no partial work against
///    a stale or garbage height.
/// 2. Load a bounded batch of pending payments (oldest first; anything
///    beyond the batch is picked up in a later cycle).
/// 3. For each payment: skip if no tx_hash yet, skip if the transaction is
///    not yet visible at the gateway, pin the inclusion block the first
///    time it appears, persist the live confirmation count, and run
///    settlement once the gate passes.
/// 4. Sleep 30s, or 60s after a cycle-level error.
///
/// One payment's failure never aborts the cycle for the others; errors are
/// logged at per-payment granularity.
///
/// # Shutdown
///
/// The loop holds a `CancellationToken`. On cancellation the in-flight
/// cycle finishes, then `run` returns.
///
/// # Deployment
///
/// Exactly one poller instance is assumed per deployment. The conditional
/// update inside settlement keeps a second instance from double-granting,
/// but there is no work-sharing between instances.

use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bitsleuth_shared::chain::ChainClient;
use bitsleuth_shared::models::payment::Payment;
use bitsleuth_shared::notify::{self, Notifier};
use sqlx::PgPool;

use crate::settlement::{
    confirmation_count, meets_settlement_gate, settle_payment, SettlementOutcome,
};

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Sleep between successful cycles
    pub poll_interval: Duration,

    /// Sleep after a cycle-level error
    pub error_backoff: Duration,

    /// Max pending payments per cycle
    pub batch_size: i64,

    /// Confirmations required before settlement
    pub required_confirmations: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            poll_interval: Duration::from_secs(30),
            error_backoff: Duration::from_secs(60),
            batch_size: 100,
            required_confirmations: 3,
        }
    }
}

/// What one poll cycle did
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// Chain height the cycle ran against (0 if unavailable)
    pub height: i64,

    /// Pending payments examined
    pub scanned: usize,

    /// Payments settled this cycle
    pub settled: usize,
}

/// The payment confirmation poller
pub struct PaymentPoller {
    db: PgPool,
    chain: Arc<dyn ChainClient>,
    notifier: Arc<Notifier>,
    config: PollerConfig,
    shutdown_token: CancellationToken,
}

impl PaymentPoller {
    /// Creates a new poller
    pub fn new(
        db: PgPool,
        chain: Arc<dyn ChainClient>,
        notifier: Arc<Notifier>,
        config: PollerConfig,
    ) -> Self {
        PaymentPoller {
            db,
            chain,
            notifier,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token used to signal graceful shutdown from external handlers
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the poll loop until cancelled
    ///
    /// Never returns an error: cycle failures are logged and retried after
    /// the backoff interval.
    pub async fn run(&self) {
        info!(
            required_confirmations = self.config.required_confirmations,
            batch_size = self.config.batch_size,
            "Payment poller starting"
        );

        loop {
            let delay = match self.run_cycle().await {
                Ok(outcome) => {
                    if outcome.settled > 0 {
                        info!(
                            height = outcome.height,
                            scanned = outcome.scanned,
                            settled = outcome.settled,
                            "Poll cycle settled payments"
                        );
                    } else {
                        debug!(
                            height = outcome.height,
                            scanned = outcome.scanned,
                            "Poll cycle complete"
                        );
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    error!(error = %e, "Poll cycle failed, backing off");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested, payment poller stopping");
                    break;
                }
                _ = sleep(delay) => {}
            }
        }
    }

    /// Runs one poll cycle
    ///
    /// # Errors
    ///
    /// Returns an error only for cycle-level failures (the pending-payment
    /// query itself); per-payment failures are contained inside the loop.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, sqlx::Error> {
        let height = self.chain.current_block_height().await;
        if height == 0 {
            // No partial work against an unknown height
            warn!("Chain block height unavailable, skipping cycle");
            return Ok(CycleOutcome::default());
        }

        let pending = Payment::list_pending(&self.db, self.config.batch_size).await?;
        let scanned = pending.len();
        let mut settled = 0;

        for payment in &pending {
            match self.process_payment(payment, height).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(payment_id = %payment.id, error = %e, "Failed to process payment");
                }
            }
        }

        Ok(CycleOutcome {
            height,
            scanned,
            settled,
        })
    }

    /// Processes one pending payment; returns true if it settled
    pub async fn process_payment(
        &self,
        payment: &Payment,
        height: i64,
    ) -> Result<bool, sqlx::Error> {
        // Nothing to check until the user submits a hash
        let Some(tx_hash) = payment.tx_hash.as_deref() else {
            return Ok(false);
        };

        // Not yet propagated, or gateway hiccup: expected transient state
        let Some(tx) = self.chain.transaction(tx_hash).await else {
            debug!(payment_id = %payment.id, "Transaction not yet visible, skipping");
            return Ok(false);
        };

        // Pin the inclusion block once; counting must use a stable anchor.
        // When the conditional update reports the row was already pinned,
        // count from the persisted value, not the block observed here.
        let mut tx_block = payment.tx_block.unwrap_or(0);
        if tx_block == 0 {
            if let Some(block) = tx.included_block() {
                if Payment::set_tx_block(&self.db, payment.id, block).await? {
                    tx_block = block;
                } else {
                    tx_block = Payment::find_by_id(&self.db, payment.id)
                        .await?
                        .and_then(|p| p.tx_block)
                        .unwrap_or(0);
                }
            }
        }

        if tx_block <= 0 {
            return Ok(false);
        }

        let confirmations = confirmation_count(height, tx_block);

        // Written even below the threshold so the UI can show progress
        Payment::set_confirmations(&self.db, payment.id, confirmations).await?;

        if !meets_settlement_gate(
            payment.status(),
            confirmations,
            self.config.required_confirmations,
            payment.amount,
            payment.expected_amount,
        ) {
            return Ok(false);
        }

        match settle_payment(&self.db, payment).await? {
            SettlementOutcome::Granted {
                user_email,
                access_until,
            } => {
                info!(
                    payment_id = %payment.id,
                    user = %user_email,
                    access_until = %access_until,
                    "Payment confirmed, access granted"
                );

                // Best-effort; settlement is already committed
                self.notifier
                    .payment_confirmed(
                        &user_email,
                        payment.amount,
                        &payment.currency,
                        &payment.plan,
                        payment.tx_hash.as_deref(),
                    )
                    .await;
                notify::send_email(
                    &user_email,
                    "BitSleuth Premium Activated",
                    &format!(
                        "Your premium access has been activated until {} UTC",
                        access_until.format("%Y-%m-%d %H:%M:%S")
                    ),
                )
                .await;

                Ok(true)
            }
            SettlementOutcome::AlreadySettled => {
                debug!(payment_id = %payment.id, "Payment already settled elsewhere");
                Ok(false)
            }
            SettlementOutcome::OrphanedUser => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitsleuth_shared::chain::MockChainClient;

    #[test]
    fn test_poller_config_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.error_backoff, Duration::from_secs(60));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.required_confirmations, 3);
    }

    #[tokio::test]
    async fn test_height_gate_uses_zero_sentinel() {
        // The cycle skips entirely when the gateway reports height 0;
        // the poller never reaches the store in that case.
        let chain = MockChainClient::new(0);
        assert_eq!(chain.current_block_height().await, 0);

        chain.set_height(62_000_000);
        assert_eq!(chain.current_block_height().await, 62_000_000);
    }

    #[tokio::test]
    async fn test_unpropagated_transaction_is_skippable() {
        let chain = MockChainClient::new(105);
        assert!(chain.transaction("not-yet-broadcast").await.is_none());

        chain.insert_transaction("now-visible", Some(100));
        let tx = chain.transaction("now-visible").await.unwrap();
        assert_eq!(tx.included_block(), Some(100));
        assert_eq!(
            confirmation_count(chain.current_block_height().await, 100),
            6
        );
    }
}
