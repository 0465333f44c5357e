/// Blockchain gateway
///
/// Thin client over a third-party block-explorer API. The poller and the
/// API server only ever need three lookups, captured by the
/// [`ChainClient`] trait:
///
/// - the current chain block height
/// - a transaction by hash
/// - an account balance (stateless `check-address` lookups)
///
/// # Failure contract
///
/// Every method is fail-soft: network errors, timeouts, and malformed
/// responses are logged here and surfaced to callers as the "unknown"
/// sentinel (`0` height, `None` record). Callers treat "not found" and
/// "gateway error" identically: transient-or-absent, retry next cycle.
/// Nothing in this module ever propagates an error upward.
///
/// # Example
///
/// ```no_run
/// use bitsleuth_shared::chain::{ChainClient, TronGridClient};
///
/// # async fn example() {
/// let client = TronGridClient::new("https://api.trongrid.io", None).unwrap();
/// let height = client.current_block_height().await;
/// if height == 0 {
///     // gateway unavailable; skip this cycle
/// }
/// # }
/// ```

pub mod mock;
pub mod trongrid;

pub use mock::MockChainClient;
pub use trongrid::TronGridClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A transaction as reported by the block explorer
///
/// Only the fields the confirmation engine needs are parsed; everything
/// else in the provider response is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainTransaction {
    /// Transaction hash
    #[serde(rename = "txID", default)]
    pub tx_id: Option<String>,

    /// Block that included the transaction; absent while unconfirmed
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<i64>,
}

impl ChainTransaction {
    /// Inclusion block, if the provider has reported one yet
    ///
    /// Providers sometimes report `0` for a not-yet-included transaction;
    /// that is treated the same as absent.
    pub fn included_block(&self) -> Option<i64> {
        self.block_number.filter(|b| *b > 0)
    }
}

/// Gateway to a blockchain explorer API
///
/// Implemented by [`TronGridClient`] in production and
/// [`MockChainClient`] in tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain block height; `0` signals "unknown"
    async fn current_block_height(&self) -> i64;

    /// Looks up a transaction by hash; `None` means not-found OR gateway
    /// failure; callers must treat both as "retry later"
    async fn transaction(&self, tx_hash: &str) -> Option<ChainTransaction>;

    /// Account balance in the chain's base unit; `None` on failure
    async fn account_balance(&self, address: &str) -> Option<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_included_block_absent() {
        let tx = ChainTransaction::default();
        assert_eq!(tx.included_block(), None);
    }

    #[test]
    fn test_included_block_zero_is_absent() {
        let tx = ChainTransaction {
            tx_id: None,
            block_number: Some(0),
        };
        assert_eq!(tx.included_block(), None);
    }

    #[test]
    fn test_included_block_present() {
        let tx = ChainTransaction {
            tx_id: Some("abc".to_string()),
            block_number: Some(62_000_100),
        };
        assert_eq!(tx.included_block(), Some(62_000_100));
    }
}
