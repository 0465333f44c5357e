/// Mock chain client for tests
///
/// Deterministic [`ChainClient`] implementation backed by in-memory maps.
/// Used to exercise the confirmation engine without a network: tests set a
/// fixed height and register transactions at known blocks.
///
/// # Example
///
/// ```
/// use bitsleuth_shared::chain::{ChainClient, MockChainClient};
///
/// # async fn example() {
/// let chain = MockChainClient::new(105);
/// chain.insert_transaction("abc123", Some(100));
///
/// assert_eq!(chain.current_block_height().await, 105);
/// let tx = chain.transaction("abc123").await.unwrap();
/// assert_eq!(tx.included_block(), Some(100));
/// assert!(chain.transaction("unknown").await.is_none());
/// # }
/// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use super::{ChainClient, ChainTransaction};

/// In-memory chain client
#[derive(Debug, Default)]
pub struct MockChainClient {
    height: AtomicI64,
    transactions: Mutex<HashMap<String, ChainTransaction>>,
    balances: Mutex<HashMap<String, i64>>,
}

impl MockChainClient {
    /// Creates a mock chain at the given height (0 = "gateway down")
    pub fn new(height: i64) -> Self {
        Self {
            height: AtomicI64::new(height),
            transactions: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Moves the chain tip
    pub fn set_height(&self, height: i64) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Registers a transaction, optionally already included in a block
    pub fn insert_transaction(&self, tx_hash: &str, block_number: Option<i64>) {
        self.transactions.lock().unwrap().insert(
            tx_hash.to_string(),
            ChainTransaction {
                tx_id: Some(tx_hash.to_string()),
                block_number,
            },
        );
    }

    /// Registers an account balance
    pub fn insert_balance(&self, address: &str, balance: i64) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), balance);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn current_block_height(&self) -> i64 {
        self.height.load(Ordering::SeqCst)
    }

    async fn transaction(&self, tx_hash: &str) -> Option<ChainTransaction> {
        self.transactions.lock().unwrap().get(tx_hash).cloned()
    }

    async fn account_balance(&self, address: &str) -> Option<i64> {
        self.balances.lock().unwrap().get(address).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_height_and_lookup() {
        let chain = MockChainClient::new(100);
        assert_eq!(chain.current_block_height().await, 100);

        chain.set_height(0);
        assert_eq!(chain.current_block_height().await, 0);

        chain.insert_transaction("deadbeef", None);
        let tx = chain.transaction("deadbeef").await.unwrap();
        assert_eq!(tx.included_block(), None);

        chain.insert_balance("TSm...", 42);
        assert_eq!(chain.account_balance("TSm...").await, Some(42));
        assert_eq!(chain.account_balance("other").await, None);
    }
}
