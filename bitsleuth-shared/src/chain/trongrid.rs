/// TronGrid gateway client
///
/// Implements [`ChainClient`] against the TronGrid API:
///
/// - `GET {base}/wallet/getnowblock`: current block height
/// - `GET {base}/v1/transactions/{hash}`: transaction lookup
/// - `GET {base}/v1/accounts/{address}`: account balance
///
/// Requests carry the optional `TRON-PRO-API-KEY` header and a 10 second
/// timeout so a hung remote cannot stall a poll cycle indefinitely.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChainClient, ChainTransaction};

/// Header TronGrid expects the API key in
const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Per-request timeout for all gateway calls
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// TronGrid API client
#[derive(Debug, Clone)]
pub struct TronGridClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// `getnowblock` response, reduced to the block number path
#[derive(Debug, Default, Deserialize)]
struct NowBlockResponse {
    #[serde(default)]
    block_header: BlockHeader,
}

#[derive(Debug, Default, Deserialize)]
struct BlockHeader {
    #[serde(default)]
    raw_data: BlockRawData,
}

#[derive(Debug, Default, Deserialize)]
struct BlockRawData {
    #[serde(default)]
    number: i64,
}

/// `/v1/accounts/{address}` response
#[derive(Debug, Default, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    data: Vec<AccountData>,
}

#[derive(Debug, Default, Deserialize)]
struct AccountData {
    #[serde(default)]
    balance: i64,
}

impl TronGridClient {
    /// Creates a new client
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying HTTP client cannot be
    /// built (invalid TLS configuration).
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        req
    }

    fn parse_now_block(body: &str) -> Option<i64> {
        let parsed: NowBlockResponse = serde_json::from_str(body).ok()?;
        let number = parsed.block_header.raw_data.number;
        (number > 0).then_some(number)
    }

    fn parse_account_balance(body: &str) -> Option<i64> {
        let parsed: AccountResponse = serde_json::from_str(body).ok()?;
        parsed.data.first().map(|account| account.balance)
    }
}

#[async_trait]
impl ChainClient for TronGridClient {
    async fn current_block_height(&self) -> i64 {
        let url = format!("{}/wallet/getnowblock", self.base_url);

        let body = match self.get(url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "Failed to read getnowblock response");
                    return 0;
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to fetch current block height");
                return 0;
            }
        };

        match Self::parse_now_block(&body) {
            Some(height) => height,
            None => {
                warn!("Malformed getnowblock response");
                0
            }
        }
    }

    async fn transaction(&self, tx_hash: &str) -> Option<ChainTransaction> {
        let url = format!("{}/v1/transactions/{}", self.base_url, tx_hash);

        let resp = match self.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(tx_hash = %tx_hash, error = %e, "Failed to fetch transaction");
                return None;
            }
        };

        if !resp.status().is_success() {
            debug!(tx_hash = %tx_hash, status = %resp.status(), "Transaction not found");
            return None;
        }

        match resp.json::<ChainTransaction>().await {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(tx_hash = %tx_hash, error = %e, "Malformed transaction response");
                None
            }
        }
    }

    async fn account_balance(&self, address: &str) -> Option<i64> {
        let url = format!("{}/v1/accounts/{}", self.base_url, address);

        let resp = match self.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to fetch account");
                return None;
            }
        };

        if !resp.status().is_success() {
            debug!(address = %address, status = %resp.status(), "Account lookup failed");
            return None;
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to read account response");
                return None;
            }
        };

        Self::parse_account_balance(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_now_block() {
        let body = r#"{
            "blockID": "0000000003b9f9c4...",
            "block_header": {
                "raw_data": {
                    "number": 62581188,
                    "txTrieRoot": "...",
                    "timestamp": 1717251000000
                },
                "witness_signature": "..."
            }
        }"#;
        assert_eq!(TronGridClient::parse_now_block(body), Some(62581188));
    }

    #[test]
    fn test_parse_now_block_missing_number() {
        assert_eq!(TronGridClient::parse_now_block("{}"), None);
        assert_eq!(
            TronGridClient::parse_now_block(r#"{"block_header":{"raw_data":{}}}"#),
            None
        );
    }

    #[test]
    fn test_parse_now_block_garbage() {
        assert_eq!(TronGridClient::parse_now_block("not json"), None);
    }

    #[test]
    fn test_parse_transaction_response() {
        let body = r#"{"txID": "a9d3...", "blockNumber": 62581100, "ret": [{"contractRet": "SUCCESS"}]}"#;
        let tx: ChainTransaction = serde_json::from_str(body).unwrap();
        assert_eq!(tx.included_block(), Some(62581100));
        assert_eq!(tx.tx_id.as_deref(), Some("a9d3..."));
    }

    #[test]
    fn test_parse_unconfirmed_transaction() {
        // Not yet included: no blockNumber field at all
        let tx: ChainTransaction = serde_json::from_str(r#"{"txID": "a9d3..."}"#).unwrap();
        assert_eq!(tx.included_block(), None);
    }

    #[test]
    fn test_parse_account_balance() {
        let body = r#"{"data": [{"address": "41...", "balance": 1500000}], "success": true}"#;
        assert_eq!(TronGridClient::parse_account_balance(body), Some(1500000));
    }

    #[test]
    fn test_parse_account_balance_empty() {
        assert_eq!(
            TronGridClient::parse_account_balance(r#"{"data": [], "success": true}"#),
            None
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TronGridClient::new("https://api.trongrid.io/", None).unwrap();
        assert_eq!(client.base_url, "https://api.trongrid.io");
    }
}
