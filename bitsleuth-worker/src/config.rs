/// Worker configuration
///
/// Loaded once at startup from environment variables and passed by
/// reference into the poller; business logic never reads ambient process
/// state.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `TRON_API_BASE`: block explorer base URL (default: https://api.trongrid.io)
/// - `TRON_API_KEY`: optional TronGrid API key
/// - `REQUIRED_CONF`: confirmations required to settle (default: 3)
/// - `POLL_INTERVAL_SECS`: sleep between successful cycles (default: 30)
/// - `ERROR_BACKOFF_SECS`: sleep after a failed cycle (default: 60)
/// - `POLL_BATCH_SIZE`: max pending payments per cycle (default: 100)
/// - `TELEGRAM_BOT_TOKEN`: optional notification bot token
/// - `ADMIN_TELEGRAM_ID`: chat that receives settlement alerts

use bitsleuth_shared::db::pool::DatabaseConfig;
use std::env;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Block explorer base URL
    pub tron_api_base: String,

    /// Optional TronGrid API key
    pub tron_api_key: Option<String>,

    /// Telegram bot token (None disables notifications)
    pub telegram_bot_token: Option<String>,

    /// Telegram chat id for settlement alerts
    pub admin_telegram_id: String,

    /// Confirmations required before settlement
    pub required_confirmations: i64,

    /// Seconds between successful poll cycles
    pub poll_interval_secs: u64,

    /// Seconds to back off after a failed cycle
    pub error_backoff_secs: u64,

    /// Max pending payments examined per cycle
    pub poll_batch_size: i64,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let tron_api_base =
            env::var("TRON_API_BASE").unwrap_or_else(|_| "https://api.trongrid.io".to_string());
        let tron_api_key = env::var("TRON_API_KEY").ok().filter(|s| !s.is_empty());

        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty());
        let admin_telegram_id = env::var("ADMIN_TELEGRAM_ID").unwrap_or_default();

        let required_confirmations = env::var("REQUIRED_CONF")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<i64>()?;

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;

        let error_backoff_secs = env::var("ERROR_BACKOFF_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()?;

        let poll_batch_size = env::var("POLL_BATCH_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<i64>()?;

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            tron_api_base,
            tron_api_key,
            telegram_bot_token,
            admin_telegram_id,
            required_confirmations,
            poll_interval_secs,
            error_backoff_secs,
            poll_batch_size,
        })
    }
}
