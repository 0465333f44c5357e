/// Configuration management for the API server
///
/// Loads a type-safe configuration struct from environment variables once
/// at startup. The struct is passed into the router state; business logic
/// never reads the process environment directly.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind (default: 0.0.0.0)
/// - `API_PORT`: port to bind (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: *)
/// - `PRODUCTION`: enables HSTS and strict CORS (default: false)
/// - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `JWT_TTL_DAYS`: session token lifetime (default: 30)
/// - `WALLET_TRON_ADDRESS`: deposit wallet shown on invoices
/// - `TRON_API_BASE`: block explorer base URL (default: https://api.trongrid.io)
/// - `TRON_API_KEY`: optional TronGrid API key
/// - `USDT_CONTRACT_ADDRESS`: TRC20 USDT contract
/// - `REQUIRED_CONF`: confirmations required to settle (default: 3)
/// - `TELEGRAM_BOT_TOKEN` / `ADMIN_TELEGRAM_ID`: notification bot
/// - `ADMIN_BOOTSTRAP_EMAIL`: registering with this email creates the
///   first admin account
///
/// # Example
///
/// ```no_run
/// use bitsleuth_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Payment configuration
    pub payments: PaymentConfig,

    /// Telegram notification configuration
    pub telegram: TelegramConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins ("*" alone means permissive)
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on, strict CORS)
    pub production: bool,

    /// Registering with this email bootstraps the first admin
    pub admin_bootstrap_email: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing (at least 32 bytes)
    pub secret: String,

    /// Session token lifetime in days
    pub ttl_days: i64,
}

/// Payment pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Deposit wallet address users pay into
    pub wallet_address: String,

    /// Block explorer base URL
    pub tron_api_base: String,

    /// Optional TronGrid API key
    pub tron_api_key: Option<String>,

    /// TRC20 USDT contract address
    pub usdt_contract_address: String,

    /// Confirmations required before settlement
    pub required_confirmations: i64,
}

/// Telegram notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (None disables notifications)
    pub bot_token: Option<String>,

    /// Chat that receives alerts
    pub admin_chat_id: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric
    /// variable does not parse, or the JWT secret is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (development convenience)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let admin_bootstrap_email =
            env::var("ADMIN_BOOTSTRAP_EMAIL").unwrap_or_else(|_| "admin@bitsleuth.com".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_ttl_days = env::var("JWT_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<i64>()?;

        let wallet_address = env::var("WALLET_TRON_ADDRESS").unwrap_or_default();

        let tron_api_base =
            env::var("TRON_API_BASE").unwrap_or_else(|_| "https://api.trongrid.io".to_string());
        let tron_api_key = env::var("TRON_API_KEY").ok().filter(|s| !s.is_empty());

        let usdt_contract_address = env::var("USDT_CONTRACT_ADDRESS").unwrap_or_default();

        let required_confirmations = env::var("REQUIRED_CONF")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<i64>()?;

        let bot_token = env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty());
        let admin_chat_id = env::var("ADMIN_TELEGRAM_ID").unwrap_or_default();

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                admin_bootstrap_email,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_days: jwt_ttl_days,
            },
            payments: PaymentConfig {
                wallet_address,
                tron_api_base,
                tron_api_key,
                usdt_contract_address,
                required_confirmations,
            },
            telegram: TelegramConfig {
                bot_token,
                admin_chat_id,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
                admin_bootstrap_email: "admin@bitsleuth.com".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                ttl_days: 30,
            },
            payments: PaymentConfig {
                wallet_address: "TSmGGiUm7EC77qfa4E6CaSFtn9GT2G5du8".to_string(),
                tron_api_base: "https://api.trongrid.io".to_string(),
                tron_api_key: None,
                usdt_contract_address: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
                required_confirmations: 3,
            },
            telegram: TelegramConfig {
                bot_token: None,
                admin_chat_id: String::new(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(sample_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_confirmation_threshold() {
        assert_eq!(sample_config().payments.required_confirmations, 3);
    }
}
