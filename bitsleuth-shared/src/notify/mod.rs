/// Best-effort outbound notifications
///
/// Settlement fires a Telegram message to the admin chat and a
/// confirmation email to the user. Both are strictly best-effort: a
/// delivery failure is logged and swallowed, never surfaced to the
/// caller. Settlement must not block or roll back because an alert could
/// not be sent.

use serde_json::json;
use tracing::{error, info, warn};

/// Per-request timeout for the Telegram API
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Telegram notification sink
///
/// With no bot token configured every send is a logged no-op, so
/// development environments work without credentials.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: Option<String>,
    chat_id: String,
}

impl Notifier {
    /// Creates a new notifier
    ///
    /// # Errors
    ///
    /// Returns an error only if the HTTP client cannot be built.
    pub fn new(bot_token: Option<String>, chat_id: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            bot_token,
            chat_id,
        })
    }

    /// Sends a message to the admin chat; failures are swallowed
    pub async fn send(&self, text: &str) {
        let Some(token) = &self.bot_token else {
            warn!("Telegram bot token not configured, skipping notification");
            return;
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                error!(status = %resp.status(), "Telegram API rejected notification");
            }
            Err(e) => {
                error!(error = %e, "Failed to send Telegram notification");
            }
        }
    }

    /// Announces a confirmed payment to the admin chat
    pub async fn payment_confirmed(
        &self,
        user_email: &str,
        amount: f64,
        currency: &str,
        plan: &str,
        tx_hash: Option<&str>,
    ) {
        let text = format!(
            "💰 <b>Payment Confirmed</b>\nUser: {}\nAmount: {} {}\nPlan: {}\nTX: {}",
            user_email,
            amount,
            currency,
            plan,
            tx_hash.unwrap_or("N/A"),
        );
        self.send(&text).await;
    }
}

/// Sends an email to a user
///
/// TODO: wire up SMTP credentials from the environment; until then the
/// message is only logged.
pub async fn send_email(to_email: &str, subject: &str, body: &str) {
    info!(to = %to_email, subject = %subject, body_len = body.len(), "Email would be sent");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_notifier_is_noop() {
        // No token: send must return without error or network traffic
        let notifier = Notifier::new(None, "12345".to_string()).unwrap();
        notifier.send("hello").await;
        notifier
            .payment_confirmed("user@example.com", 10.0, "USDT", "1week", None)
            .await;
    }
}
