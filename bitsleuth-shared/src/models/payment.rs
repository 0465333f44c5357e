/// Payment model and database operations
///
/// A payment is a claimed on-chain transaction submitted against an
/// invoice. The confirmation engine is the only writer after creation:
/// it pins `tx_block` once, keeps `confirmations` current for UI display,
/// and moves the payment to a terminal state (`confirmed` or `failed`).
/// A confirmed payment is immutable.
///
/// `tx_hash` is unique once set (partial unique index), which is what
/// makes duplicate submissions collapse onto the original record.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id         UUID NOT NULL REFERENCES users (id),
///     invoice_id      UUID NOT NULL REFERENCES invoices (id),
///     tx_hash         VARCHAR(128),
///     from_address    VARCHAR(64),
///     to_address      VARCHAR(64) NOT NULL,
///     amount          DOUBLE PRECISION NOT NULL DEFAULT 0,
///     expected_amount DOUBLE PRECISION NOT NULL,
///     currency        VARCHAR(8) NOT NULL DEFAULT 'USDT',
///     plan            VARCHAR(16) NOT NULL,
///     status          VARCHAR(16) NOT NULL DEFAULT 'pending',
///     confirmations   BIGINT NOT NULL DEFAULT 0,
///     tx_block        BIGINT,
///     confirmed_at    TIMESTAMPTZ,
///     created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting enough confirmations
    Pending,

    /// Settled; user was credited
    Confirmed,

    /// Terminal failure (e.g. the owning user no longer exists)
    Failed,
}

impl PaymentStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parses the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "confirmed" => Some(PaymentStatus::Confirmed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Failed)
    }

    /// Valid transitions: pending -> confirmed, pending -> failed
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Confirmed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

/// Payment: a claimed on-chain transaction against an invoice
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    /// Unique payment ID
    pub id: Uuid,

    /// Paying user
    pub user_id: Uuid,

    /// Invoice this payment is claimed against
    pub invoice_id: Uuid,

    /// On-chain transaction hash (unique once set)
    pub tx_hash: Option<String>,

    /// Sender address, if known
    pub from_address: Option<String>,

    /// Deposit wallet address the user was told to pay
    pub to_address: String,

    /// Amount observed/submitted
    pub amount: f64,

    /// Amount the invoice requires
    pub expected_amount: f64,

    /// Currency code
    pub currency: String,

    /// Plan tier, denormalized from the invoice at submission time
    pub plan: String,

    /// "pending", "confirmed", or "failed"
    pub status: String,

    /// Live confirmation count; monotonically non-decreasing once
    /// `tx_block` is set
    pub confirmations: i64,

    /// Block that included the transaction; pinned the first time it is
    /// observed and never moved afterwards
    pub tx_block: Option<i64>,

    /// When the payment settled
    pub confirmed_at: Option<DateTime<Utc>>,

    /// When the payment was submitted
    pub created_at: DateTime<Utc>,

    /// When the payment was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new payment
#[derive(Debug, Clone)]
pub struct CreatePayment {
    /// Paying user
    pub user_id: Uuid,

    /// Target invoice
    pub invoice_id: Uuid,

    /// Submitted transaction hash
    pub tx_hash: String,

    /// Deposit wallet address
    pub to_address: String,

    /// Submitted amount
    pub amount: f64,

    /// Amount owed per the invoice
    pub expected_amount: f64,

    /// Currency code
    pub currency: String,

    /// Plan tier, copied from the invoice
    pub plan: String,

    /// Inclusion block if already visible at submission time
    pub tx_block: Option<i64>,
}

impl Payment {
    /// Typed view of the status column
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }

    /// Creates a new pending payment
    ///
    /// # Errors
    ///
    /// Returns a unique-constraint error if the tx_hash is already
    /// recorded; callers should look the existing payment up first via
    /// [`Payment::find_by_tx_hash`].
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, invoice_id, tx_hash, to_address,
                                  amount, expected_amount, currency, plan, tx_block)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, invoice_id, tx_hash, from_address, to_address,
                      amount, expected_amount, currency, plan, status,
                      confirmations, tx_block, confirmed_at, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.invoice_id)
        .bind(data.tx_hash)
        .bind(data.to_address)
        .bind(data.amount)
        .bind(data.expected_amount)
        .bind(data.currency)
        .bind(data.plan)
        .bind(data.tx_block)
        .fetch_one(pool)
        .await?;

        Ok(payment)
    }

    /// Creates a payment, or returns the existing one for this tx_hash
    ///
    /// Two racing submissions of the same hash both reach the INSERT; the
    /// loser hits the unique index and is handed the winner's record
    /// instead of an error. The bool is true when the returned payment was
    /// newly created by this call.
    pub async fn create_or_existing(
        pool: &PgPool,
        data: CreatePayment,
    ) -> Result<(Self, bool), sqlx::Error> {
        let tx_hash = data.tx_hash.clone();

        match Self::create(pool, data).await {
            Ok(payment) => Ok((payment, true)),
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some("idx_payments_tx_hash") =>
            {
                match Self::find_by_tx_hash(pool, &tx_hash).await? {
                    Some(existing) => Ok((existing, false)),
                    None => Err(sqlx::Error::RowNotFound),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Finds a payment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                   amount, expected_amount, currency, plan, status,
                   confirmations, tx_block, confirmed_at, created_at, updated_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Finds a payment by transaction hash
    ///
    /// The tx_hash uniquely identifies at most one payment; duplicate
    /// submissions are resolved against this lookup.
    pub async fn find_by_tx_hash(
        pool: &PgPool,
        tx_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                   amount, expected_amount, currency, plan, status,
                   confirmations, tx_block, confirmed_at, created_at, updated_at
            FROM payments
            WHERE tx_hash = $1
            "#,
        )
        .bind(tx_hash)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Loads a bounded batch of pending payments for one poll cycle
    ///
    /// Oldest first; pending payments beyond the batch are picked up in a
    /// later cycle.
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                   amount, expected_amount, currency, plan, status,
                   confirmations, tx_block, confirmed_at, created_at, updated_at
            FROM payments
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(PaymentStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Lists payments claimed against an invoice
    pub async fn list_by_invoice(
        pool: &PgPool,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                   amount, expected_amount, currency, plan, status,
                   confirmations, tx_block, confirmed_at, created_at, updated_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Lists recent payments, optionally filtered by status (admin)
    pub async fn list_recent(
        pool: &PgPool,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = match status {
            Some(status) => {
                sqlx::query_as::<_, Payment>(
                    r#"
                    SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                           amount, expected_amount, currency, plan, status,
                           confirmations, tx_block, confirmed_at, created_at, updated_at
                    FROM payments
                    WHERE status = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#,
                )
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Payment>(
                    r#"
                    SELECT id, user_id, invoice_id, tx_hash, from_address, to_address,
                           amount, expected_amount, currency, plan, status,
                           confirmations, tx_block, confirmed_at, created_at, updated_at
                    FROM payments
                    ORDER BY created_at DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(payments)
    }

    /// Pins the inclusion block the first time it becomes known
    ///
    /// The `tx_block IS NULL` guard keeps the anchor stable: confirmation
    /// counting must measure from a fixed block, not a moving one.
    pub async fn set_tx_block(
        pool: &PgPool,
        id: Uuid,
        tx_block: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET tx_block = $2, updated_at = NOW()
            WHERE id = $1 AND tx_block IS NULL
            "#,
        )
        .bind(id)
        .bind(tx_block)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persists the live confirmation count
    ///
    /// Written every cycle even below the settlement threshold so the UI
    /// can show progress.
    pub async fn set_confirmations(
        pool: &PgPool,
        id: Uuid,
        confirmations: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE payments
            SET confirmations = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(confirmations)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Counts all payments
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Counts payments in a given status
    pub async fn count_by_status(
        pool: &PgPool,
        status: PaymentStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Confirmed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("settled"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Confirmed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_transitions_are_forward_only() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Confirmed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Confirmed.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Confirmed.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Confirmed));
    }
}
