/// Invoice model and database operations
///
/// An invoice is a priced request for access: which plan the user wants and
/// how much USDT is owed for it. Invoices move `pending` -> `confirmed`,
/// never backward, and only the confirmation engine flips them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invoices (
///     id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id         UUID NOT NULL REFERENCES users (id),
///     plan            VARCHAR(16) NOT NULL,
///     expected_amount DOUBLE PRECISION NOT NULL,
///     currency        VARCHAR(8) NOT NULL DEFAULT 'USDT',
///     status          VARCHAR(16) NOT NULL DEFAULT 'pending',
///     created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Waiting for a confirmed payment
    Pending,

    /// A payment settled against this invoice
    Confirmed,
}

impl InvoiceStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Confirmed => "confirmed",
        }
    }

    /// Parses the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "confirmed" => Some(InvoiceStatus::Confirmed),
            _ => None,
        }
    }

    /// Status transitions only move forward
    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        matches!(
            (self, target),
            (InvoiceStatus::Pending, InvoiceStatus::Confirmed)
        )
    }
}

/// Invoice: a record of an amount owed by a user for a named plan
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Requested plan tier ("1week", "1month", "3months")
    pub plan: String,

    /// Amount owed
    pub expected_amount: f64,

    /// Currency (always USDT at the moment)
    pub currency: String,

    /// "pending" or "confirmed"
    pub status: String,

    /// When the invoice was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new invoice
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    /// Owning user
    pub user_id: Uuid,

    /// Plan tier name
    pub plan: String,

    /// Amount owed for the plan
    pub expected_amount: f64,

    /// Currency code
    pub currency: String,
}

impl Invoice {
    /// Creates a new pending invoice
    pub async fn create(pool: &PgPool, data: CreateInvoice) -> Result<Self, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (user_id, plan, expected_amount, currency)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, plan, expected_amount, currency, status, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.plan)
        .bind(data.expected_amount)
        .bind(data.currency)
        .fetch_one(pool)
        .await?;

        Ok(invoice)
    }

    /// Finds an invoice by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, plan, expected_amount, currency, status, created_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Finds an invoice by ID, scoped to its owner
    ///
    /// Used by user-facing endpoints so one user cannot read another's
    /// invoices.
    pub async fn find_by_id_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, plan, expected_amount, currency, status, created_at
            FROM invoices
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(
            InvoiceStatus::parse(InvoiceStatus::Pending.as_str()),
            Some(InvoiceStatus::Pending)
        );
        assert_eq!(
            InvoiceStatus::parse(InvoiceStatus::Confirmed.as_str()),
            Some(InvoiceStatus::Confirmed)
        );
        assert_eq!(InvoiceStatus::parse("failed"), None);
    }

    #[test]
    fn test_transitions_are_forward_only() {
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Confirmed));
        assert!(!InvoiceStatus::Confirmed.can_transition_to(InvoiceStatus::Pending));
        assert!(!InvoiceStatus::Confirmed.can_transition_to(InvoiceStatus::Confirmed));
    }
}
