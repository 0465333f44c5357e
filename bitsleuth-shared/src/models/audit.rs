/// Append-only audit log
///
/// Every security- or money-relevant event gets a row: registrations,
/// logins, invoice creation, payment submission, settlement, anomalies.
/// Entries are never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    /// Unique entry ID
    pub id: Uuid,

    /// Who performed the action (user email, or "system" for the poller)
    pub actor: String,

    /// Action tag, e.g. "payment_confirmed"
    pub action: String,

    /// Structured detail blob
    pub details: JsonValue,

    /// When the event occurred
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Records an audit event
    ///
    /// # Errors
    ///
    /// Returns an error only on database failure; callers on the request
    /// path generally propagate it, the poller logs and continues.
    pub async fn record(
        pool: &PgPool,
        actor: &str,
        action: &str,
        details: JsonValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO audit_log (actor, action, details) VALUES ($1, $2, $3)")
            .bind(actor)
            .bind(action)
            .bind(details)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Lists the most recent entries, newest first (admin)
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, actor, action, details, created_at
            FROM audit_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}
