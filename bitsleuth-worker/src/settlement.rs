/// Settlement: confirmation math and the access grant
///
/// Settlement is the act of crediting a user once their payment is both
/// sufficiently confirmed and sufficient in amount. The decision logic
/// (confirmation counting, the settlement gate, access-time stacking) is
/// kept in plain functions so it can be tested without a database; the
/// grant itself runs inside a single SQL transaction.
///
/// # Double-settlement safety
///
/// The grant claims the payment with a conditional update:
///
/// ```sql
/// UPDATE payments SET status = 'confirmed', ...
/// WHERE id = $1 AND status = 'pending'
/// ```
///
/// Zero rows affected means another cycle (or another process instance)
/// already settled this payment, and the whole grant is a no-op. Combined
/// with the transaction wrapping the payment/invoice/user triple, a crash
/// or a racing poller cannot double-credit a user or leave a
/// partially-settled state.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;

use bitsleuth_shared::models::payment::{Payment, PaymentStatus};
use bitsleuth_shared::models::plan::Plan;

/// Number of confirmations a transaction in `tx_block` has at `height`
///
/// The inclusion block itself counts as confirmation 1, so at
/// `height = 105` a transaction in block 100 has 6 confirmations.
pub fn confirmation_count(height: i64, tx_block: i64) -> i64 {
    height - tx_block + 1
}

/// New access expiry after a grant
///
/// Stacks the plan duration on top of an existing unexpired subscription;
/// an expired (or absent) subscription is anchored to `now` rather than
/// extended from the stale timestamp.
pub fn stacked_access_until(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration: Duration,
) -> DateTime<Utc> {
    let anchor = match current {
        Some(until) if until > now => until,
        _ => now,
    };
    anchor + duration
}

/// The settlement gate
///
/// A payment settles only when all three hold:
/// - it has reached the required confirmation count,
/// - it is still `pending` (idempotence at the logic level; the
///   conditional update enforces it at the store level),
/// - the submitted amount covers the invoice, so an under-paid invoice
///   never silently grants access.
pub fn meets_settlement_gate(
    status: Option<PaymentStatus>,
    confirmations: i64,
    required: i64,
    amount: f64,
    expected_amount: f64,
) -> bool {
    status == Some(PaymentStatus::Pending)
        && confirmations >= required
        && amount >= expected_amount
}

/// Outcome of a settlement attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// Access was granted
    Granted {
        /// Email of the credited user (for notifications)
        user_email: String,

        /// The user's new access expiry
        access_until: DateTime<Utc>,
    },

    /// Another cycle already settled this payment; nothing was changed
    AlreadySettled,

    /// The owning user no longer exists; the payment was marked failed
    /// and a `payment_orphaned` audit entry written
    OrphanedUser,
}

/// Settles a payment that has passed the gate
///
/// Runs the whole grant in one transaction: claim the payment
/// (conditional update), extend the user's access, flip the premium flag,
/// confirm the invoice, and write the audit record. Notifications are the
/// caller's responsibility, after commit.
///
/// # Errors
///
/// Returns an error on database failure; the transaction rolls back and
/// the payment stays pending for the next cycle.
pub async fn settle_payment(
    pool: &PgPool,
    payment: &Payment,
) -> Result<SettlementOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Claim the payment; zero rows means someone else already settled it
    let claimed = sqlx::query(
        r#"
        UPDATE payments
        SET status = $2, confirmed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = $3
        "#,
    )
    .bind(payment.id)
    .bind(PaymentStatus::Confirmed.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        return Ok(SettlementOutcome::AlreadySettled);
    }

    // Lock the user row for the duration of the grant
    let user_row: Option<(String, Option<DateTime<Utc>>)> =
        sqlx::query_as("SELECT email, access_until FROM users WHERE id = $1 FOR UPDATE")
            .bind(payment.user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some((user_email, current_access)) = user_row else {
        return orphan_payment(tx, payment).await;
    };

    // Unknown plan tier falls back to the smallest grant
    let plan = Plan::parse(&payment.plan).unwrap_or(Plan::OneWeek);
    let access_until = stacked_access_until(current_access, Utc::now(), plan.grant_duration());

    sqlx::query(
        r#"
        UPDATE users
        SET access_until = $2, is_premium = TRUE, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(payment.user_id)
    .bind(access_until)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE invoices SET status = $2 WHERE id = $1")
        .bind(payment.invoice_id)
        .bind("confirmed")
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO audit_log (actor, action, details) VALUES ($1, $2, $3)")
        .bind("system")
        .bind("payment_confirmed")
        .bind(json!({
            "payment_id": payment.id,
            "user_id": payment.user_id,
            "invoice_id": payment.invoice_id,
            "amount": payment.amount,
            "plan": payment.plan,
            "access_until": access_until,
        }))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(SettlementOutcome::Granted {
        user_email,
        access_until,
    })
}

/// Terminates a payment whose owning user no longer exists
///
/// The payment can never settle, so it is moved to `failed` (instead of
/// being silently re-polled forever) and the anomaly gets a durable audit
/// record.
async fn orphan_payment(
    mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
    payment: &Payment,
) -> Result<SettlementOutcome, sqlx::Error> {
    warn!(
        payment_id = %payment.id,
        user_id = %payment.user_id,
        "Payment references a missing user, marking failed"
    );

    sqlx::query(
        r#"
        UPDATE payments
        SET status = $2, confirmed_at = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(payment.id)
    .bind(PaymentStatus::Failed.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO audit_log (actor, action, details) VALUES ($1, $2, $3)")
        .bind("system")
        .bind("payment_orphaned")
        .bind(json!({
            "payment_id": payment.id,
            "user_id": payment.user_id,
            "invoice_id": payment.invoice_id,
            "tx_hash": payment.tx_hash,
        }))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(SettlementOutcome::OrphanedUser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_count() {
        // Inclusion block counts as confirmation 1
        assert_eq!(confirmation_count(105, 100), 6);
        assert_eq!(confirmation_count(100, 100), 1);
        assert_eq!(confirmation_count(102, 100), 3);
    }

    #[test]
    fn test_confirmation_count_is_monotonic_in_height() {
        let tx_block = 50_000;
        let mut last = confirmation_count(tx_block, tx_block);
        for height in (tx_block + 1)..(tx_block + 10) {
            let next = confirmation_count(height, tx_block);
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_stacking_no_prior_access() {
        let now = Utc::now();
        let result = stacked_access_until(None, now, Duration::days(7));
        assert_eq!(result, now + Duration::days(7));
    }

    #[test]
    fn test_stacking_onto_unexpired_subscription() {
        // access_until = T + 3d, settling 1week at T => T + 3d + 7d
        let now = Utc::now();
        let current = Some(now + Duration::days(3));
        let result = stacked_access_until(current, now, Duration::days(7));
        assert_eq!(result, now + Duration::days(10));
    }

    #[test]
    fn test_expired_subscription_anchors_to_now() {
        // An expired timestamp is not extended, only now is
        let now = Utc::now();
        let current = Some(now - Duration::days(30));
        let result = stacked_access_until(current, now, Duration::days(7));
        assert_eq!(result, now + Duration::days(7));
    }

    #[test]
    fn test_gate_requires_threshold() {
        assert!(!meets_settlement_gate(
            Some(PaymentStatus::Pending),
            2,
            3,
            10.0,
            10.0
        ));
        assert!(meets_settlement_gate(
            Some(PaymentStatus::Pending),
            3,
            3,
            10.0,
            10.0
        ));
    }

    #[test]
    fn test_gate_rejects_underpaid() {
        // Under-paid invoices never settle, however many confirmations
        assert!(!meets_settlement_gate(
            Some(PaymentStatus::Pending),
            1000,
            3,
            9.99,
            10.0
        ));
    }

    #[test]
    fn test_gate_accepts_overpaid() {
        assert!(meets_settlement_gate(
            Some(PaymentStatus::Pending),
            3,
            3,
            11.0,
            10.0
        ));
    }

    #[test]
    fn test_gate_requires_pending_status() {
        // Idempotence: a settled or failed payment never re-enters the grant
        assert!(!meets_settlement_gate(
            Some(PaymentStatus::Confirmed),
            10,
            3,
            10.0,
            10.0
        ));
        assert!(!meets_settlement_gate(
            Some(PaymentStatus::Failed),
            10,
            3,
            10.0,
            10.0
        ));
        assert!(!meets_settlement_gate(None, 10, 3, 10.0, 10.0));
    }
}
