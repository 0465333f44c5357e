/// Payment endpoints
///
/// # Endpoints
///
/// - `POST /api/payments/manual` - Submit a transaction hash against an
///   invoice (authenticated)
/// - `POST /api/webhook/tron-payment` - Gateway webhook; acknowledgment
///   only, settlement always flows through the poller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use bitsleuth_shared::{
    auth::middleware::AuthContext,
    models::{
        audit::AuditLog,
        invoice::Invoice,
        payment::{CreatePayment, Payment},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

/// Manual payment submission request
#[derive(Debug, Deserialize)]
pub struct ManualPaymentRequest {
    /// On-chain transaction hash
    pub tx_hash: String,

    /// Invoice the payment is claimed against
    pub invoice_id: Uuid,
}

/// Manual payment submission response
#[derive(Debug, Serialize)]
pub struct ManualPaymentResponse {
    /// Status message
    pub message: String,

    /// Payment record ID
    pub payment_id: Uuid,

    /// Payment status ("pending" on first submission)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Confirmations required before settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations_required: Option<i64>,
}

/// Submit a transaction hash for verification
///
/// The transaction must already be visible on-chain. Resubmitting a
/// known hash is idempotent and returns the existing payment ID instead
/// of an error. Settlement itself happens asynchronously in the poller
/// once the confirmation threshold is met.
///
/// # Errors
///
/// - `404 Not Found`: invoice not found (or not owned by the caller),
///   or the transaction is not visible on the blockchain yet
pub async fn submit_manual(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ManualPaymentRequest>,
) -> ApiResult<Json<ManualPaymentResponse>> {
    let invoice = Invoice::find_by_id_for_user(&state.db, req.invoice_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    // Idempotent resubmission
    if let Some(existing) = Payment::find_by_tx_hash(&state.db, &req.tx_hash).await? {
        return Ok(Json(ManualPaymentResponse {
            message: "Payment already recorded".to_string(),
            payment_id: existing.id,
            status: None,
            confirmations_required: None,
        }));
    }

    let tx = state
        .chain
        .transaction(&req.tx_hash)
        .await
        .ok_or_else(|| {
            ApiError::NotFound("Transaction not found on blockchain".to_string())
        })?;

    // A submission racing past the check above lands on the tx_hash unique
    // index and gets the winner's record back
    let (payment, created) = Payment::create_or_existing(
        &state.db,
        CreatePayment {
            user_id: auth.user_id,
            invoice_id: invoice.id,
            tx_hash: req.tx_hash.clone(),
            to_address: state.config.payments.wallet_address.clone(),
            // The gateway does not expose decoded TRC20 transfer amounts,
            // so the invoice amount is recorded and the chain is the
            // source of truth for confirmations only.
            amount: invoice.expected_amount,
            expected_amount: invoice.expected_amount,
            currency: invoice.currency.clone(),
            plan: invoice.plan.clone(),
            tx_block: tx.included_block(),
        },
    )
    .await?;

    if !created {
        return Ok(Json(ManualPaymentResponse {
            message: "Payment already recorded".to_string(),
            payment_id: payment.id,
            status: None,
            confirmations_required: None,
        }));
    }

    AuditLog::record(
        &state.db,
        &auth.email,
        "payment_submitted",
        json!({ "payment_id": payment.id, "tx_hash": req.tx_hash }),
    )
    .await?;

    Ok(Json(ManualPaymentResponse {
        message: "Payment submitted for verification".to_string(),
        payment_id: payment.id,
        status: Some("pending".to_string()),
        confirmations_required: Some(state.config.payments.required_confirmations),
    }))
}

/// Gateway webhook for Tron payment notifications
///
/// Acknowledgment only. The webhook confirms the transaction is visible
/// on-chain and logs it; it never creates or settles payments, so a
/// forged webhook cannot grant access. Settlement flows exclusively
/// through the confirmation poller.
pub async fn tron_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    info!(payload = %body, "Received tron webhook");

    let tx_hash = body
        .get("txID")
        .or_else(|| body.get("tx_hash"))
        .and_then(|v| v.as_str());

    let Some(tx_hash) = tx_hash else {
        return Ok(Json(json!({ "status": "ignored", "reason": "no tx_hash" })));
    };

    if state.chain.transaction(tx_hash).await.is_none() {
        warn!(tx_hash = %tx_hash, "Webhook referenced unknown transaction");
        return Ok(Json(json!({ "status": "error", "reason": "tx not found" })));
    }

    Ok(Json(json!({ "status": "received" })))
}
