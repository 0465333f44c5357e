/// Invoice endpoints
///
/// # Endpoints
///
/// - `POST /api/invoices/create` - Create a pending invoice for a plan
/// - `GET /api/invoices/:id` - Fetch an invoice with its payments
///   (owner-scoped)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use bitsleuth_shared::{
    auth::middleware::AuthContext,
    models::{
        audit::AuditLog,
        invoice::{CreateInvoice, Invoice},
        payment::Payment,
        plan::Plan,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Invoice creation request
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Plan tier name ("1week", "1month", "3months")
    pub plan: String,
}

/// Invoice creation response with payment instructions
#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    /// New invoice ID
    pub invoice_id: Uuid,

    /// Amount owed in USDT
    pub amount: f64,

    /// Currency label shown to the user
    pub currency: String,

    /// Deposit wallet address to pay into
    pub wallet_address: String,

    /// Requested plan tier
    pub plan: String,

    /// Payment instructions
    pub message: String,
}

/// Invoice detail response
#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    /// The invoice
    pub invoice: Invoice,

    /// Payments submitted against it
    pub payments: Vec<Payment>,
}

/// Create a pending invoice for a plan
///
/// Pricing is resolved server-side from the plan tier; the client never
/// supplies an amount.
///
/// # Errors
///
/// - `400 Bad Request`: unknown plan
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateInvoiceRequest>,
) -> ApiResult<Json<CreateInvoiceResponse>> {
    let plan = Plan::parse(&req.plan)
        .ok_or_else(|| ApiError::BadRequest("Invalid plan".to_string()))?;

    let invoice = Invoice::create(
        &state.db,
        CreateInvoice {
            user_id: auth.user_id,
            plan: plan.as_str().to_string(),
            expected_amount: plan.price_usdt(),
            currency: "USDT".to_string(),
        },
    )
    .await?;

    AuditLog::record(
        &state.db,
        &auth.email,
        "invoice_created",
        json!({ "invoice_id": invoice.id, "plan": plan.as_str() }),
    )
    .await?;

    Ok(Json(CreateInvoiceResponse {
        invoice_id: invoice.id,
        amount: invoice.expected_amount,
        currency: "USDT (TRC20)".to_string(),
        wallet_address: state.config.payments.wallet_address.clone(),
        plan: plan.as_str().to_string(),
        message: format!(
            "Please send exact amount to the wallet address. \
             Payment will be confirmed after {} blocks.",
            state.config.payments.required_confirmations
        ),
    }))
}

/// Fetch an invoice with its payments
///
/// Lookup is scoped to the authenticated user; another user's invoice
/// ID returns 404, not 403, to avoid confirming its existence.
///
/// # Errors
///
/// - `404 Not Found`: no such invoice for this user
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<Json<InvoiceDetailResponse>> {
    let invoice = Invoice::find_by_id_for_user(&state.db, invoice_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    let payments = Payment::list_by_invoice(&state.db, invoice.id).await?;

    Ok(Json(InvoiceDetailResponse { invoice, payments }))
}
