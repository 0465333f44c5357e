/// Address scanning endpoints
///
/// # Endpoints
///
/// - `POST /api/scan/check-address` - Server-side balance check for a
///   Tron address (authenticated)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use bitsleuth_shared::{auth::middleware::AuthContext, models::audit::AuditLog};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// Address check request
#[derive(Debug, Deserialize, Validate)]
pub struct CheckAddressRequest {
    /// Tron base58 address to check
    #[validate(length(min = 26, max = 64, message = "Invalid address length"))]
    pub address: String,
}

/// Address check response
#[derive(Debug, Serialize)]
pub struct CheckAddressResponse {
    /// The checked address
    pub address: String,

    /// Balance in sun (1 TRX = 1,000,000 sun); 0 if unfunded or the
    /// lookup failed
    pub balance: i64,

    /// Whether the address holds any balance
    pub has_balance: bool,
}

/// Check whether a Tron address holds a balance
///
/// Gateway failures are reported as a zero balance rather than an
/// error; the caller can simply retry. A funded hit notifies the admin
/// chat and is recorded in the audit log.
pub async fn check_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CheckAddressRequest>,
) -> ApiResult<Json<CheckAddressResponse>> {
    req.validate()?;

    let balance = state
        .chain
        .account_balance(&req.address)
        .await
        .unwrap_or(0);

    if balance > 0 {
        state
            .notifier
            .send(&format!(
                "🎯 <b>Funded wallet detected</b>\nAddress: <code>{}</code>\nBalance: {} TRX\nUser: {}",
                req.address,
                balance as f64 / 1_000_000.0,
                auth.email,
            ))
            .await;

        AuditLog::record(
            &state.db,
            &auth.email,
            "funded_wallet_found",
            json!({ "address": req.address, "balance": balance }),
        )
        .await?;
    }

    Ok(Json(CheckAddressResponse {
        has_balance: balance > 0,
        address: req.address,
        balance,
    }))
}
