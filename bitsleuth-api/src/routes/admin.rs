/// Admin dashboard endpoints
///
/// All handlers require a valid JWT (enforced by the router layer) and
/// the admin flag on the account (enforced here, per request, so a
/// revoked admin loses access on their next call).
///
/// # Endpoints
///
/// - `GET /api/admin/stats` - Aggregate counters
/// - `GET /api/admin/payments` - Recent payments, optional status filter
/// - `GET /api/admin/users` - Recent users
/// - `GET /api/admin/audit-log` - Recent audit entries

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use bitsleuth_shared::{
    auth::middleware::AuthContext,
    models::{
        audit::AuditLog,
        payment::{Payment, PaymentStatus},
        user::User,
    },
};
use serde::{Deserialize, Serialize};

/// Default page size for admin listings
const DEFAULT_LIMIT: i64 = 100;

/// Aggregate dashboard counters
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Total registered users
    pub total_users: i64,

    /// Users currently flagged premium
    pub premium_users: i64,

    /// Total payment records
    pub total_payments: i64,

    /// Settled payments
    pub confirmed_payments: i64,

    /// Payments awaiting confirmation
    pub pending_payments: i64,
}

/// Query string for the payments listing
#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    /// Optional status filter ("pending", "confirmed", "failed")
    pub status: Option<String>,
}

/// Query string for the audit log listing
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    /// Maximum number of entries to return
    pub limit: Option<i64>,
}

/// Loads the caller's account and verifies the admin flag
async fn require_admin(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if !user.is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    Ok(user)
}

/// Aggregate counters for the dashboard
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<StatsResponse>> {
    require_admin(&state, &auth).await?;

    let total_users = User::count(&state.db).await?;
    let premium_users = User::count_premium(&state.db).await?;
    let total_payments = Payment::count(&state.db).await?;
    let confirmed_payments =
        Payment::count_by_status(&state.db, PaymentStatus::Confirmed).await?;
    let pending_payments = Payment::count_by_status(&state.db, PaymentStatus::Pending).await?;

    Ok(Json(StatsResponse {
        total_users,
        premium_users,
        total_payments,
        confirmed_payments,
        pending_payments,
    }))
}

/// Recent payments, newest first, optionally filtered by status
///
/// An unknown status value filters nothing out rather than erroring;
/// the dashboard treats it as "all".
pub async fn payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PaymentsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&state, &auth).await?;

    let status = query.status.as_deref().and_then(PaymentStatus::parse);
    let payments = Payment::list_recent(&state.db, status, DEFAULT_LIMIT).await?;

    Ok(Json(serde_json::json!({ "payments": payments })))
}

/// Recent users, newest first
///
/// Password hashes and verification tokens are skipped by the model's
/// serializer.
pub async fn users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&state, &auth).await?;

    let users = User::list_recent(&state.db, DEFAULT_LIMIT).await?;

    Ok(Json(serde_json::json!({ "users": users })))
}

/// Recent audit log entries, newest first
pub async fn audit_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&state, &auth).await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 1000);
    let logs = AuditLog::list_recent(&state.db, limit).await?;

    Ok(Json(serde_json::json!({ "logs": logs })))
}
