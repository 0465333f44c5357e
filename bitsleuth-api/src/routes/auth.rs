/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account
/// - `POST /api/auth/login` - Login and receive a session token
/// - `POST /api/auth/verify-email` - Redeem an email verification token
/// - `GET /api/auth/me` - Current user's profile (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Extension, Json};
use bitsleuth_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        audit::AuditLog,
        user::{CreateUser, User},
    },
    notify,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Status message
    pub message: String,

    /// New user ID
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Subset of the user record returned to the client
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Whether the email has been verified
    pub email_verified: bool,

    /// Whether the user currently holds premium access
    pub is_premium: bool,

    /// Admin flag
    pub is_admin: bool,

    /// Premium access expiry
    pub access_until: Option<DateTime<Utc>>,
}

impl UserSummary {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            email_verified: user.email_verified,
            // Report live access, not the stored flag, so lapsed
            // subscriptions read as non-premium immediately.
            is_premium: user.has_active_access(),
            is_admin: user.is_admin,
            access_until: user.access_until,
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Session JWT
    pub token: String,

    /// The authenticated user
    pub user: UserSummary,
}

/// Email verification request
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    /// Verification token from the registration email
    pub token: Uuid,
}

/// Profile response for `GET /api/auth/me`
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Whether the email has been verified
    pub email_verified: bool,

    /// Whether the user currently holds premium access
    pub is_premium: bool,

    /// Admin flag
    pub is_admin: bool,

    /// Premium access expiry
    pub access_until: Option<DateTime<Utc>>,

    /// Remaining scan quota
    pub scan_quota: i32,
}

/// Register a new user
///
/// The account configured as the admin bootstrap email becomes an admin
/// on registration. A verification token is issued and mailed out; the
/// account works before verification but is flagged unverified.
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;
    let verification_token = Uuid::new_v4();

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.clone(),
            password_hash,
            is_admin: req.email == state.config.api.admin_bootstrap_email,
            verification_token: Some(verification_token),
        },
    )
    .await?;

    // Fire-and-forget; registration succeeds even if the mail fails
    let email = user.email.clone();
    tokio::spawn(async move {
        let link = format!("https://bitsleuth.app/verify?token={}", verification_token);
        notify::send_email(
            &email,
            "Verify your BitSleuth account",
            &format!("Click here to verify: {}", link),
        )
        .await;
    });

    AuditLog::record(
        &state.db,
        &user.email,
        "user_registered",
        json!({ "user_id": user.id }),
    )
    .await?;

    Ok(Json(RegisterResponse {
        message: "Registration successful. Please check your email to verify.".to_string(),
        user_id: user.id,
    }))
}

/// Login and receive a session token
///
/// Unknown email and wrong password return the same error so the
/// endpoint does not leak which addresses are registered.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = jwt::Claims::new(user.id, user.email.clone(), state.config.jwt.ttl_days);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from_user(&user),
    }))
}

/// Redeem an email verification token
///
/// # Errors
///
/// - `404 Not Found`: the token matches no user (already redeemed or
///   never issued)
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::find_by_verification_token(&state.db, req.token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid verification token".to_string()))?;

    User::mark_email_verified(&state.db, user.id).await?;

    AuditLog::record(
        &state.db,
        &user.email,
        "email_verified",
        json!({ "user_id": user.id }),
    )
    .await?;

    Ok(Json(json!({ "message": "Email verified successfully" })))
}

/// Current user's profile
///
/// # Errors
///
/// - `401 Unauthorized`: token valid but the account no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email.clone(),
        email_verified: user.email_verified,
        is_premium: user.has_active_access(),
        is_admin: user.is_admin,
        access_until: user.access_until,
        scan_quota: user.scan_quota,
    }))
}
