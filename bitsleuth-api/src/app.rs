/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bitsleuth_api::{app::AppState, config::Config};
/// use bitsleuth_shared::{chain::TronGridClient, notify::Notifier};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let chain = Arc::new(TronGridClient::new(
///     &config.payments.tron_api_base,
///     config.payments.tron_api_key.clone(),
/// )?);
/// let notifier = Arc::new(Notifier::new(
///     config.telegram.bot_token.clone(),
///     config.telegram.admin_chat_id.clone(),
/// )?);
/// let state = AppState::new(pool, config, chain, notifier);
/// let app = bitsleuth_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use bitsleuth_shared::{
    auth::{jwt, middleware::AuthContext},
    chain::ChainClient,
    notify::Notifier,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor. All heavyweight
/// members are behind Arc so the clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Blockchain gateway for transaction and balance lookups
    pub chain: Arc<dyn ChainClient>,

    /// Telegram notification sink
    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        db: PgPool,
        config: Config,
        chain: Arc<dyn ChainClient>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            chain,
            notifier,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Liveness check (public)
/// └── /api/
///     ├── GET  /                    # API banner (public)
///     ├── /auth/
///     │   ├── POST /register        # (public)
///     │   ├── POST /login           # (public)
///     │   ├── POST /verify-email    # (public)
///     │   └── GET  /me              # (authenticated)
///     ├── /invoices/
///     │   ├── POST /create          # (authenticated)
///     │   └── GET  /:id             # (authenticated, owner-scoped)
///     ├── POST /payments/manual     # (authenticated)
///     ├── POST /webhook/tron-payment # (public, acknowledgment only)
///     ├── POST /scan/check-address  # (authenticated)
///     └── /admin/                   # (authenticated + admin check)
///         ├── GET /stats
///         ├── GET /payments
///         ├── GET /users
///         └── GET /audit-log
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/verify-email", post(routes::auth::verify_email))
        .route("/webhook/tron-payment", post(routes::payments::tron_webhook));

    // Authenticated routes (require a valid JWT)
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/invoices/create", post(routes::invoices::create_invoice))
        .route("/invoices/:id", get(routes::invoices::get_invoice))
        .route("/payments/manual", post(routes::payments::submit_manual))
        .route("/scan/check-address", post(routes::scan::check_address))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin routes (authenticated; handlers verify the admin flag)
    let admin_routes = Router::new()
        .route("/stats", get(routes::admin::stats))
        .route("/payments", get(routes::admin::payments))
        .route("/users", get(routes::admin::users))
        .route("/audit-log", get(routes::admin::audit_log))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest("/admin", admin_routes);

    // CORS: permissive in development, origin-listed in production
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_claims(claims);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
