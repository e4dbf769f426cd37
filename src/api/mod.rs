use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::google::GoogleTokenClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, EmailService, IdentityVerifier, LogEmailService, SeaOrmAccountService,
    SmtpEmailService,
};

pub mod accounts;
pub mod auth;
mod error;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub accounts: Arc<dyn AccountService>,

    pub start_time: std::time::Instant,
}

/// Wires the production collaborators: SQLite store, SMTP (or log-only)
/// email, Google tokeninfo identity validation.
pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let email: Arc<dyn EmailService> = if config.email.enabled {
        Arc::new(
            SmtpEmailService::new(&config.email)
                .map_err(|e| anyhow::anyhow!("Failed to build SMTP transport: {e}"))?,
        )
    } else {
        Arc::new(LogEmailService)
    };

    let identity: Arc<dyn IdentityVerifier> = Arc::new(GoogleTokenClient::new());

    create_app_state_with_collaborators(config, store, email, identity)
}

/// Assembly seam used by tests to substitute recording collaborators.
pub fn create_app_state_with_collaborators(
    config: Config,
    store: Store,
    email: Arc<dyn EmailService>,
    identity: Arc<dyn IdentityVerifier>,
) -> anyhow::Result<Arc<AppState>> {
    let accounts = Arc::new(SeaOrmAccountService::new(
        store.clone(),
        email,
        identity,
        &config,
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        accounts,
        start_time: std::time::Instant::now(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let admin_routes = Router::new()
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/pending", get(accounts::list_pending))
        .route("/accounts/{id}", get(accounts::get_account))
        .route("/accounts/{id}", put(accounts::update_account))
        .route("/accounts/{id}", delete(accounts::delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let api_router = Router::new()
        .merge(admin_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::login_with_google))
        .route(
            "/auth/password-reset/request",
            post(auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/complete",
            post(auth::complete_password_reset),
        )
        .route("/auth/verify", post(auth::verify_account));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
}

async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database unreachable: {e}")))?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}
