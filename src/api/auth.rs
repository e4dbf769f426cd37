use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_account_id, validate_new_password, validate_token_value};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AccountDto, AuthResponse, MessageResponse};
use crate::models::account::Role;
use crate::services::account_service::{AccountDraft, AuthOutcome};
use crate::services::token::{SessionClaims, decode_session_token};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub external_id: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct CompletePasswordResetRequest {
    pub user_id: i32,
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct VerifyAccountRequest {
    pub user_id: i32,
    pub token: String,
    pub approve: bool,
}

// ============================================================================
// Middleware
// ============================================================================

/// Validates the `Authorization: Bearer` session token and requires the
/// Admin role claim. Decoded claims are stored in request extensions.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::unauthorized("Missing session token"));
    };

    let claims = decode_session_token(&token, &state.config.auth.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired session token"))?;

    if Role::from_name(&claims.role) != Some(Role::Admin) {
        return Err(ApiError::unauthorized("Administrator role required"));
    }

    tracing::Span::current().record("user_id", claims.sub.as_str());
    request.extensions_mut().insert::<SessionClaims>(claims);

    Ok(next.run(request).await.into_response())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

fn auth_response(outcome: AuthOutcome) -> AuthResponse {
    AuthResponse {
        account: AccountDto::from_account(&outcome.account),
        token: outcome.session_token,
        password_change_required: outcome.password_change_required,
        password_reset_token: outcome.reset_token.map(|t| t.value),
    }
}

/// POST /auth/register
/// Self-service registration. The account stays disabled until an admin
/// approves it through the emailed verification link.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let account = state
        .accounts
        .register(AccountDraft {
            external_id: payload.external_id,
            first_name: payload.first_name,
            surname: payload.surname,
            email: payload.email,
            role: payload.role,
        })
        .await?;

    Ok(Json(ApiResponse::success(AccountDto::from_account(
        &account,
    ))))
}

/// POST /auth/login
/// Credential login. First-login accounts get a reset token instead of a
/// session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let outcome = state
        .accounts
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(auth_response(outcome))))
}

/// POST /auth/google
/// Federated login with just-in-time provisioning.
pub async fn login_with_google(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.id_token.is_empty() {
        return Err(ApiError::validation("ID token is required"));
    }

    let outcome = state
        .accounts
        .authenticate_with_google(&payload.id_token)
        .await?;

    Ok(Json(ApiResponse::success(auth_response(outcome))))
}

/// POST /auth/password-reset/request
/// Always answers the same way; only a known address gets a token and email.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    state.accounts.request_password_reset(&payload.email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "If the account exists, a reset email has been sent".to_string(),
    })))
}

/// POST /auth/password-reset/complete
pub async fn complete_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CompletePasswordResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_account_id(payload.user_id)?;
    let token = validate_token_value(&payload.token)?;
    validate_new_password(&payload.new_password)?;

    let completed = state
        .accounts
        .complete_password_reset(payload.user_id, token, &payload.new_password)
        .await?;

    if !completed {
        return Err(ApiError::validation("Invalid or expired reset token"));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// POST /auth/verify
/// Admin approval gate, reached through the emailed link. One failure shape
/// for every failure reason.
pub async fn verify_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyAccountRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_account_id(payload.user_id)?;
    let token = validate_token_value(&payload.token)?;

    let handled = state
        .accounts
        .verify_account(payload.user_id, token, payload.approve)
        .await?;

    if !handled {
        return Err(ApiError::validation("Invalid or expired verification token"));
    }

    let message = if payload.approve {
        "Account approved"
    } else {
        "Account rejected"
    };

    Ok(Json(ApiResponse::success(MessageResponse {
        message: message.to_string(),
    })))
}
