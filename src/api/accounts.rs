use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_account_id;
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AccountDto, MessageResponse};
use crate::models::account::Role;
use crate::services::account_service::AccountUpdate;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state.accounts.list_accounts().await?;

    Ok(Json(ApiResponse::success(
        accounts.iter().map(AccountDto::from_account).collect(),
    )))
}

/// GET /accounts/pending
/// Admin review queue, verification tokens included.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state.accounts.list_pending_verifications().await?;

    Ok(Json(ApiResponse::success(
        accounts
            .iter()
            .map(AccountDto::from_pending_account)
            .collect(),
    )))
}

/// GET /accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;
    let account = state.accounts.get_account(id).await?;

    Ok(Json(ApiResponse::success(AccountDto::from_account(
        &account,
    ))))
}

/// PUT /accounts/{id}
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;

    let account = state
        .accounts
        .update_account(
            id,
            AccountUpdate {
                external_id: payload.external_id,
                first_name: payload.first_name,
                surname: payload.surname,
                email: payload.email,
                role: payload.role,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(AccountDto::from_account(
        &account,
    ))))
}

/// DELETE /accounts/{id}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_account_id(id)?;
    state.accounts.delete_account(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Account deleted".to_string(),
    })))
}
