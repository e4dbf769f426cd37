use serde::Serialize;

use crate::models::account::{Account, Role};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Account representation for responses. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: i32,
    pub external_id: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    pub email_verified: bool,
    pub is_first_login: bool,
    /// Only populated on the pending-verification listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl AccountDto {
    #[must_use]
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            external_id: account.external_id.clone(),
            first_name: account.first_name.clone(),
            surname: account.surname.clone(),
            email: account.email.clone(),
            role: account.role,
            enabled: account.enabled,
            email_verified: account.email_verified,
            is_first_login: account.is_first_login,
            verification_token: None,
            created_at: account.created_at.clone(),
            updated_at: account.updated_at.clone(),
        }
    }

    /// Variant for the admin review surface, verification token included.
    #[must_use]
    pub fn from_pending_account(account: &Account) -> Self {
        let mut dto = Self::from_account(account);
        dto.verification_token = account
            .verification_token
            .as_ref()
            .map(|t| t.value.clone());
        dto
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub account: AccountDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub password_change_required: bool,
    /// Present only when a first login forced the reset flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_reset_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
