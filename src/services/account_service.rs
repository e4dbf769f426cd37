//! Domain service for the account lifecycle and authentication core.
//!
//! Covers admin-gated registration, the verification gate, the password
//! reset flow, credential authentication with forced first-login reset, and
//! federated (Google) login with just-in-time provisioning.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::constants::limits;
use crate::models::account::{Account, Role, Token};

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Account not found")]
    NotFound,

    /// Reasons stay distinct internally; the HTTP layer presents one
    /// generic message.
    #[error("Authentication failed: {0}")]
    Authentication(&'static str),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration input. No password: a throwaway credential is generated and
/// discarded, and the account stays unusable until the reset flow sets a
/// real one.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub external_id: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub role: Role,
}

/// Partial account update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// Result of an authentication attempt that passed credential checks.
///
/// Either `session_token` is set (normal login) or `password_change_required`
/// is true and `reset_token` carries the token the caller must feed into the
/// reset flow; never both.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub account: Account,
    pub session_token: Option<String>,
    pub password_change_required: bool,
    pub reset_token: Option<Token>,
}

/// Domain service trait for the account core.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a pending account and notifies administrators.
    ///
    /// # Errors
    ///
    /// [`AccountError::Validation`] on malformed input,
    /// [`AccountError::Conflict`] on duplicate email or external id.
    async fn register(&self, draft: AccountDraft) -> Result<Account, AccountError>;

    /// Admin approval gate. `Ok(true)` on a consumed token; `Ok(false)` on
    /// any mismatch, expiry, or missing account without distinguishing which.
    async fn verify_account(
        &self,
        account_id: i32,
        token: &str,
        approve: bool,
    ) -> Result<bool, AccountError>;

    /// Issues a reset token and email for a known address; does nothing for
    /// an unknown one. The caller cannot tell the two apart.
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    /// Consumes a reset token and installs the new password. `Ok(false)`
    /// without mutation on mismatch/expiry/missing account.
    async fn complete_password_reset(
        &self,
        account_id: i32,
        token: &str,
        new_password: &str,
    ) -> Result<bool, AccountError>;

    /// Credential login. First-login accounts get a reset token instead of a
    /// session token.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome, AccountError>;

    /// Federated login with just-in-time provisioning. Always yields a
    /// session token; the provider's email trust replaces the local gate.
    async fn authenticate_with_google(&self, id_token: &str)
    -> Result<AuthOutcome, AccountError>;

    async fn get_account(&self, id: i32) -> Result<Account, AccountError>;

    async fn get_account_by_email(&self, email: &str) -> Result<Account, AccountError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    async fn list_accounts_by_role(&self, role: Role) -> Result<Vec<Account>, AccountError>;

    /// Accounts awaiting admin review, verification tokens included.
    async fn list_pending_verifications(&self) -> Result<Vec<Account>, AccountError>;

    async fn update_account(
        &self,
        id: i32,
        update: AccountUpdate,
    ) -> Result<Account, AccountError>;

    async fn delete_account(&self, id: i32) -> Result<(), AccountError>;
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub(crate) fn validate_email(email: &str) -> Result<(), AccountError> {
    if email.is_empty() {
        return Err(AccountError::Validation("Email is required".to_string()));
    }
    if email.len() > limits::EMAIL_MAX_LEN {
        return Err(AccountError::Validation(format!(
            "Email cannot exceed {} characters",
            limits::EMAIL_MAX_LEN
        )));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AccountError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_external_id(external_id: &str) -> Result<(), AccountError> {
    if external_id.is_empty() {
        return Err(AccountError::Validation("User ID is required".to_string()));
    }
    if external_id.len() > limits::EXTERNAL_ID_MAX_LEN {
        return Err(AccountError::Validation(format!(
            "User ID cannot exceed {} characters",
            limits::EXTERNAL_ID_MAX_LEN
        )));
    }
    Ok(())
}

pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), AccountError> {
    if value.is_empty() {
        return Err(AccountError::Validation(format!("{field} is required")));
    }
    if value.len() > limits::NAME_MAX_LEN {
        return Err(AccountError::Validation(format!(
            "{field} cannot exceed {} characters",
            limits::NAME_MAX_LEN
        )));
    }
    Ok(())
}
