//! Domain service for outbound account-lifecycle notifications.

use thiserror::Error;

/// Errors specific to email delivery.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Outbound notification collaborator. Implementations own transport and
/// templating; callers provide recipient, display name, and the action link.
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    /// Asks an administrator to review a freshly registered account.
    async fn send_verification_email(
        &self,
        recipient: &str,
        user_name: &str,
        verification_link: &str,
    ) -> Result<(), EmailError>;

    /// Password reset link requested by (or on behalf of) the user.
    async fn send_password_reset_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError>;

    /// Tells the user their account was approved and must have its password
    /// set through the enclosed link.
    async fn send_account_approved_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError>;
}
