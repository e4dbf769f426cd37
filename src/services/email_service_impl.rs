//! SMTP implementation of the `EmailService` trait, plus a log-only variant
//! for deployments without an SMTP relay.

use lettre::message::{Mailbox, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::services::email_service::{EmailError, EmailService};

pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .map_err(|e| EmailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };

        let mut builder = builder.port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let sender = format!("{} <{}>", config.sender_name, config.sender_email)
            .parse()
            .map_err(|e| EmailError::Message(format!("Invalid sender address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    async fn send(&self, recipient: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let to = recipient
            .parse()
            .map_err(|e| EmailError::Message(format!("Invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| EmailError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl EmailService for SmtpEmailService {
    async fn send_verification_email(
        &self,
        recipient: &str,
        user_name: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        let subject = "Spesa: New Account Verification";
        let body = format!(
            "<html>\
                <body>\
                    <h2>New Account Requires Verification</h2>\
                    <p>A new account has been created for {user_name} and requires your approval.</p>\
                    <p>Click the link below to verify this account:</p>\
                    <a href='{verification_link}'>Verify Account</a>\
                    <p>This link will expire in 48 hours.</p>\
                </body>\
            </html>"
        );

        self.send(recipient, subject, body).await
    }

    async fn send_password_reset_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError> {
        let subject = "Spesa: Password Reset";
        let body = format!(
            "<html>\
                <body>\
                    <h2>Password Reset Request</h2>\
                    <p>Hello {user_name},</p>\
                    <p>You recently requested to reset your password. Click the link below to set a new password:</p>\
                    <a href='{reset_link}'>Reset Your Password</a>\
                    <p>This link will expire in 24 hours.</p>\
                    <p>If you did not request this, please ignore this email.</p>\
                </body>\
            </html>"
        );

        self.send(recipient, subject, body).await
    }

    async fn send_account_approved_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError> {
        let subject = "Spesa: Account Approved";
        let body = format!(
            "<html>\
                <body>\
                    <h2>Your Account Has Been Approved</h2>\
                    <p>Hello {user_name},</p>\
                    <p>Your account has been approved by an administrator. You can now set your password and access the system.</p>\
                    <a href='{reset_link}'>Set Your Password</a>\
                    <p>Note: You will need to set a new password when you first log in.</p>\
                </body>\
            </html>"
        );

        self.send(recipient, subject, body).await
    }
}

/// Logs instead of sending. Intended for development instances where the
/// operator reads the action links from the log.
pub struct LogEmailService;

#[async_trait::async_trait]
impl EmailService for LogEmailService {
    async fn send_verification_email(
        &self,
        recipient: &str,
        user_name: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        info!("[email disabled] verification for {user_name} -> {recipient}: {verification_link}");
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError> {
        info!("[email disabled] password reset for {user_name} -> {recipient}: {reset_link}");
        Ok(())
    }

    async fn send_account_approved_email(
        &self,
        recipient: &str,
        user_name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError> {
        info!("[email disabled] account approved for {user_name} -> {recipient}: {reset_link}");
        Ok(())
    }
}
