//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::config::{Config, SecurityConfig};
use crate::constants::{limits, tokens};
use crate::db::{NewAccount, Store};
use crate::models::account::{Account, Role, Token, normalize_email};
use crate::services::account_service::{
    AccountDraft, AccountError, AccountService, AccountUpdate, AuthOutcome, validate_email,
    validate_external_id, validate_name,
};
use crate::services::email_service::EmailService;
use crate::services::identity::{IdentityError, IdentityVerifier};
use crate::services::{password, token};

pub struct SeaOrmAccountService {
    store: Store,
    email: Arc<dyn EmailService>,
    identity: Arc<dyn IdentityVerifier>,
    jwt_secret: String,
    google_client_id: String,
    base_url: String,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        email: Arc<dyn EmailService>,
        identity: Arc<dyn IdentityVerifier>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            email,
            identity,
            jwt_secret: config.auth.jwt_secret.clone(),
            google_client_id: config.auth.google_client_id.clone(),
            base_url: config.email.base_url.trim_end_matches('/').to_string(),
            security: config.security.clone(),
        }
    }

    fn verification_link(&self, account_id: i32, token_value: &str) -> String {
        format!(
            "{}/verify-user?token={}&userId={}",
            self.base_url, token_value, account_id
        )
    }

    fn reset_link(&self, account_id: i32, token_value: &str) -> String {
        format!(
            "{}/reset-password?token={}&userId={}",
            self.base_url, token_value, account_id
        )
    }

    /// Fan-out to every admin account. A failed recipient is logged and
    /// skipped; registration itself already succeeded.
    async fn notify_admins(&self, new_account: &Account) -> Result<(), AccountError> {
        let Some(verification) = &new_account.verification_token else {
            return Ok(());
        };

        let admins = self.store.list_accounts_by_role(Role::Admin).await?;
        let link = self.verification_link(new_account.id, &verification.value);

        for admin in admins {
            if let Err(e) = self
                .email
                .send_verification_email(&admin.email, &new_account.full_name(), &link)
                .await
            {
                warn!(
                    "Failed to notify {} about account {}: {e}",
                    admin.email, new_account.id
                );
            }
        }

        Ok(())
    }
}

/// Unique-index violations surface as conflicts; the check-then-insert
/// window is otherwise open to races.
fn map_insert_error(err: anyhow::Error) -> AccountError {
    if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>()
        && matches!(
            db_err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        )
    {
        return AccountError::Conflict("Email or user ID already registered".to_string());
    }
    AccountError::Internal(err.to_string())
}

#[async_trait::async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, draft: AccountDraft) -> Result<Account, AccountError> {
        let email = normalize_email(&draft.email);

        validate_external_id(&draft.external_id)?;
        validate_name("Name", &draft.first_name)?;
        validate_name("Surname", &draft.surname)?;
        validate_email(&email)?;

        if self.store.get_account_by_email(&email).await?.is_some() {
            return Err(AccountError::Conflict("Email already registered".to_string()));
        }
        if self
            .store
            .get_account_by_external_id(&draft.external_id)
            .await?
            .is_some()
        {
            return Err(AccountError::Conflict("User ID already exists".to_string()));
        }

        // The plaintext is dropped right here; the account stays unusable
        // until the reset flow stores a real password.
        let temp_password = password::generate_temp_password();
        let password_hash = password::hash(temp_password, self.security.clone()).await?;

        let verification_token = Token::new(
            token::generate_opaque_token(),
            Duration::hours(tokens::VERIFICATION_TTL_HOURS),
        );

        let account = self
            .store
            .add_account(NewAccount {
                external_id: draft.external_id,
                first_name: draft.first_name,
                surname: draft.surname,
                email,
                password_hash,
                role: draft.role,
                enabled: false,
                email_verified: false,
                is_first_login: true,
                verification_token: Some(verification_token),
                google_id: None,
            })
            .await
            .map_err(map_insert_error)?;

        info!("Registered account {} pending verification", account.id);

        self.notify_admins(&account).await?;

        Ok(account)
    }

    async fn verify_account(
        &self,
        account_id: i32,
        token_value: &str,
        approve: bool,
    ) -> Result<bool, AccountError> {
        // All failure modes collapse to `false`: no oracle for which
        // condition failed.
        let Some(account) = self.store.get_account(account_id).await? else {
            return Ok(false);
        };
        let Some(stored) = &account.verification_token else {
            return Ok(false);
        };
        if stored.value != token_value || stored.is_expired() {
            return Ok(false);
        }

        if approve {
            let reset_token = Token::new(
                token::generate_opaque_token(),
                Duration::days(tokens::APPROVAL_RESET_TTL_DAYS),
            );

            let consumed = self
                .store
                .approve_account_if_token_matches(account_id, token_value, &reset_token)
                .await?;
            if !consumed {
                // A concurrent call got there first.
                return Ok(false);
            }

            info!("Account {} approved", account_id);

            let link = self.reset_link(account_id, &reset_token.value);
            if let Err(e) = self
                .email
                .send_account_approved_email(&account.email, &account.first_name, &link)
                .await
            {
                // Approval is already committed; the reset link can still be
                // re-issued through the reset-request flow.
                warn!("Failed to send approval email for account {account_id}: {e}");
            }

            Ok(true)
        } else {
            let deleted = self
                .store
                .delete_account_if_verification_token_matches(account_id, token_value)
                .await?;
            if deleted {
                info!("Account {} rejected and removed", account_id);
            }
            Ok(deleted)
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = normalize_email(email);

        // Unknown addresses take the same return path as known ones.
        let Some(account) = self.store.get_account_by_email(&email).await? else {
            return Ok(());
        };

        let reset_token = Token::new(
            token::generate_opaque_token(),
            Duration::hours(tokens::RESET_TTL_HOURS),
        );
        self.store
            .set_account_reset_token(account.id, &reset_token)
            .await?;

        let link = self.reset_link(account.id, &reset_token.value);
        if let Err(e) = self
            .email
            .send_password_reset_email(&account.email, &account.first_name, &link)
            .await
        {
            warn!("Failed to send reset email for account {}: {e}", account.id);
        }

        Ok(())
    }

    async fn complete_password_reset(
        &self,
        account_id: i32,
        token_value: &str,
        new_password: &str,
    ) -> Result<bool, AccountError> {
        let Some(account) = self.store.get_account(account_id).await? else {
            return Ok(false);
        };
        let Some(stored) = &account.reset_token else {
            return Ok(false);
        };
        if stored.value != token_value || stored.is_expired() {
            return Ok(false);
        }

        let password_hash = password::hash(new_password.to_string(), self.security.clone()).await?;

        let consumed = self
            .store
            .complete_reset_if_token_matches(account_id, token_value, &password_hash)
            .await?;

        if consumed {
            info!("Password reset completed for account {account_id}");
        }

        Ok(consumed)
    }

    async fn authenticate(&self, email: &str, password_input: &str) -> Result<AuthOutcome, AccountError> {
        let email = normalize_email(email);

        let Some(account) = self.store.get_account_by_email(&email).await? else {
            return Err(AccountError::Authentication("unknown email"));
        };

        let valid = password::verify(
            password_input.trim().to_string(),
            account.password_hash.clone(),
        )
        .await?;
        if !valid {
            return Err(AccountError::Authentication("invalid password"));
        }

        if !account.enabled {
            return Err(AccountError::Authentication("account not activated"));
        }

        if account.is_first_login {
            // No session yet: the caller must complete the reset flow first.
            let reset_token = Token::new(
                token::generate_opaque_token(),
                Duration::hours(tokens::RESET_TTL_HOURS),
            );
            self.store
                .set_account_reset_token(account.id, &reset_token)
                .await?;

            return Ok(AuthOutcome {
                account,
                session_token: None,
                password_change_required: true,
                reset_token: Some(reset_token),
            });
        }

        let session_token = token::issue_session_token(&account, &self.jwt_secret)?;

        Ok(AuthOutcome {
            account,
            session_token: Some(session_token),
            password_change_required: false,
            reset_token: None,
        })
    }

    async fn authenticate_with_google(
        &self,
        id_token: &str,
    ) -> Result<AuthOutcome, AccountError> {
        if self.google_client_id.is_empty() {
            return Err(AccountError::Authentication(
                "federated login is not configured",
            ));
        }

        let identity = self
            .identity
            .validate(id_token, &self.google_client_id)
            .await
            .map_err(|e| match e {
                IdentityError::Rejected(reason) => {
                    info!("Google token rejected: {reason}");
                    AccountError::Authentication("identity token rejected")
                }
                IdentityError::Provider(msg) => AccountError::ExternalService(msg),
            })?;

        let email = normalize_email(&identity.email);

        let account = match self.store.get_account_by_email(&email).await? {
            Some(mut account) => {
                if account.google_id.is_none() {
                    self.store
                        .set_account_google_id(account.id, &identity.subject)
                        .await?;
                    account.google_id = Some(identity.subject.clone());
                }
                account
            }
            None => {
                // The provider already vouched for the email, so the account
                // skips the verification gate and the first-login reset.
                let temp_password = password::generate_temp_password();
                let password_hash = password::hash(temp_password, self.security.clone()).await?;

                let mut external_id = identity.subject.clone();
                external_id.truncate(limits::EXTERNAL_ID_MAX_LEN);

                let account = self
                    .store
                    .add_account(NewAccount {
                        external_id,
                        first_name: identity.given_name.clone(),
                        surname: identity.family_name.clone(),
                        email,
                        password_hash,
                        role: Role::User,
                        enabled: true,
                        email_verified: true,
                        is_first_login: false,
                        verification_token: None,
                        google_id: Some(identity.subject.clone()),
                    })
                    .await
                    .map_err(map_insert_error)?;

                info!("Provisioned account {} from Google identity", account.id);
                account
            }
        };

        let session_token = token::issue_session_token(&account, &self.jwt_secret)?;

        Ok(AuthOutcome {
            account,
            session_token: Some(session_token),
            password_change_required: false,
            reset_token: None,
        })
    }

    async fn get_account(&self, id: i32) -> Result<Account, AccountError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Account, AccountError> {
        let email = normalize_email(email);
        self.store
            .get_account_by_email(&email)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts().await?)
    }

    async fn list_accounts_by_role(&self, role: Role) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts_by_role(role).await?)
    }

    async fn list_pending_verifications(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_pending_verification().await?)
    }

    async fn update_account(
        &self,
        id: i32,
        update: AccountUpdate,
    ) -> Result<Account, AccountError> {
        let mut account = self
            .store
            .get_account(id)
            .await?
            .ok_or(AccountError::NotFound)?;

        if let Some(email) = update.email {
            let normalized = normalize_email(&email);
            if normalized != account.email {
                validate_email(&normalized)?;
                if self.store.get_account_by_email(&normalized).await?.is_some() {
                    return Err(AccountError::Conflict(
                        "Email already registered".to_string(),
                    ));
                }
                account.email = normalized;
            }
        }

        if let Some(external_id) = update.external_id {
            if external_id != account.external_id {
                validate_external_id(&external_id)?;
                if self
                    .store
                    .get_account_by_external_id(&external_id)
                    .await?
                    .is_some()
                {
                    return Err(AccountError::Conflict("User ID already exists".to_string()));
                }
                account.external_id = external_id;
            }
        }

        if let Some(first_name) = update.first_name {
            validate_name("Name", &first_name)?;
            account.first_name = first_name;
        }

        if let Some(surname) = update.surname {
            validate_name("Surname", &surname)?;
            account.surname = surname;
        }

        if let Some(role) = update.role {
            account.role = role;
        }

        if let Some(new_password) = update.password
            && !new_password.is_empty()
        {
            account.password_hash =
                password::hash(new_password, self.security.clone()).await?;
        }

        self.store.update_account(&account).await?;

        Ok(account)
    }

    async fn delete_account(&self, id: i32) -> Result<(), AccountError> {
        if !self.store.delete_account(id).await? {
            return Err(AccountError::NotFound);
        }

        info!("Account {id} deleted");
        Ok(())
    }
}
