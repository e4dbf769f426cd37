use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::accounts;
use crate::models::account::{Account, ProfileImage, Role, Token};

/// Insertion payload for a new account row. The caller is responsible for
/// normalizing the email and hashing the password beforehand.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub external_id: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub email_verified: bool,
    pub is_first_login: bool,
    pub verification_token: Option<Token>,
    pub google_id: Option<String>,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        let verification_token = match (
            model.verification_token,
            model.verification_token_expires_at,
        ) {
            (Some(value), Some(expires_at)) => Some(Token { value, expires_at }),
            _ => None,
        };

        let reset_token = match (model.reset_token, model.reset_token_expires_at) {
            (Some(value), Some(expires_at)) => Some(Token { value, expires_at }),
            _ => None,
        };

        let profile_image = match (model.profile_image_path, model.profile_image_file_name) {
            (Some(path), Some(file_name)) => Some(ProfileImage {
                path,
                file_name,
                content_type: model.profile_image_content_type,
            }),
            _ => None,
        };

        Self {
            id: model.id,
            external_id: model.external_id,
            first_name: model.first_name,
            surname: model.surname,
            email: model.email,
            password_hash: model.password_hash,
            role: model.role,
            enabled: model.enabled,
            email_verified: model.email_verified,
            is_first_login: model.is_first_login,
            verification_token,
            reset_token,
            google_id: model.google_id,
            profile_image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by id")?;

        Ok(account.map(Account::from))
    }

    /// Lookup by normalized email. Rows are written normalized, so an exact
    /// match here is a case-insensitive match overall.
    pub async fn get_by_email(&self, normalized_email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(normalized_email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await
            .context("Failed to query account by external id")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_google_id(&self, google_id: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::GoogleId.eq(google_id))
            .one(&self.conn)
            .await
            .context("Failed to query account by google id")?;

        Ok(account.map(Account::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Account>> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::Role.eq(role))
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts by role")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Accounts awaiting admin review: unverified and still holding a
    /// verification token.
    pub async fn list_pending_verification(&self) -> Result<Vec<Account>> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::EmailVerified.eq(false))
            .filter(accounts::Column::VerificationToken.is_not_null())
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list pending verifications")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn insert(&self, new: NewAccount) -> Result<Account> {
        let now = chrono::Utc::now().to_rfc3339();

        let (token_value, token_expiry) = match new.verification_token {
            Some(token) => (Some(token.value), Some(token.expires_at)),
            None => (None, None),
        };

        let active = accounts::ActiveModel {
            external_id: Set(new.external_id),
            first_name: Set(new.first_name),
            surname: Set(new.surname),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            role: Set(new.role),
            enabled: Set(new.enabled),
            email_verified: Set(new.email_verified),
            is_first_login: Set(new.is_first_login),
            verification_token: Set(token_value),
            verification_token_expires_at: Set(token_expiry),
            google_id: Set(new.google_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Ok(Account::from(model))
    }

    /// Writes identity and profile fields. Tokens and flags are owned by the
    /// dedicated methods below and are left untouched.
    pub async fn update(&self, account: &Account) -> Result<()> {
        let existing = accounts::Entity::find_by_id(account.id)
            .one(&self.conn)
            .await
            .context("Failed to query account for update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {}", account.id))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: accounts::ActiveModel = existing.into();
        active.external_id = Set(account.external_id.clone());
        active.first_name = Set(account.first_name.clone());
        active.surname = Set(account.surname.clone());
        active.email = Set(account.email.clone());
        active.role = Set(account.role);
        active.password_hash = Set(account.password_hash.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = accounts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete account")?;

        Ok(result.rows_affected == 1)
    }

    /// Rejection half of the verification gate: the delete only lands while
    /// the token is still the stored one, so it cannot race an approval.
    pub async fn delete_if_verification_token_matches(
        &self,
        id: i32,
        token_value: &str,
    ) -> Result<bool> {
        let result = accounts::Entity::delete_many()
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::VerificationToken.eq(token_value))
            .exec(&self.conn)
            .await
            .context("Failed to reject account")?;

        Ok(result.rows_affected == 1)
    }

    /// Stores (or replaces) a password reset token.
    pub async fn set_reset_token(&self, id: i32, token: &Token) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::ResetToken,
                Expr::value(Some(token.value.clone())),
            )
            .col_expr(
                accounts::Column::ResetTokenExpiresAt,
                Expr::value(Some(token.expires_at.clone())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store reset token")?;

        if result.rows_affected == 0 {
            anyhow::bail!("Account not found: {id}");
        }

        Ok(())
    }

    /// Approval half of the verification gate as one conditional update keyed
    /// on the current token value. Two concurrent calls cannot both succeed:
    /// whichever lands second matches zero rows.
    pub async fn approve_if_token_matches(
        &self,
        id: i32,
        token_value: &str,
        reset_token: &Token,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::EmailVerified, Expr::value(true))
            .col_expr(
                accounts::Column::VerificationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                accounts::Column::VerificationTokenExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                accounts::Column::ResetToken,
                Expr::value(Some(reset_token.value.clone())),
            )
            .col_expr(
                accounts::Column::ResetTokenExpiresAt,
                Expr::value(Some(reset_token.expires_at.clone())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::VerificationToken.eq(token_value))
            .exec(&self.conn)
            .await
            .context("Failed to approve account")?;

        Ok(result.rows_affected == 1)
    }

    /// Consumes a reset token and installs the new password hash in one
    /// conditional update. Also enables the account and ends the first-login
    /// state.
    pub async fn complete_reset_if_token_matches(
        &self,
        id: i32,
        token_value: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::PasswordHash,
                Expr::value(password_hash.to_string()),
            )
            .col_expr(
                accounts::Column::ResetToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                accounts::Column::ResetTokenExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .col_expr(accounts::Column::Enabled, Expr::value(true))
            .col_expr(accounts::Column::IsFirstLogin, Expr::value(false))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::ResetToken.eq(token_value))
            .exec(&self.conn)
            .await
            .context("Failed to complete password reset")?;

        Ok(result.rows_affected == 1)
    }

    /// Attaches a federated subject id to an existing account.
    pub async fn set_google_id(&self, id: i32, google_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::GoogleId,
                Expr::value(Some(google_id.to_string())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to link google id")?;

        if result.rows_affected == 0 {
            anyhow::bail!("Account not found: {id}");
        }

        Ok(())
    }
}
