use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::NewAccount;

use crate::models::account::{Account, Role, Token};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, normalized_email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(normalized_email).await
    }

    pub async fn get_account_by_external_id(&self, external_id: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_external_id(external_id).await
    }

    pub async fn get_account_by_google_id(&self, google_id: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_google_id(google_id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list_all().await
    }

    pub async fn list_accounts_by_role(&self, role: Role) -> Result<Vec<Account>> {
        self.account_repo().list_by_role(role).await
    }

    pub async fn list_pending_verification(&self) -> Result<Vec<Account>> {
        self.account_repo().list_pending_verification().await
    }

    pub async fn add_account(&self, new: NewAccount) -> Result<Account> {
        self.account_repo().insert(new).await
    }

    pub async fn update_account(&self, account: &Account) -> Result<()> {
        self.account_repo().update(account).await
    }

    pub async fn delete_account(&self, id: i32) -> Result<bool> {
        self.account_repo().delete(id).await
    }

    pub async fn delete_account_if_verification_token_matches(
        &self,
        id: i32,
        token_value: &str,
    ) -> Result<bool> {
        self.account_repo()
            .delete_if_verification_token_matches(id, token_value)
            .await
    }

    pub async fn set_account_reset_token(&self, id: i32, token: &Token) -> Result<()> {
        self.account_repo().set_reset_token(id, token).await
    }

    pub async fn approve_account_if_token_matches(
        &self,
        id: i32,
        token_value: &str,
        reset_token: &Token,
    ) -> Result<bool> {
        self.account_repo()
            .approve_if_token_matches(id, token_value, reset_token)
            .await
    }

    pub async fn complete_reset_if_token_matches(
        &self,
        id: i32,
        token_value: &str,
        password_hash: &str,
    ) -> Result<bool> {
        self.account_repo()
            .complete_reset_if_token_matches(id, token_value, password_hash)
            .await
    }

    pub async fn set_account_google_id(&self, id: i32, google_id: &str) -> Result<()> {
        self.account_repo().set_google_id(id, google_id).await
    }
}
