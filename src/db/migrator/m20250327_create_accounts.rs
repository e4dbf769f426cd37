use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap admin credential. Operators are expected to rotate it after
/// first login.
const DEFAULT_ADMIN_PASSWORD: &str = "Admin123*";

/// Hash the bootstrap password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed a bootstrap admin so the verification fan-out has a recipient
        // and the instance can be administered at all.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Accounts)
            .columns([
                crate::entities::accounts::Column::ExternalId,
                crate::entities::accounts::Column::FirstName,
                crate::entities::accounts::Column::Surname,
                crate::entities::accounts::Column::Email,
                crate::entities::accounts::Column::PasswordHash,
                crate::entities::accounts::Column::Role,
                crate::entities::accounts::Column::Enabled,
                crate::entities::accounts::Column::EmailVerified,
                crate::entities::accounts::Column::IsFirstLogin,
                crate::entities::accounts::Column::CreatedAt,
                crate::entities::accounts::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                "Admin".into(),
                "User".into(),
                "admin@example.com".into(),
                password_hash.into(),
                1.into(),
                true.into(),
                true.into(),
                false.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
