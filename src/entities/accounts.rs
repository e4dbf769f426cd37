use sea_orm::entity::prelude::*;

use crate::models::account::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Externally assigned personnel identifier.
    #[sea_orm(unique)]
    pub external_id: String,

    pub first_name: String,

    pub surname: String,

    /// Always normalized (trimmed, lower-cased) before writing.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: Role,

    pub enabled: bool,

    pub email_verified: bool,

    /// Forces the reset flow before a session token can be issued.
    pub is_first_login: bool,

    /// Present only while the account awaits admin review.
    pub verification_token: Option<String>,

    pub verification_token_expires_at: Option<String>,

    /// Present only between reset issuance and use.
    pub reset_token: Option<String>,

    pub reset_token_expires_at: Option<String>,

    /// Federated provider subject id.
    pub google_id: Option<String>,

    pub profile_image_path: Option<String>,

    pub profile_image_file_name: Option<String>,

    pub profile_image_content_type: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
