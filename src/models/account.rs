use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed role set. Integer values are part of the stored format; unknown
/// values are rejected when decoding rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Role {
    #[sea_orm(num_value = 1)]
    Admin,
    #[sea_orm(num_value = 2)]
    User,
    #[sea_orm(num_value = 3)]
    Manager,
    #[sea_orm(num_value = 4)]
    Associer,
    #[sea_orm(num_value = 5)]
    Employe,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
            Self::Manager => "Manager",
            Self::Associer => "Associer",
            Self::Employe => "Employe",
        }
    }

    /// Parses a role name as it appears in session-token claims.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Admin" => Some(Self::Admin),
            "User" => Some(Self::User),
            "Manager" => Some(Self::Manager),
            "Associer" => Some(Self::Associer),
            "Employe" => Some(Self::Employe),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-use opaque token bound to one account and one purpose.
/// Cleared by setting the whole pair to `None`, never an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,

    /// RFC 3339 timestamp.
    pub expires_at: String,
}

impl Token {
    #[must_use]
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: (Utc::now() + ttl).to_rfc3339(),
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Expiry is checked lazily at point of use. An unparseable timestamp
    /// counts as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_none_or(|t| t < Utc::now())
    }
}

/// Profile image metadata. Storage and serving of the bytes belong to the
/// file-storage collaborator; the account record only carries the pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub path: String,
    pub file_name: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
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
    pub reset_token: Option<Token>,
    pub google_id: Option<String>,
    pub profile_image: Option<ProfileImage>,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Canonical email form used for every write and lookup.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("a@x.com"), "a@x.com");
    }

    #[test]
    fn role_names_round_trip() {
        for role in [
            Role::Admin,
            Role::User,
            Role::Manager,
            Role::Associer,
            Role::Employe,
        ] {
            assert_eq!(Role::from_name(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_name("Superuser"), None);
    }

    #[test]
    fn token_expiry_is_lazy() {
        let live = Token::new("t".to_string(), chrono::Duration::hours(1));
        assert!(!live.is_expired());

        let expired = Token {
            value: "t".to_string(),
            expires_at: (Utc::now() - chrono::Duration::seconds(1)).to_rfc3339(),
        };
        assert!(expired.is_expired());

        let garbage = Token {
            value: "t".to_string(),
            expires_at: "not-a-date".to_string(),
        };
        assert!(garbage.is_expired());
    }
}
