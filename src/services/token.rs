//! Opaque single-use tokens and signed session tokens.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::tokens::SESSION_TTL_DAYS;
use crate::models::account::Account;

/// Cryptographically random 32-character hex token, bound to one account and
/// one purpose by the caller.
#[must_use]
pub fn generate_opaque_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Claims carried by a session token. Verification needs no storage lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: String,
    pub email: String,
    /// Role name as produced by `Role::as_str`
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed session token for an authenticated account.
pub fn issue_session_token(account: &Account, secret: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let expiration = now + SESSION_TTL_DAYS * 24 * 60 * 60;

    let claims = SessionClaims {
        sub: account.id.to_string(),
        email: account.email.clone(),
        role: account.role.to_string(),
        iat: now,
        exp: expiration,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to sign session token")
}

/// Decode and verify a session token. Fails on bad signatures, altered
/// payloads, and expired tokens.
pub fn decode_session_token(token: &str, secret: &str) -> Result<SessionClaims> {
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .context("Session token rejected")?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Role;

    const SECRET: &str = "test-secret-key-minimum-32-characters-long";

    fn test_account() -> Account {
        Account {
            id: 7,
            external_id: "u7".to_string(),
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Manager,
            enabled: true,
            email_verified: true,
            is_first_login: false,
            verification_token: None,
            reset_token: None,
            google_id: None,
            profile_image: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn opaque_tokens_are_unique_fixed_length_hex() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();

        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_claims_round_trip() {
        let token = issue_session_token(&test_account(), SECRET).unwrap();
        let claims = decode_session_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, "Manager");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn altered_token_is_rejected() {
        let token = issue_session_token(&test_account(), SECRET).unwrap();

        // Flip one character of the signed payload
        let mut bytes = token.into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(decode_session_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_session_token(&test_account(), SECRET).unwrap();
        assert!(decode_session_token(&token, "another-secret-also-32-characters!!").is_err());
    }
}
