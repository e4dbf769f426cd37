//! External identity-provider validation collaborator.

use thiserror::Error;

/// Claims asserted by the provider for a validated ID token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    /// Provider-scoped stable subject identifier.
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token itself was rejected (bad signature, wrong audience,
    /// expired, unverified email).
    #[error("Identity token rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered unexpectedly.
    #[error("Identity provider error: {0}")]
    Provider(String),
}

#[async_trait::async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validates an ID token and checks it was minted for `expected_audience`.
    async fn validate(
        &self,
        id_token: &str,
        expected_audience: &str,
    ) -> Result<VerifiedIdentity, IdentityError>;
}
