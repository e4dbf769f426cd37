use reqwest::Client;
use serde::Deserialize;

use crate::services::identity::{IdentityError, IdentityVerifier, VerifiedIdentity};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Response from the Google tokeninfo endpoint. Booleans and numbers arrive
/// as strings.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    email_verified: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

/// Validates Google ID tokens against the tokeninfo endpoint, which checks
/// signature and expiry server-side. Audience is checked here.
#[derive(Clone)]
pub struct GoogleTokenClient {
    client: Client,
    base_url: String,
}

impl Default for GoogleTokenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTokenClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: TOKENINFO_URL.to_string(),
        }
    }

    /// Points the client at a different endpoint. Used by tests.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for GoogleTokenClient {
    async fn validate(
        &self,
        id_token: &str,
        expected_audience: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        let status = response.status();

        // tokeninfo answers 4xx for malformed/expired tokens
        if status.is_client_error() {
            return Err(IdentityError::Rejected(
                "token not accepted by provider".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(IdentityError::Provider(format!(
                "tokeninfo returned {status}"
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(format!("malformed tokeninfo response: {e}")))?;

        if info.aud != expected_audience {
            return Err(IdentityError::Rejected("audience mismatch".to_string()));
        }

        if info.email_verified.as_deref() != Some("true") {
            return Err(IdentityError::Rejected(
                "provider email not verified".to_string(),
            ));
        }

        let email = info
            .email
            .ok_or_else(|| IdentityError::Rejected("token carries no email claim".to_string()))?;

        Ok(VerifiedIdentity {
            email,
            given_name: info.given_name.unwrap_or_default(),
            family_name: info.family_name.unwrap_or_default(),
            subject: info.sub,
        })
    }
}
