use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::claims::FlagRepr;
use crate::error::{AuthError, AuthResult};

/// Claims reported by Google's tokeninfo endpoint for an ID token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub audience: String,
    pub issuer: String,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub authorized_party: Option<String>,
    pub nonce: Option<String>,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenInfoRepr {
    aud: String,
    iss: String,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<FlagRepr>,
    #[serde(default)]
    azp: Option<String>,
    #[serde(default)]
    nonce: Option<String>,
    // tokeninfo renders numeric claims as strings
    #[serde(default)]
    exp: Option<String>,
}

impl From<TokenInfoRepr> for TokenInfo {
    fn from(value: TokenInfoRepr) -> Self {
        Self {
            audience: value.aud,
            issuer: value.iss,
            subject: value.sub,
            email: value.email,
            email_verified: value
                .email_verified
                .map(|flag| flag.as_bool())
                .unwrap_or(false),
            authorized_party: value.azp,
            nonce: value.nonce,
            expires_at: value.exp.and_then(|raw| raw.trim().parse().ok()),
        }
    }
}

/// Client for the identity provider's token introspection endpoint.
///
/// One request per [`fetch`](TokenInfoClient::fetch), no retries.
#[derive(Clone)]
pub struct TokenInfoClient {
    client: Client,
    url: String,
}

impl TokenInfoClient {
    /// Build a client whose requests are bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Config(format!("tokeninfo client: {err}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self, id_token: &str) -> AuthResult<TokenInfo> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|err| AuthError::TokenInfoFetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenInfoStatus(status.as_u16()));
        }

        let body: TokenInfoRepr = response
            .json()
            .await
            .map_err(|err| AuthError::TokenInfoDecode(err.to_string()))?;
        Ok(body.into())
    }
}
