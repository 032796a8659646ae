use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Loads Google's signing keys from a JWKS document.
#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
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

    /// Fetch the key set. Entries that are not RS256 RSA keys are skipped.
    pub async fn fetch(&self) -> AuthResult<Vec<(String, DecodingKey)>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksResponse = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;

        let mut keys = Vec::with_capacity(body.keys.len());
        for key in body.keys {
            let kid = key.kid.ok_or(AuthError::JwksMissingKid)?;
            let kty = key.kty.as_deref().unwrap_or("RSA");
            let alg = key.alg.as_deref().unwrap_or("RS256");
            if kty != "RSA" || alg != "RS256" {
                debug!(kid, kty, alg, "skipping unsupported JWKS entry");
                continue;
            }

            let (Some(modulus), Some(exponent)) = (key.n, key.e) else {
                return Err(AuthError::JwksMissingComponents(kid));
            };

            let decoding_key = DecodingKey::from_rsa_components(&modulus, &exponent)
                .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
            keys.push((kid, decoding_key));
        }

        Ok(keys)
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}
