use std::fmt;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";

/// Issuer strings Google uses in ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

pub const DEFAULT_SCOPES: [&str; 3] = ["email", "profile", "openid"];
pub const DEFAULT_TOKENINFO_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration for Google ID token sign-in.
///
/// The primary `client_id` is checked first through local signature
/// verification. `additional_client_ids` are only accepted through the
/// tokeninfo fallback.
#[derive(Clone)]
pub struct GoogleAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub additional_client_ids: Vec<String>,
    pub scopes: Vec<String>,
    pub disable_id_token_sign_in: bool,
    pub jwks_url: String,
    /// Request timeout for signing key fetches, independent of tokeninfo.
    pub jwks_timeout: Duration,
    pub tokeninfo_url: String,
    pub tokeninfo_timeout: Duration,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
}

impl GoogleAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            additional_client_ids: Vec::new(),
            scopes: DEFAULT_SCOPES.iter().map(|scope| scope.to_string()).collect(),
            disable_id_token_sign_in: false,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            jwks_timeout: DEFAULT_JWKS_TIMEOUT,
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
            tokeninfo_timeout: DEFAULT_TOKENINFO_TIMEOUT,
            leeway_seconds: 30,
        }
    }

    /// Replace the additional client IDs. Blank entries are dropped and
    /// repeats collapse onto their first occurrence.
    pub fn with_additional_client_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            let trimmed = id.trim();
            if trimmed.is_empty() || deduped.iter().any(|known| known == trimmed) {
                continue;
            }
            deduped.push(trimmed.to_string());
        }
        self.additional_client_ids = deduped;
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_token_sign_in_disabled(mut self, disabled: bool) -> Self {
        self.disable_id_token_sign_in = disabled;
        self
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    pub fn with_tokeninfo_url(mut self, url: impl Into<String>) -> Self {
        self.tokeninfo_url = url.into();
        self
    }

    pub fn with_tokeninfo_timeout(mut self, timeout: Duration) -> Self {
        self.tokeninfo_timeout = timeout;
        self
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Config("client_id must not be empty".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AuthError::Config(
                "client_secret must not be empty".to_string(),
            ));
        }
        if self.tokeninfo_timeout.is_zero() {
            return Err(AuthError::Config(
                "tokeninfo_timeout must be greater than zero".to_string(),
            ));
        }
        if self.jwks_timeout.is_zero() {
            return Err(AuthError::Config(
                "jwks_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_additional_client_ids(&self) -> bool {
        !self.additional_client_ids.is_empty()
    }

    pub fn accepts_additional(&self, audience: &str) -> bool {
        self.additional_client_ids.iter().any(|id| id == audience)
    }
}

pub fn is_google_issuer(issuer: &str) -> bool {
    GOOGLE_ISSUERS.contains(&issuer)
}

impl fmt::Debug for GoogleAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("additional_client_ids", &self.additional_client_ids)
            .field("scopes", &self.scopes)
            .field("disable_id_token_sign_in", &self.disable_id_token_sign_in)
            .field("jwks_url", &self.jwks_url)
            .field("jwks_timeout", &self.jwks_timeout)
            .field("tokeninfo_url", &self.tokeninfo_url)
            .field("tokeninfo_timeout", &self.tokeninfo_timeout)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
