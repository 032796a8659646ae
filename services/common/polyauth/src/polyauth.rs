//! Google ID token sign-in across several OAuth client IDs.
//!
//! Web, iOS and Android apps that share one backend each get their own Google
//! client ID. Tokens minted for the primary client ID are verified locally;
//! tokens minted for any of the additional client IDs are confirmed through
//! Google's tokeninfo endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{is_google_issuer, GoogleAuthConfig};
use crate::error::{AuthError, AuthResult};
use crate::outcome::VerificationOutcome;
use crate::provider::{CustomIdTokenVerifier, IdTokenProvider};
use crate::tokeninfo::{TokenInfo, TokenInfoClient};
use crate::verifier::GoogleIdTokenVerifier;

pub const GOOGLE_PROVIDER_ID: &str = "google";
pub const PLUGIN_ID: &str = "google-polyauth";

#[derive(Clone)]
pub struct GooglePolyAuth {
    config: Arc<GoogleAuthConfig>,
    verifier: Arc<GoogleIdTokenVerifier>,
    tokeninfo: TokenInfoClient,
    custom: Option<Arc<dyn CustomIdTokenVerifier>>,
}

impl GooglePolyAuth {
    /// `verifier` must be configured for the primary client ID of `config`.
    pub fn new(config: GoogleAuthConfig, verifier: Arc<GoogleIdTokenVerifier>) -> AuthResult<Self> {
        config.validate()?;
        if verifier.client_id() != config.client_id {
            return Err(AuthError::Config(format!(
                "verifier audience '{}' does not match primary client id '{}'",
                verifier.client_id(),
                config.client_id
            )));
        }

        let tokeninfo = TokenInfoClient::new(config.tokeninfo_url.clone(), config.tokeninfo_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            verifier,
            tokeninfo,
            custom: None,
        })
    }

    /// Route every check through `custom`, bypassing the built-in logic.
    pub fn with_custom_verifier(mut self, custom: Arc<dyn CustomIdTokenVerifier>) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn config(&self) -> &GoogleAuthConfig {
        &self.config
    }

    pub fn verifier(&self) -> &Arc<GoogleIdTokenVerifier> {
        &self.verifier
    }

    pub async fn verify(&self, token: &str, nonce: Option<&str>) -> bool {
        self.evaluate(token, nonce).await.is_valid()
    }

    pub async fn evaluate(&self, token: &str, nonce: Option<&str>) -> VerificationOutcome {
        if let Some(custom) = &self.custom {
            let accepted = custom.verify(token, nonce).await;
            debug!(plugin = PLUGIN_ID, accepted, "custom ID token verifier consulted");
            return if accepted {
                VerificationOutcome::CustomAccepted
            } else {
                VerificationOutcome::CustomRejected
            };
        }

        if self.config.disable_id_token_sign_in {
            debug!(plugin = PLUGIN_ID, "ID token sign-in disabled");
            return VerificationOutcome::Disabled;
        }

        match self.verifier.verify(token, nonce) {
            Ok(claims) => {
                debug!(
                    plugin = PLUGIN_ID,
                    client_id = %self.config.client_id,
                    subject = %claims.subject,
                    "ID token accepted for primary client id"
                );
                return VerificationOutcome::PrimaryOk;
            }
            Err(err) => {
                debug!(plugin = PLUGIN_ID, error = %err, "primary ID token verification failed");
            }
        }

        if !self.config.has_additional_client_ids() {
            debug!(plugin = PLUGIN_ID, "no additional client ids configured");
            return VerificationOutcome::NoFallbackConfigured;
        }

        let info = match self.tokeninfo.fetch(token).await {
            Ok(info) => info,
            Err(err @ (AuthError::TokenInfoFetch(_) | AuthError::TokenInfoStatus(_))) => {
                debug!(
                    plugin = PLUGIN_ID,
                    error = %err,
                    tokeninfo_url = %self.tokeninfo.url(),
                    "tokeninfo endpoint unreachable"
                );
                return VerificationOutcome::IntrospectionUnreachable;
            }
            Err(err) => {
                debug!(plugin = PLUGIN_ID, error = %err, "tokeninfo lookup failed");
                return VerificationOutcome::UnexpectedError;
            }
        };

        self.check_introspected(&info, nonce)
    }

    fn check_introspected(&self, info: &TokenInfo, nonce: Option<&str>) -> VerificationOutcome {
        if !self.config.accepts_additional(&info.audience) {
            debug!(plugin = PLUGIN_ID, audience = %info.audience, "ID token audience not accepted");
            return VerificationOutcome::AudienceMismatch;
        }

        if !is_google_issuer(&info.issuer) {
            debug!(plugin = PLUGIN_ID, issuer = %info.issuer, "ID token issuer not accepted");
            return VerificationOutcome::IssuerMismatch;
        }

        // informational only on this path
        if let Some(expected) = nonce {
            if info.nonce.as_deref() != Some(expected) {
                debug!(
                    plugin = PLUGIN_ID,
                    audience = %info.audience,
                    "tokeninfo nonce differs from caller nonce"
                );
            }
        }

        debug!(
            plugin = PLUGIN_ID,
            client_id = %info.audience,
            "ID token accepted for additional client id"
        );
        VerificationOutcome::FallbackOk {
            client_id: info.audience.clone(),
        }
    }
}

#[async_trait]
impl IdTokenProvider for GooglePolyAuth {
    fn id(&self) -> &str {
        GOOGLE_PROVIDER_ID
    }

    fn plugin_id(&self) -> &str {
        PLUGIN_ID
    }

    async fn verify_id_token(&self, token: &str, nonce: Option<&str>) -> bool {
        self.verify(token, nonce).await
    }
}
