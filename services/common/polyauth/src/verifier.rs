use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::claims::GoogleClaims;
use crate::config::{GoogleAuthConfig, GOOGLE_ISSUERS};
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksFetcher;

/// Thread-safe store for decoding keys loaded from JWKS/PEM sources.
#[derive(Clone, Default)]
pub struct InMemoryKeyStore {
    inner: Arc<RwLock<HashMap<String, DecodingKey>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: DecodingKey) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kid.into(), key);
    }

    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<()> {
        let kid = kid.into();
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        self.insert_key(kid, key);
        Ok(())
    }

    pub fn get(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        guard.extend(entries);
    }
}

/// Single-audience Google ID token verifier.
///
/// Checks the RS256 signature against locally cached Google keys, the issuer,
/// expiry and that the audience is the primary client ID. `verify` never
/// touches the network; keys are loaded through [`refresh_jwks`].
///
/// [`refresh_jwks`]: GoogleIdTokenVerifier::refresh_jwks
#[derive(Clone)]
pub struct GoogleIdTokenVerifier {
    client_id: String,
    leeway_seconds: u32,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            leeway_seconds: 30,
            store: InMemoryKeyStore::new(),
            jwks: None,
        }
    }

    pub fn with_store(client_id: impl Into<String>, store: InMemoryKeyStore) -> Self {
        Self {
            client_id: client_id.into(),
            leeway_seconds: 30,
            store,
            jwks: None,
        }
    }

    /// Verifier for the primary client ID of `config`, loading keys from its
    /// JWKS URL. No keys are fetched until [`refresh_jwks`] runs.
    ///
    /// [`refresh_jwks`]: GoogleIdTokenVerifier::refresh_jwks
    pub fn from_config(config: &GoogleAuthConfig, client: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            leeway_seconds: config.leeway_seconds,
            store: InMemoryKeyStore::new(),
            jwks: Some(JwksFetcher::with_client(client, config.jwks_url.clone())),
        }
    }

    pub fn builder(client_id: impl Into<String>) -> GoogleIdTokenVerifierBuilder {
        GoogleIdTokenVerifierBuilder::new(client_id.into())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn store(&self) -> &InMemoryKeyStore {
        &self.store
    }

    pub fn jwks_fetcher(&self) -> Option<&JwksFetcher> {
        self.jwks.as_ref()
    }

    pub fn verify(&self, token: &str, nonce: Option<&str>) -> AuthResult<GoogleClaims> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self
            .store
            .get(&kid)
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway_seconds.into();

        let token_data = decode::<Value>(token, &key, &validation)?;
        let claims = GoogleClaims::try_from(token_data.claims)?;

        if let Some(expected) = nonce {
            if claims.nonce.as_deref() != Some(expected) {
                return Err(AuthError::NonceMismatch);
            }
        }

        debug!(kid, subject = %claims.subject, "verified Google ID token");
        Ok(claims)
    }

    pub async fn refresh_jwks(&self) -> AuthResult<usize> {
        let fetcher = match &self.jwks {
            Some(fetcher) => fetcher,
            None => return Ok(0),
        };

        let keys = fetcher.fetch().await?;
        let count = keys.len();
        if count > 0 {
            self.store.replace_all(keys);
        }
        Ok(count)
    }
}

pub struct GoogleIdTokenVerifierBuilder {
    client_id: String,
    leeway_seconds: u32,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
}

impl GoogleIdTokenVerifierBuilder {
    fn new(client_id: String) -> Self {
        Self {
            client_id,
            leeway_seconds: 30,
            store: InMemoryKeyStore::new(),
            jwks: None,
        }
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_store(mut self, store: InMemoryKeyStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_decoding_key(self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.store.insert_key(kid, key);
        self
    }

    pub fn with_rsa_pem(self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<Self> {
        self.store.insert_rsa_pem(kid, pem)?;
        Ok(self)
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks = Some(JwksFetcher::new(url));
        self
    }

    pub fn with_jwks_fetcher(mut self, fetcher: JwksFetcher) -> Self {
        self.jwks = Some(fetcher);
        self
    }

    /// Build the verifier, loading the key set first when a JWKS source is set.
    pub async fn build(self) -> AuthResult<GoogleIdTokenVerifier> {
        let verifier = GoogleIdTokenVerifier {
            client_id: self.client_id,
            leeway_seconds: self.leeway_seconds,
            store: self.store,
            jwks: self.jwks,
        };

        if verifier.jwks.is_some() {
            verifier.refresh_jwks().await?;
        }

        Ok(verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        id_token_claims, KeyMaterial, IOS_CLIENT_ID, PRIMARY_CLIENT_ID, TEST_KID,
    };
    use httpmock::prelude::*;

    fn verifier_with(material: &KeyMaterial) -> GoogleIdTokenVerifier {
        let store = InMemoryKeyStore::new();
        store.insert_key(TEST_KID, material.decoding.clone());
        GoogleIdTokenVerifier::with_store(PRIMARY_CLIENT_ID, store)
    }

    #[test]
    fn key_store_insert_replace_round_trip() {
        let store = InMemoryKeyStore::new();
        assert!(store.is_empty());
        store.insert_key("kid", DecodingKey::from_secret(b"secret"));
        assert!(store.contains("kid"));
        assert!(store.get("kid").is_some());

        store.replace_all(vec![(
            "another".to_string(),
            DecodingKey::from_secret(b"other"),
        )]);
        assert!(!store.contains("kid"));
        assert!(store.contains("another"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn verifier_accepts_primary_audience() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let token = material.sign(TEST_KID, &id_token_claims(PRIMARY_CLIENT_ID, None));

        let claims = verifier.verify(&token, None).expect("verification succeeds");
        assert_eq!(claims.subject, "110169484474386276334");
        assert_eq!(claims.email.as_deref(), Some("member@example.com"));
        assert!(claims.email_verified);
        assert!(claims.is_for_audience(PRIMARY_CLIENT_ID));
    }

    #[test]
    fn verifier_accepts_short_issuer_form() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let mut claims = id_token_claims(PRIMARY_CLIENT_ID, None);
        claims["iss"] = "accounts.google.com".into();
        let token = material.sign(TEST_KID, &claims);

        verifier.verify(&token, None).expect("verification succeeds");
    }

    #[test]
    fn verifier_rejects_other_audience() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let token = material.sign(TEST_KID, &id_token_claims(IOS_CLIENT_ID, None));

        let err = verifier.verify(&token, None).expect_err("wrong audience");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn verifier_rejects_foreign_issuer() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let mut claims = id_token_claims(PRIMARY_CLIENT_ID, None);
        claims["iss"] = "https://evil.example.com".into();
        let token = material.sign(TEST_KID, &claims);

        let err = verifier.verify(&token, None).expect_err("wrong issuer");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn verifier_rejects_expired_token() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let mut claims = id_token_claims(PRIMARY_CLIENT_ID, None);
        claims["exp"] = (chrono::Utc::now().timestamp() - 3600).into();
        let token = material.sign(TEST_KID, &claims);

        let err = verifier.verify(&token, None).expect_err("expired");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn verifier_checks_nonce_when_supplied() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let token = material.sign(
            TEST_KID,
            &id_token_claims(PRIMARY_CLIENT_ID, Some("nonce-123")),
        );

        verifier
            .verify(&token, Some("nonce-123"))
            .expect("matching nonce");
        let err = verifier
            .verify(&token, Some("other-nonce"))
            .expect_err("nonce mismatch");
        assert!(matches!(err, AuthError::NonceMismatch));

        let without_nonce = material.sign(TEST_KID, &id_token_claims(PRIMARY_CLIENT_ID, None));
        let err = verifier
            .verify(&without_nonce, Some("nonce-123"))
            .expect_err("nonce missing from token");
        assert!(matches!(err, AuthError::NonceMismatch));
    }

    #[test]
    fn verifier_rejects_unknown_kid() {
        let material = KeyMaterial::generate();
        let verifier = verifier_with(&material);
        let token = material.sign("rotated", &id_token_claims(PRIMARY_CLIENT_ID, None));

        match verifier.verify(&token, None).expect_err("unknown kid") {
            AuthError::UnknownKeyId(actual) => assert_eq!(actual, "rotated"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn verifier_rejects_garbage() {
        let verifier = GoogleIdTokenVerifier::new(PRIMARY_CLIENT_ID);
        let err = verifier.verify("not-a-jwt", None).expect_err("garbage");
        assert!(matches!(err, AuthError::InvalidHeader(_)));
    }

    #[tokio::test]
    async fn builder_loads_jwks() {
        let material = KeyMaterial::generate();
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/oauth2/v3/certs");
            then.status(200)
                .json_body(serde_json::json!({ "keys": [material.jwk(TEST_KID)] }));
        });

        let verifier = GoogleIdTokenVerifier::builder(PRIMARY_CLIENT_ID)
            .with_jwks_url(server.url("/oauth2/v3/certs"))
            .build()
            .await
            .expect("build succeeds");

        mock.assert_hits(1);
        assert!(verifier.store().contains(TEST_KID));

        let token = material.sign(TEST_KID, &id_token_claims(PRIMARY_CLIENT_ID, None));
        verifier.verify(&token, None).expect("verification succeeds");
    }

    #[tokio::test]
    async fn refresh_jwks_without_fetcher_returns_zero() {
        let verifier = GoogleIdTokenVerifier::new(PRIMARY_CLIENT_ID);
        let refreshed = verifier.refresh_jwks().await.expect("refresh succeeds");
        assert_eq!(refreshed, 0);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_existing_keys() {
        let material = KeyMaterial::generate();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/certs");
            then.status(502);
        });

        let config = GoogleAuthConfig::new(PRIMARY_CLIENT_ID, "secret")
            .with_jwks_url(server.url("/certs"));
        let verifier = GoogleIdTokenVerifier::from_config(&config, Client::new());
        verifier.store().insert_key(TEST_KID, material.decoding.clone());

        let err = verifier.refresh_jwks().await.expect_err("refresh fails");
        assert!(matches!(err, AuthError::JwksFetch(_)));
        assert!(verifier.store().contains(TEST_KID));
    }
}
