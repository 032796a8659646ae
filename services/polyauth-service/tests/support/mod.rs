#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use common_polyauth::{IdTokenProvider, ProviderRegistry};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use polyauth_service::metrics::SignInMetrics;
use polyauth_service::{router, AppState};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const PRIMARY_CLIENT_ID: &str = "web-client.apps.googleusercontent.com";
pub const IOS_CLIENT_ID: &str = "ios-client.apps.googleusercontent.com";
pub const ANDROID_CLIENT_ID: &str = "android-client.apps.googleusercontent.com";
pub const KID: &str = "google-signing-key";

pub struct SigningKey {
    encoding: EncodingKey,
    modulus: String,
    exponent: String,
}

impl SigningKey {
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048)?;
        let public_key = private_key.to_public_key();
        let private_pem = private_key.to_pkcs1_pem(LineEnding::LF)?;

        Ok(Self {
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes())?,
            modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        })
    }

    pub fn jwks(&self) -> Value {
        json!({
            "keys": [{
                "kid": KID,
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "n": self.modulus,
                "e": self.exponent
            }]
        })
    }

    pub fn id_token(&self, audience: &str) -> Result<String> {
        let issued_at = Utc::now().timestamp();
        let claims = json!({
            "iss": "https://accounts.google.com",
            "azp": audience,
            "aud": audience,
            "sub": "104857600000000000001",
            "email": "member@example.com",
            "email_verified": true,
            "iat": issued_at,
            "exp": issued_at + 600
        });
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KID.to_string());
        Ok(encode(&header, &claims, &self.encoding)?)
    }
}

pub fn app_with(providers: Vec<Arc<dyn IdTokenProvider>>) -> Result<(Router, AppState)> {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.install(provider);
    }
    let state = AppState {
        providers: Arc::new(registry),
        metrics: Arc::new(SignInMetrics::new()?),
    };
    Ok((router(state.clone()), state))
}

pub async fn sign_in(
    app: &Router,
    provider: &str,
    token: Option<&str>,
) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder()
        .method("POST")
        .uri(format!("/sign-in/{provider}/id-token"));
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let response = app.clone().oneshot(request.body(Body::empty())?).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub async fn get_text(app: &Router, uri: &str) -> Result<(StatusCode, String)> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(bytes.to_vec())?))
}
