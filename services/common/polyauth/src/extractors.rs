use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};

use crate::error::{AuthError, AuthResult};

pub const NONCE_HEADER: &str = "X-Id-Token-Nonce";

/// Identity-provider ID token presented by a client, plus the nonce the client
/// used when requesting it.
#[derive(Debug, Clone)]
pub struct IdTokenCredentials {
    pub token: String,
    pub nonce: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for IdTokenCredentials
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;
        let token = parse_bearer(header_value)?;

        let nonce = match parts.headers.get(NONCE_HEADER) {
            Some(raw) => {
                let value = raw
                    .to_str()
                    .map_err(|_| AuthError::InvalidAuthorization)?
                    .trim();
                (!value.is_empty()).then(|| value.to_owned())
            }
            None => None,
        };

        Ok(Self { token, nonce })
    }
}

fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}
