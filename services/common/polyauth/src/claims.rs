use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Verified claims of a Google ID token.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleClaims {
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub authorized_party: Option<String>,
    pub nonce: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw: serde_json::Value,
}

impl GoogleClaims {
    pub fn is_for_audience(&self, client_id: &str) -> bool {
        self.audience.iter().any(|value| value == client_id)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    iss: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    aud: Option<AudienceRepr>,
    #[serde(default)]
    azp: Option<String>,
    #[serde(default)]
    nonce: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<FlagRepr>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

// Google sends email_verified as a bool in ID tokens and as "true"/"false"
// from tokeninfo.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlagRepr {
    Bool(bool),
    Text(String),
}

impl FlagRepr {
    pub(crate) fn as_bool(&self) -> bool {
        match self {
            FlagRepr::Bool(value) => *value,
            FlagRepr::Text(value) => value.eq_ignore_ascii_case("true"),
        }
    }
}

impl TryFrom<ClaimsRepr> for GoogleClaims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        if value.sub.trim().is_empty() {
            return Err(AuthError::InvalidClaim("sub", value.sub));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        let audience = match value.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            subject: value.sub,
            email: value.email,
            email_verified: value
                .email_verified
                .map(|flag| flag.as_bool())
                .unwrap_or(false),
            name: value.name,
            picture: value.picture,
            issuer: value.iss,
            audience,
            authorized_party: value.azp,
            nonce: value.nonce,
            expires_at,
            issued_at,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for GoogleClaims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = GoogleClaims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
