//! Key material and token helpers shared by the unit tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

pub const PRIMARY_CLIENT_ID: &str = "web-client.apps.googleusercontent.com";
pub const IOS_CLIENT_ID: &str = "ios-client.apps.googleusercontent.com";
pub const ANDROID_CLIENT_ID: &str = "android-client.apps.googleusercontent.com";
pub const TEST_KID: &str = "google-test-key";

pub struct KeyMaterial {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub modulus: String,
    pub exponent: String,
}

impl KeyMaterial {
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");
        let public_pem = public_key.to_pkcs1_pem(LineEnding::LF).expect("public pem");

        Self {
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
            decoding: DecodingKey::from_rsa_pem(public_pem.as_bytes()).expect("decoding key"),
            modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kid": kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": self.modulus,
            "e": self.exponent
        })
    }

    pub fn sign(&self, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &self.encoding).expect("sign token")
    }
}

/// Claims shaped like a Google ID token minted for `audience`.
pub fn id_token_claims(audience: &str, nonce: Option<&str>) -> Value {
    let issued_at = Utc::now().timestamp();
    let mut claims = json!({
        "iss": "https://accounts.google.com",
        "azp": audience,
        "aud": audience,
        "sub": "110169484474386276334",
        "email": "member@example.com",
        "email_verified": true,
        "name": "Member Example",
        "iat": issued_at,
        "exp": issued_at + 600
    });
    if let Some(nonce) = nonce {
        claims["nonce"] = Value::String(nonce.to_string());
    }
    claims
}
