pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jwks;
pub mod outcome;
pub mod polyauth;
pub mod provider;
pub mod tokeninfo;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use claims::GoogleClaims;
pub use config::{is_google_issuer, GoogleAuthConfig, GOOGLE_ISSUERS};
pub use error::{AuthError, AuthResult};
pub use extractors::{IdTokenCredentials, NONCE_HEADER};
pub use jwks::JwksFetcher;
pub use outcome::VerificationOutcome;
pub use polyauth::{GooglePolyAuth, GOOGLE_PROVIDER_ID, PLUGIN_ID};
pub use provider::{CustomIdTokenVerifier, IdTokenProvider, ProviderRegistry};
pub use tokeninfo::{TokenInfo, TokenInfoClient};
pub use verifier::{GoogleIdTokenVerifier, GoogleIdTokenVerifierBuilder, InMemoryKeyStore};
