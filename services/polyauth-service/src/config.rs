use anyhow::{anyhow, Context, Result};
use common_polyauth::GoogleAuthConfig;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const MIN_HTTP_TIMEOUT_MS: u64 = 500;
const MAX_HTTP_TIMEOUT_MS: u64 = 10_000;
const MIN_JWKS_REFRESH_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub jwks_refresh_secs: u64,
    pub google: GoogleAuthConfig,
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .map(|value| value.trim().parse())
        .transpose()
        .context("Failed to parse PORT")?
        .unwrap_or(8085);
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid HOST '{host}'"))?;

    let jwks_refresh_secs = env::var("JWKS_REFRESH_SECONDS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(300)
        .max(MIN_JWKS_REFRESH_SECS);

    Ok(ServiceConfig {
        addr: SocketAddr::from((ip, port)),
        jwks_refresh_secs,
        google: load_google_config()?,
    })
}

pub fn load_google_config() -> Result<GoogleAuthConfig> {
    let client_id = required("GOOGLE_CLIENT_ID")?;
    let client_secret = required("GOOGLE_CLIENT_SECRET")?;

    let mut config = GoogleAuthConfig::new(client_id, client_secret)
        .with_additional_client_ids(
            env::var("GOOGLE_ADDITIONAL_CLIENT_IDS")
                .map(|value| parse_list(&value))
                .unwrap_or_default(),
        )
        .with_id_token_sign_in_disabled(
            bool_from_env("GOOGLE_DISABLE_ID_TOKEN_SIGN_IN").unwrap_or(false),
        );

    if let Ok(value) = env::var("GOOGLE_SCOPES") {
        let scopes = parse_list(&value);
        if !scopes.is_empty() {
            config = config.with_scopes(scopes);
        }
    }
    if let Some(url) = env::var("GOOGLE_JWKS_URL")
        .ok()
        .and_then(|value| normalize_optional(&value))
    {
        config = config.with_jwks_url(url);
    }
    if let Some(url) = env::var("GOOGLE_TOKENINFO_URL")
        .ok()
        .and_then(|value| normalize_optional(&value))
    {
        config = config.with_tokeninfo_url(url);
    }
    if let Ok(value) = env::var("GOOGLE_TOKENINFO_TIMEOUT_MS") {
        let millis = parse_timeout_ms("GOOGLE_TOKENINFO_TIMEOUT_MS", &value)?;
        config = config.with_tokeninfo_timeout(Duration::from_millis(millis));
    }
    if let Ok(value) = env::var("GOOGLE_JWKS_TIMEOUT_MS") {
        let millis = parse_timeout_ms("GOOGLE_JWKS_TIMEOUT_MS", &value)?;
        config = config.with_jwks_timeout(Duration::from_millis(millis));
    }
    if let Ok(value) = env::var("JWT_LEEWAY_SECONDS") {
        let seconds = value
            .trim()
            .parse::<u32>()
            .context("Failed to parse JWT_LEEWAY_SECONDS")?;
        config = config.with_leeway(seconds);
    }

    config.validate()?;
    Ok(config)
}

fn required(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .and_then(|value| normalize_optional(&value))
        .ok_or_else(|| anyhow!("{key} must be set"))
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split([',', ';', ' '])
        .filter_map(normalize_optional)
        .collect()
}

fn parse_timeout_ms(key: &str, value: &str) -> Result<u64> {
    let millis = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid {key} '{value}'"))?;
    Ok(millis.clamp(MIN_HTTP_TIMEOUT_MS, MAX_HTTP_TIMEOUT_MS))
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
