use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use common_polyauth::{GoogleAuthConfig, GoogleIdTokenVerifier, GooglePolyAuth, ProviderRegistry};
use reqwest::Client;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Build the Google verifier and load the current signing keys.
///
/// A failed key fetch is logged rather than fatal: tokens for additional
/// client ids can still be confirmed through tokeninfo, and the refresh task
/// retries the key fetch.
pub async fn build_google_verifier(config: &GoogleAuthConfig) -> Result<Arc<GoogleIdTokenVerifier>> {
    let client = Client::builder()
        .timeout(config.jwks_timeout)
        .build()
        .context("Failed to build JWKS HTTP client")?;
    let verifier = GoogleIdTokenVerifier::from_config(config, client);

    match verifier.refresh_jwks().await {
        Ok(count) => info!(count, jwks_url = %config.jwks_url, "Loaded Google signing keys"),
        Err(err) => warn!(error = %err, jwks_url = %config.jwks_url, "Initial JWKS fetch failed"),
    }

    Ok(Arc::new(verifier))
}

/// Install the multi-client Google provider, replacing any stock Google entry.
pub fn install_google_polyauth(
    registry: &mut ProviderRegistry,
    config: GoogleAuthConfig,
    verifier: Arc<GoogleIdTokenVerifier>,
) -> Result<()> {
    let additional = config.additional_client_ids.len();
    let polyauth = GooglePolyAuth::new(config, verifier)?;
    match registry.install(Arc::new(polyauth)) {
        Some(previous) => info!(
            replaced = %previous.plugin_id(),
            additional_client_ids = additional,
            "Replaced Google sign-in provider with google-polyauth"
        ),
        None => info!(
            additional_client_ids = additional,
            "Registered google-polyauth sign-in provider"
        ),
    }
    Ok(())
}

pub fn spawn_jwks_refresh(verifier: Arc<GoogleIdTokenVerifier>, refresh_secs: u64) {
    let Some(fetcher) = verifier.jwks_fetcher() else {
        return;
    };

    let interval_duration = Duration::from_secs(refresh_secs);
    let url = fetcher.url().to_owned();

    tokio::spawn(async move {
        let mut ticker = interval(interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; keys were loaded at startup
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match verifier.refresh_jwks().await {
                Ok(count) => {
                    debug!(count, jwks_url = %url, "Refreshed JWKS keys");
                }
                Err(err) => {
                    warn!(error = %err, jwks_url = %url, "Failed to refresh JWKS keys");
                }
            }
        }
    });
}
