use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use common_polyauth::ProviderRegistry;
use polyauth_service::config::load_service_config;
use polyauth_service::metrics::SignInMetrics;
use polyauth_service::startup::{build_google_verifier, install_google_polyauth, spawn_jwks_refresh};
use polyauth_service::{router, AppState};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    info!(google = ?config.google, "Loaded configuration");

    let verifier = build_google_verifier(&config.google).await?;
    spawn_jwks_refresh(verifier.clone(), config.jwks_refresh_secs);

    let mut providers = ProviderRegistry::new();
    install_google_polyauth(&mut providers, config.google.clone(), verifier)?;

    let state = AppState {
        providers: Arc::new(providers),
        metrics: Arc::new(SignInMetrics::new()?),
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:8081"),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-id-token-nonce"),
        ]);

    let app = router(state).layer(cors);

    info!(addr = %config.addr, "starting polyauth-service");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
