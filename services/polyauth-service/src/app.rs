use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use common_polyauth::ProviderRegistry;

use crate::handlers::{health, list_providers, metrics_endpoint, sign_in_with_id_token};
use crate::metrics::SignInMetrics;

#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderRegistry>,
    pub metrics: Arc<SignInMetrics>,
}

impl FromRef<AppState> for Arc<ProviderRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.providers.clone()
    }
}

impl FromRef<AppState> for Arc<SignInMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl AppState {
    pub fn record_sign_in(&self, provider: &str, outcome: &str) {
        self.metrics.sign_in_attempt(provider, outcome);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/providers", get(list_providers))
        .route("/sign-in/:provider/id-token", post(sign_in_with_id_token))
        .with_state(state)
}
