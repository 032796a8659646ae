use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_polyauth::{AuthError, IdTokenCredentials};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::AppState;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "Unable to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderSummary {
    pub id: String,
    pub plugin_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let providers = state
        .providers
        .ids()
        .into_iter()
        .filter_map(|id| state.providers.get(&id))
        .map(|provider| ProviderSummary {
            id: provider.id().to_string(),
            plugin_id: provider.plugin_id().to_string(),
        })
        .collect();
    Json(ProvidersResponse { providers })
}

pub const UNKNOWN_PROVIDER_LABEL: &str = "unknown";

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub provider: String,
    pub verified: bool,
}

pub async fn sign_in_with_id_token(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    credentials: IdTokenCredentials,
) -> Result<Json<SignInResponse>, AuthError> {
    let Some(provider) = state.providers.get(&provider_id) else {
        // the label set stays fixed; the requested id only goes to the log
        state.record_sign_in(UNKNOWN_PROVIDER_LABEL, "unknown_provider");
        info!(requested = %provider_id, "ID token sign-in for unknown provider");
        return Err(AuthError::UnknownProvider(provider_id));
    };

    let verified = provider
        .verify_id_token(&credentials.token, credentials.nonce.as_deref())
        .await;

    if !verified {
        state.record_sign_in(provider.id(), "rejected");
        info!(provider = %provider.id(), plugin = %provider.plugin_id(), "ID token sign-in rejected");
        return Err(AuthError::SignInRejected);
    }

    state.record_sign_in(provider.id(), "accepted");
    info!(provider = %provider.id(), plugin = %provider.plugin_id(), "ID token sign-in accepted");
    Ok(Json(SignInResponse {
        provider: provider.id().to_string(),
        verified,
    }))
}
