use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct SignInMetrics {
    registry: Registry,
    sign_in_attempts: IntCounterVec,
}

impl SignInMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let sign_in_attempts = IntCounterVec::new(
            Opts::new(
                "polyauth_sign_in_attempts_total",
                "Count of ID token sign-in attempts grouped by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;
        registry.register(Box::new(sign_in_attempts.clone()))?;

        Ok(Self {
            registry,
            sign_in_attempts,
        })
    }

    pub fn sign_in_attempt(&self, provider: &str, outcome: &str) {
        self.sign_in_attempts
            .with_label_values(&[provider, outcome])
            .inc();
    }

    pub fn sign_in_count(&self, provider: &str, outcome: &str) -> u64 {
        self.sign_in_attempts
            .with_label_values(&[provider, outcome])
            .get()
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
