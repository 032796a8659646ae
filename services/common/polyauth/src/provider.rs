use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// A sign-in provider that can vouch for identity-provider ID tokens.
#[async_trait]
pub trait IdTokenProvider: Send + Sync {
    /// Identity provider slot this provider occupies, e.g. `"google"`.
    fn id(&self) -> &str;

    /// Stable identifier of the plugin implementing the provider.
    fn plugin_id(&self) -> &str {
        self.id()
    }

    async fn verify_id_token(&self, token: &str, nonce: Option<&str>) -> bool;
}

/// Caller-supplied replacement for the built-in ID token check.
#[async_trait]
pub trait CustomIdTokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, nonce: Option<&str>) -> bool;
}

/// Sign-in providers keyed by provider id. At most one provider per id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdTokenProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `provider`, replacing whatever was registered under its id.
    /// Returns the replaced provider, if any.
    pub fn install(
        &mut self,
        provider: Arc<dyn IdTokenProvider>,
    ) -> Option<Arc<dyn IdTokenProvider>> {
        self.providers.insert(provider.id().to_string(), provider)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn IdTokenProvider>> {
        self.providers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn find_by_plugin(&self, plugin_id: &str) -> Option<Arc<dyn IdTokenProvider>> {
        self.providers
            .values()
            .find(|provider| provider.plugin_id() == plugin_id)
            .cloned()
    }

    /// Registered provider ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = self.providers.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
