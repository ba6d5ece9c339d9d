use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::gateway::LLMProvider;
use super::http::HttpChatProvider;
use super::kind::ProviderKind;
use crate::config::ProvidersConfig;
use crate::error::Result;

/// Process-wide provider cache keyed by `{kind}_{model}`.
///
/// Entries are created lazily on first request and never evicted. Safe to
/// share across concurrent solve runs: sessions inside each provider are
/// keyed by run-unique ids, so runs never touch each other's history.
pub struct ProviderRegistry {
    config: ProvidersConfig,
    providers: DashMap<String, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new(config: ProvidersConfig) -> Self {
        Self {
            config,
            providers: DashMap::new(),
        }
    }

    pub fn get_or_create(&self, kind: ProviderKind, model: &str) -> Result<Arc<dyn LLMProvider>> {
        let key = format!("{}_{}", kind.as_str(), model);

        if let Some(existing) = self.providers.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let provider: Arc<dyn LLMProvider> =
            Arc::new(HttpChatProvider::new(kind, model, &self.config)?);
        debug!(provider = %key, "Created provider");

        // Two callers may race to build the same key; the entry API keeps
        // exactly one and the loser's instance is dropped.
        let entry = self.providers.entry(key).or_insert(provider);
        Ok(Arc::clone(entry.value()))
    }

    /// Pre-seed the cache with an existing provider instance. Later
    /// `get_or_create` calls for the same pair return it instead of
    /// building an HTTP provider. Used to plug in non-HTTP backends.
    pub fn register(&self, provider: Arc<dyn LLMProvider>) {
        let key = format!("{}_{}", provider.kind().as_str(), provider.model());
        debug!(provider = %key, "Registered provider");
        self.providers.insert(key, provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .providers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
