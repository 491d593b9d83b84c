//! Provider selection and instance cache

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::{AiSettings, CacheKey, CredentialSource, EnvCredentials, ProviderConfig};
use crate::providers::{AnthropicProvider, DeterministicProvider, OpenAIProvider, QueryParser};
use crate::types::{LanguageContext, ProviderKind};

/// Primary backend plus the one alternate tried when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPair {
    pub primary: ProviderKind,
    pub fallback: ProviderKind,
}

impl FallbackPair {
    pub fn for_context(context: LanguageContext) -> Self {
        match context {
            LanguageContext::Turkish | LanguageContext::English => Self {
                primary: ProviderKind::OpenAI,
                fallback: ProviderKind::Anthropic,
            },
            LanguageContext::Complex => Self {
                primary: ProviderKind::Anthropic,
                fallback: ProviderKind::OpenAI,
            },
        }
    }

    /// The other member, if `kind` belongs to the pair.
    pub fn other(&self, kind: ProviderKind) -> Option<ProviderKind> {
        if kind == self.primary {
            Some(self.fallback)
        } else if kind == self.fallback {
            Some(self.primary)
        } else {
            None
        }
    }
}

/// Builds a provider instance from a resolved configuration.
pub type ProviderFactory = Arc<dyn Fn(ProviderConfig) -> Arc<dyn QueryParser> + Send + Sync>;

/// Creates providers lazily and caches them by [`CacheKey`].
pub struct ProviderRegistry {
    settings: AiSettings,
    credentials: Arc<dyn CredentialSource>,
    factory: ProviderFactory,
    cache: DashMap<CacheKey, Arc<dyn QueryParser>>,
}

impl ProviderRegistry {
    pub fn new(settings: AiSettings, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_factory(settings, credentials, Self::default_factory())
    }

    pub fn from_env() -> Self {
        let credentials = EnvCredentials::load();
        let settings = AiSettings::from_source(&credentials);
        Self::new(settings, Arc::new(credentials))
    }

    /// Use a custom constructor, e.g. in-process doubles for tests.
    pub fn with_factory(
        settings: AiSettings,
        credentials: Arc<dyn CredentialSource>,
        factory: ProviderFactory,
    ) -> Self {
        Self {
            settings,
            credentials,
            factory,
            cache: DashMap::new(),
        }
    }

    pub fn default_factory() -> ProviderFactory {
        Arc::new(|config: ProviderConfig| -> Arc<dyn QueryParser> {
            match config.kind {
                ProviderKind::OpenAI => Arc::new(OpenAIProvider::new(config)),
                ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config)),
                ProviderKind::Deterministic => Arc::new(DeterministicProvider::with_config(config)),
            }
        })
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    pub fn config_for(&self, kind: ProviderKind) -> ProviderConfig {
        ProviderConfig::resolve(kind, &self.settings, self.credentials.as_ref())
    }

    /// Asks the live instance, so keys applied with `update_config` count.
    pub fn has_credential(&self, kind: ProviderKind) -> bool {
        self.get(kind).has_credential()
    }

    /// Cached instance for `kind`, created on first use.
    pub fn get(&self, kind: ProviderKind) -> Arc<dyn QueryParser> {
        let config = self.config_for(kind);
        let key = config.cache_key();
        if let Some(provider) = self.cache.get(&key) {
            tracing::trace!(provider = %kind, "provider cache hit");
            return provider.clone();
        }
        self.cache
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(provider = %kind, model = %config.model, "creating provider");
                (self.factory)(config)
            })
            .clone()
    }

    /// Primary if it has a credential, else fallback if it has one, else
    /// the deterministic provider.
    pub fn select(&self, pair: FallbackPair) -> ProviderKind {
        [pair.primary, pair.fallback]
            .into_iter()
            .find(|kind| self.has_credential(*kind))
            .unwrap_or(ProviderKind::Deterministic)
    }

    /// Drop cached instances of `kind` so the next `get` re-reads credentials.
    pub fn invalidate(&self, kind: ProviderKind) {
        self.cache.retain(|key, _| key.kind != kind);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;

    fn registry(source: StaticCredentials) -> ProviderRegistry {
        ProviderRegistry::new(AiSettings::default(), Arc::new(source))
    }

    #[test]
    fn test_pairs_by_context() {
        let tr = FallbackPair::for_context(LanguageContext::Turkish);
        assert_eq!(tr.primary, ProviderKind::OpenAI);
        assert_eq!(tr.fallback, ProviderKind::Anthropic);
        assert_eq!(FallbackPair::for_context(LanguageContext::English), tr);

        let complex = FallbackPair::for_context(LanguageContext::Complex);
        assert_eq!(complex.primary, ProviderKind::Anthropic);
        assert_eq!(complex.other(ProviderKind::Anthropic), Some(ProviderKind::OpenAI));
        assert_eq!(complex.other(ProviderKind::Deterministic), None);
    }

    #[test]
    fn test_selection_by_credentials() {
        let pair = FallbackPair::for_context(LanguageContext::Turkish);

        let both = registry(
            StaticCredentials::new()
                .with("OPENAI_API_KEY", "sk-a")
                .with("ANTHROPIC_API_KEY", "sk-ant-b"),
        );
        assert_eq!(both.select(pair), ProviderKind::OpenAI);

        let claude_only = registry(StaticCredentials::new().with("ANTHROPIC_API_KEY", "sk-ant-b"));
        assert_eq!(claude_only.select(pair), ProviderKind::Anthropic);

        let none = registry(StaticCredentials::new());
        assert_eq!(none.select(pair), ProviderKind::Deterministic);
    }

    #[test]
    fn test_instances_are_cached_and_invalidated() {
        let registry = registry(StaticCredentials::new().with("OPENAI_API_KEY", "sk-a"));
        let a = registry.get(ProviderKind::OpenAI);
        let b = registry.get(ProviderKind::OpenAI);
        assert!(Arc::ptr_eq(&a, &b));
        registry.get(ProviderKind::Deterministic);
        assert_eq!(registry.cached_count(), 2);

        registry.invalidate(ProviderKind::OpenAI);
        assert_eq!(registry.cached_count(), 1);
        let c = registry.get(ProviderKind::OpenAI);
        assert!(!Arc::ptr_eq(&a, &c));

        registry.clear();
        assert_eq!(registry.cached_count(), 0);
    }
}
