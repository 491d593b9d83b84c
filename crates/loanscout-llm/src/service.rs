//! Query parser facade - provider selection, single-step fallback, diagnostics

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfigUpdate;
use crate::diagnostics::Diagnostics;
use crate::error::{ProviderError, ProviderErrorKind, Result};
use crate::providers::QueryParser;
use crate::registry::{FallbackPair, ProviderRegistry};
use crate::types::{ParseOptions, ParsedQuery, ProviderKind};

/// Headroom on top of the per-attempt timeouts for retry backoff.
const DEADLINE_SLACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
struct Selection {
    pair: FallbackPair,
    /// Set by configuration or `switch_provider`; otherwise the provider is
    /// chosen from the pair on every call.
    pinned: Option<ProviderKind>,
}

/// Entry point for turning free text into a [`ParsedQuery`].
///
/// A call tries the active provider and, if it fails, exactly one alternate:
/// the other member of the fallback pair when it has a credential, otherwise
/// the deterministic provider. It never returns an error; when both attempts
/// fail the result is tagged `ALL_PROVIDERS_FAILED` with confidence 0.
pub struct QueryParserService {
    registry: ProviderRegistry,
    selection: RwLock<Selection>,
}

impl QueryParserService {
    pub fn new(registry: ProviderRegistry) -> Self {
        let settings = registry.settings();
        let pair = FallbackPair::for_context(settings.language);
        let pinned = settings.provider.filter(|kind| {
            let usable = registry.has_credential(*kind);
            if !usable {
                warn!(provider = %kind, "configured provider has no API key, selecting by credentials");
            }
            usable
        });
        let service = Self {
            registry,
            selection: RwLock::new(Selection { pair, pinned }),
        };
        info!(
            provider = %service.current_provider(),
            primary = %pair.primary,
            fallback = %pair.fallback,
            "query parser ready"
        );
        service
    }

    pub fn from_env() -> Self {
        Self::new(ProviderRegistry::from_env())
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn current_provider(&self) -> ProviderKind {
        let selection = *self.selection.read();
        selection
            .pinned
            .unwrap_or_else(|| self.registry.select(selection.pair))
    }

    pub fn fallback_pair(&self) -> FallbackPair {
        self.selection.read().pair
    }

    /// Make `kind` the active provider. Refused when it has no credential.
    pub fn switch_provider(&self, kind: ProviderKind) -> Result<()> {
        if !self.registry.has_credential(kind) {
            return Err(ProviderError::missing_credential(kind));
        }
        let previous = self.current_provider();
        self.selection.write().pinned = Some(kind);
        info!(from = %previous, to = %kind, "switched provider");
        Ok(())
    }

    pub async fn parse_query(&self, text: &str) -> ParsedQuery {
        self.parse_query_with(text, ParseOptions::default()).await
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn parse_query_with(&self, text: &str, opts: ParseOptions) -> ParsedQuery {
        let text = text.trim();
        if text.is_empty() {
            debug!("empty query, using keyword heuristic");
            return self
                .attempt(ProviderKind::Deterministic, text)
                .await
                .unwrap_or_else(|e| ParsedQuery::all_failed(vec![e.to_string()]));
        }

        let (active, pair) = self.resolve(opts);
        let first = match self.attempt(active, text).await {
            Ok(parsed) => return parsed,
            Err(e) => e,
        };

        let Some(alternate) = self.alternate(active, pair) else {
            warn!(provider = %active, error = %first, "provider failed, no alternate available");
            return ParsedQuery::all_failed(vec![first.to_string()]);
        };
        warn!(from = %active, to = %alternate, error = %first, "provider failed, falling back");

        match self.attempt(alternate, text).await {
            Ok(parsed) => parsed,
            Err(second) => {
                warn!(provider = %alternate, error = %second, "fallback failed too");
                ParsedQuery::all_failed(vec![first.to_string(), second.to_string()])
            }
        }
    }

    fn resolve(&self, opts: ParseOptions) -> (ProviderKind, FallbackPair) {
        let selection = *self.selection.read();
        let pair = opts
            .context
            .map(FallbackPair::for_context)
            .unwrap_or(selection.pair);
        let active = opts
            .provider
            .or(selection.pinned)
            .unwrap_or_else(|| self.registry.select(pair));
        (active, pair)
    }

    fn alternate(&self, active: ProviderKind, pair: FallbackPair) -> Option<ProviderKind> {
        let alternate = match pair.other(active) {
            Some(other) if other != active && self.registry.has_credential(other) => other,
            _ => ProviderKind::Deterministic,
        };
        (alternate != active).then_some(alternate)
    }

    /// One provider call under a hard deadline. A `PARSE_ERROR` result counts
    /// as a failure.
    async fn attempt(&self, kind: ProviderKind, text: &str) -> Result<ParsedQuery> {
        let provider = self.registry.get(kind);
        let config = provider.config();
        let deadline = config
            .timeout
            .saturating_mul(config.max_retries.saturating_add(1))
            .saturating_add(DEADLINE_SLACK);

        debug!(provider = %kind, model = %config.model, "parsing query");
        match tokio::time::timeout(deadline, provider.parse_query(text)).await {
            Err(_) => Err(ProviderError::timeout(kind, deadline)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(parsed)) if parsed.is_parse_error() => Err(ProviderError::new(
                kind,
                ProviderErrorKind::Unknown,
                format!("{}: {}", parsed.provider, parsed.reasoning),
            )),
            Ok(Ok(parsed)) => {
                info!(
                    provider = %kind,
                    confidence = parsed.confidence,
                    latency_ms = parsed.latency_ms,
                    "query parsed"
                );
                Ok(parsed)
            }
        }
    }

    /// Diagnostics of the current provider, from the last probe.
    pub async fn diagnostics(&self) -> Diagnostics {
        self.registry.get(self.current_provider()).diagnostics().await
    }

    /// Probe every provider concurrently and report on each.
    pub async fn all_diagnostics(&self) -> Vec<Diagnostics> {
        let probes = ProviderKind::ALL.map(|kind| {
            let provider: Arc<dyn QueryParser> = self.registry.get(kind);
            async move {
                provider.test_connectivity().await;
                provider.diagnostics().await
            }
        });
        futures::future::join_all(probes).await
    }

    pub async fn test_connectivity(&self, kind: ProviderKind) -> bool {
        self.registry.get(kind).test_connectivity().await
    }

    pub fn update_provider_config(&self, kind: ProviderKind, update: ProviderConfigUpdate) {
        debug!(provider = %kind, "updating provider config");
        self.registry.get(kind).update_config(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AiSettings, StaticCredentials};
    use crate::types::LanguageContext;

    fn build(source: StaticCredentials, settings: AiSettings) -> QueryParserService {
        QueryParserService::new(ProviderRegistry::new(settings, Arc::new(source)))
    }

    #[tokio::test]
    async fn test_without_keys_uses_deterministic() {
        let service = build(StaticCredentials::new(), AiSettings::default());
        assert_eq!(service.current_provider(), ProviderKind::Deterministic);

        let parsed = service.parse_query("5 milyon 48 ay konut").await;
        assert_eq!(parsed.provider, "deterministic");
        assert_eq!(parsed.amount, Some(5_000_000.0));
    }

    #[tokio::test]
    async fn test_switch_requires_credential() {
        let service = build(StaticCredentials::new(), AiSettings::default());
        let err = service.switch_provider(ProviderKind::Anthropic).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Authentication);
        assert_eq!(service.current_provider(), ProviderKind::Deterministic);

        service.update_provider_config(
            ProviderKind::Anthropic,
            ProviderConfigUpdate {
                api_key: Some("sk-ant-test".into()),
                ..Default::default()
            },
        );
        service.switch_provider(ProviderKind::Anthropic).unwrap();
        assert_eq!(service.current_provider(), ProviderKind::Anthropic);
    }

    #[test]
    fn test_configured_provider_without_key_is_ignored() {
        let settings = AiSettings {
            provider: Some(ProviderKind::OpenAI),
            language: LanguageContext::Complex,
            ..Default::default()
        };
        let service = build(
            StaticCredentials::new().with("OPENAI_API_KEY", "sk-x"),
            settings.clone(),
        );
        assert_eq!(service.current_provider(), ProviderKind::OpenAI);

        let service = build(StaticCredentials::new(), settings);
        assert_eq!(service.current_provider(), ProviderKind::Deterministic);
        assert_eq!(service.fallback_pair().primary, ProviderKind::Anthropic);
    }

    #[tokio::test]
    async fn test_extreme_timeouts_do_not_overflow() {
        let settings = AiSettings {
            timeout: Duration::MAX,
            max_retries: u32::MAX,
            ..Default::default()
        };
        let service = build(StaticCredentials::new(), settings);
        let parsed = service.parse_query("5 milyon 48 ay konut").await;
        assert_eq!(parsed.provider, "deterministic");
        assert_eq!(parsed.term, Some(48));
    }

    #[tokio::test]
    async fn test_empty_query() {
        let service = build(StaticCredentials::new(), AiSettings::default());
        let parsed = service.parse_query("   ").await;
        assert!(!parsed.is_loan_query);
        assert_eq!(parsed.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_all_diagnostics_covers_every_kind() {
        let service = build(
            StaticCredentials::new().with("OPENAI_API_KEY", "not-a-key"),
            AiSettings::default(),
        );
        let report = service.all_diagnostics().await;
        assert_eq!(report.len(), 3);
        assert!(report
            .iter()
            .any(|d| d.provider == ProviderKind::Deterministic && d.is_healthy()));
        let openai = report.iter().find(|d| d.provider == ProviderKind::OpenAI).unwrap();
        assert_eq!(openai.api_key_status, crate::diagnostics::ApiKeyStatus::InvalidFormat);
    }
}
