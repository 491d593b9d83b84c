//! Provider configuration and credential lookup.
//!
//! Credentials are read once, when a provider is constructed by the
//! [`crate::registry::ProviderRegistry`]. Rotating a key in the environment does
//! not affect an already cached provider unless the rotation changes the cache
//! key (e.g. key added or removed); use `ProviderRegistry::invalidate` for that.

use std::collections::HashMap;
use std::time::Duration;

use loanscout_domain::DEFAULT_CURRENCY;

use crate::types::{LanguageContext, ProviderKind};

pub const ENV_PROVIDER: &str = "LOANSCOUT_AI_PROVIDER";
pub const ENV_LANGUAGE: &str = "LOANSCOUT_AI_LANGUAGE";
pub const ENV_MAX_TOKENS: &str = "LOANSCOUT_AI_MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "LOANSCOUT_AI_TEMPERATURE";
pub const ENV_TIMEOUT_SECS: &str = "LOANSCOUT_AI_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "LOANSCOUT_AI_MAX_RETRIES";
pub const ENV_CURRENCY: &str = "LOANSCOUT_CURRENCY";
pub const ENV_OPENAI_MODEL: &str = "LOANSCOUT_OPENAI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_ANTHROPIC_MODEL: &str = "LOANSCOUT_ANTHROPIC_MODEL";
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";

const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 1;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_RETRIES: u32 = 5;

/// Key-value lookup for credentials and model identifiers.
pub trait CredentialSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment, after loading `.env` if present.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn load() -> Self {
        // Try to load .env file (ignore errors)
        let _ = dotenvy::dotenv();
        Self
    }
}

impl CredentialSource for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed map of values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Service-wide AI settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    /// Explicitly configured provider; `None` means select by credentials.
    pub provider: Option<ProviderKind>,
    pub language: LanguageContext,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub currency: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: None,
            language: LanguageContext::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl AiSettings {
    pub fn from_env() -> Self {
        Self::from_source(&EnvCredentials::load())
    }

    /// Unparseable values fall back to defaults and out-of-range ones are
    /// capped, both with a warning.
    pub fn from_source(source: &dyn CredentialSource) -> Self {
        let defaults = Self::default();
        let provider = source.get(ENV_PROVIDER).and_then(|name| {
            let kind = ProviderKind::from_name(&name);
            if kind.is_none() {
                tracing::warn!(value = %name, "unknown {}, selecting by credentials", ENV_PROVIDER);
            }
            kind
        });
        Self {
            provider,
            language: source
                .get(ENV_LANGUAGE)
                .and_then(|v| LanguageContext::from_name(&v))
                .unwrap_or(defaults.language),
            max_tokens: parse_or(source, ENV_MAX_TOKENS, defaults.max_tokens),
            temperature: parse_or(source, ENV_TEMPERATURE, defaults.temperature),
            timeout: Duration::from_secs(capped(
                ENV_TIMEOUT_SECS,
                parse_or(source, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS),
                MAX_TIMEOUT_SECS,
            )),
            max_retries: capped(
                ENV_MAX_RETRIES,
                parse_or(source, ENV_MAX_RETRIES, defaults.max_retries),
                MAX_RETRIES,
            ),
            currency: source.get(ENV_CURRENCY).unwrap_or(defaults.currency),
        }
    }
}

fn parse_or<T: std::str::FromStr>(source: &dyn CredentialSource, key: &str, default: T) -> T {
    match source.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid setting, using default");
            default
        }),
        None => default,
    }
}

fn capped<T: PartialOrd + std::fmt::Display + Copy>(key: &str, value: T, max: T) -> T {
    if value > max {
        tracing::warn!(key, %value, %max, "setting out of range, capping");
        max
    } else {
        value
    }
}

/// Working configuration of one provider instance.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ProviderConfig {
    /// Defaults for `kind`, without a credential.
    pub fn new(kind: ProviderKind) -> Self {
        let (model, base_url) = match kind {
            ProviderKind::OpenAI => ("gpt-4o-mini", "https://api.openai.com/v1"),
            ProviderKind::Anthropic => ("claude-3-5-haiku-20241022", "https://api.anthropic.com"),
            ProviderKind::Deterministic => ("keyword-heuristic", ""),
        };
        Self {
            kind,
            api_key: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Resolve the configuration for `kind` from settings plus credentials.
    pub fn resolve(kind: ProviderKind, settings: &AiSettings, source: &dyn CredentialSource) -> Self {
        let mut config = Self::new(kind);
        config.max_tokens = settings.max_tokens;
        config.temperature = settings.temperature;
        config.timeout = settings.timeout;
        config.max_retries = settings.max_retries;
        config.api_key = kind.credential_env_var().and_then(|var| source.get(var));

        let (model_var, url_var) = match kind {
            ProviderKind::OpenAI => (Some(ENV_OPENAI_MODEL), Some(ENV_OPENAI_BASE_URL)),
            ProviderKind::Anthropic => (Some(ENV_ANTHROPIC_MODEL), Some(ENV_ANTHROPIC_BASE_URL)),
            ProviderKind::Deterministic => (None, None),
        };
        if let Some(model) = model_var.and_then(|v| source.get(v)) {
            config.model = model;
        }
        if let Some(url) = url_var.and_then(|v| source.get(v)) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.kind.requires_credential()
            || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            kind: self.kind,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature_bits: self.temperature.to_bits(),
            has_credential: self.has_credential(),
        }
    }

    /// A copy with `update` applied; the original is left untouched.
    pub fn apply(&self, update: &ProviderConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(key) = &update.api_key {
            next.api_key = Some(key.clone());
        }
        if let Some(model) = &update.model {
            next.model = model.clone();
        }
        if let Some(url) = &update.base_url {
            next.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(max_tokens) = update.max_tokens {
            next.max_tokens = max_tokens;
        }
        if let Some(temperature) = update.temperature {
            next.temperature = temperature;
        }
        if let Some(timeout) = update.timeout {
            next.timeout = timeout;
        }
        if let Some(max_retries) = update.max_retries {
            next.max_retries = max_retries;
        }
        next
    }
}

/// Partial update for [`ProviderConfig`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfigUpdate {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

/// Identity of a cached provider instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    pub temperature_bits: u32,
    pub has_credential: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_source() {
        let source = StaticCredentials::new()
            .with(ENV_PROVIDER, "claude")
            .with(ENV_LANGUAGE, "en")
            .with(ENV_TIMEOUT_SECS, "5")
            .with(ENV_MAX_RETRIES, "not-a-number");
        let settings = AiSettings::from_source(&source);
        assert_eq!(settings.provider, Some(ProviderKind::Anthropic));
        assert_eq!(settings.language, LanguageContext::English);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.currency, "TRY");
    }

    #[test]
    fn test_settings_cap_out_of_range_values() {
        let source = StaticCredentials::new()
            .with(ENV_TIMEOUT_SECS, "18446744073709551615")
            .with(ENV_MAX_RETRIES, "4294967295");
        let settings = AiSettings::from_source(&source);
        assert_eq!(settings.timeout, Duration::from_secs(MAX_TIMEOUT_SECS));
        assert_eq!(settings.max_retries, MAX_RETRIES);
    }

    #[test]
    fn test_resolve_reads_credentials_and_overrides() {
        let source = StaticCredentials::new()
            .with("OPENAI_API_KEY", "sk-test")
            .with(ENV_OPENAI_MODEL, "gpt-4o")
            .with(ENV_OPENAI_BASE_URL, "http://localhost:9000/v1/");
        let config = ProviderConfig::resolve(ProviderKind::OpenAI, &AiSettings::default(), &source);
        assert!(config.has_credential());
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "http://localhost:9000/v1");

        let claude = ProviderConfig::resolve(ProviderKind::Anthropic, &AiSettings::default(), &source);
        assert!(!claude.has_credential());
        assert!(ProviderConfig::new(ProviderKind::Deterministic).has_credential());
    }

    #[test]
    fn test_cache_key_tracks_credential_presence_not_value() {
        let base = ProviderConfig::new(ProviderKind::OpenAI);
        let a = base.clone().with_api_key("sk-one");
        let b = base.clone().with_api_key("sk-two");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), base.cache_key());

        let hotter = a.apply(&ProviderConfigUpdate {
            temperature: Some(0.7),
            ..Default::default()
        });
        assert_ne!(hotter.cache_key(), a.cache_key());
        assert_eq!(a.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new(ProviderKind::OpenAI).with_api_key("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
