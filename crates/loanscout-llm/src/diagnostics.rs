//! Provider health reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Missing,
    InvalidFormat,
    Configured,
}

impl ApiKeyStatus {
    /// Presence plus prefix check. The deterministic provider needs no key
    /// and is always `Configured`.
    pub fn check(kind: ProviderKind, api_key: Option<&str>) -> Self {
        let prefix = match kind {
            ProviderKind::OpenAI => "sk-",
            ProviderKind::Anthropic => "sk-ant-",
            ProviderKind::Deterministic => return Self::Configured,
        };
        match api_key.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(key) if !key.starts_with(prefix) => Self::InvalidFormat,
            Some(_) => Self::Configured,
        }
    }
}

/// Outcome of the most recent connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    NotTested,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticError {
    pub kind: ProviderErrorKind,
    pub code: String,
    pub message: String,
}

impl From<&ProviderError> for DiagnosticError {
    fn from(err: &ProviderError) -> Self {
        Self {
            kind: err.kind,
            code: err.code().to_string(),
            message: err.message.clone(),
        }
    }
}

/// Snapshot of a provider's configuration and reachability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key_status: ApiKeyStatus,
    pub connection_status: ConnectionStatus,
    pub error: Option<DiagnosticError>,
    pub suggestions: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl Diagnostics {
    pub fn new(provider: ProviderKind, model: impl Into<String>, api_key_status: ApiKeyStatus) -> Self {
        let mut diagnostics = Self {
            provider,
            model: model.into(),
            api_key_status,
            connection_status: ConnectionStatus::NotTested,
            error: None,
            suggestions: vec![],
            checked_at: Utc::now(),
        };
        match api_key_status {
            ApiKeyStatus::Missing => diagnostics.suggestions.push(format!(
                "Set {} to enable {}.",
                provider.credential_env_var().unwrap_or("an API key"),
                provider.display_name()
            )),
            ApiKeyStatus::InvalidFormat => diagnostics.suggestions.push(format!(
                "The {} key does not look valid; {} keys start with '{}'.",
                provider.credential_env_var().unwrap_or("API"),
                provider.display_name(),
                if provider == ProviderKind::Anthropic { "sk-ant-" } else { "sk-" }
            )),
            ApiKeyStatus::Configured => {}
        }
        diagnostics
    }

    pub fn with_probe(mut self, probe: &ProbeState) -> Self {
        self.connection_status = probe.status;
        if let Some(err) = &probe.error {
            self.suggestions.push(err.suggestion().to_string());
            self.error = Some(DiagnosticError::from(err));
        }
        if let Some(at) = probe.at {
            self.checked_at = at;
        }
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.api_key_status == ApiKeyStatus::Configured
            && self.connection_status == ConnectionStatus::Success
    }
}

/// Last connectivity probe held by an adapter.
#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    pub status: ConnectionStatus,
    pub error: Option<ProviderError>,
    pub at: Option<DateTime<Utc>>,
}

impl ProbeState {
    pub fn succeeded() -> Self {
        Self {
            status: ConnectionStatus::Success,
            error: None,
            at: Some(Utc::now()),
        }
    }

    pub fn failed(error: ProviderError) -> Self {
        Self {
            status: ConnectionStatus::Failed,
            error: Some(error),
            at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_status() {
        use ApiKeyStatus::*;
        assert_eq!(ApiKeyStatus::check(ProviderKind::OpenAI, None), Missing);
        assert_eq!(ApiKeyStatus::check(ProviderKind::OpenAI, Some("  ")), Missing);
        assert_eq!(ApiKeyStatus::check(ProviderKind::OpenAI, Some("abc")), InvalidFormat);
        assert_eq!(ApiKeyStatus::check(ProviderKind::OpenAI, Some("sk-proj-1")), Configured);
        assert_eq!(ApiKeyStatus::check(ProviderKind::Anthropic, Some("sk-1")), InvalidFormat);
        assert_eq!(ApiKeyStatus::check(ProviderKind::Anthropic, Some("sk-ant-1")), Configured);
        assert_eq!(ApiKeyStatus::check(ProviderKind::Deterministic, None), Configured);
    }

    #[test]
    fn test_failed_probe_carries_error_and_suggestion() {
        let err = ProviderError::from_status(ProviderKind::OpenAI, 429, "rate limited");
        let diagnostics = Diagnostics::new(ProviderKind::OpenAI, "gpt-4o-mini", ApiKeyStatus::Configured)
            .with_probe(&ProbeState::failed(err));
        assert_eq!(diagnostics.connection_status, ConnectionStatus::Failed);
        assert_eq!(diagnostics.error.as_ref().unwrap().code, "RATE_LIMIT_ERROR");
        assert_eq!(diagnostics.suggestions.len(), 1);
        assert!(!diagnostics.is_healthy());
    }

    #[test]
    fn test_serialized_status_names() {
        let diagnostics = Diagnostics::new(ProviderKind::Anthropic, "m", ApiKeyStatus::InvalidFormat);
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["api_key_status"], "invalid_format");
        assert_eq!(json["connection_status"], "not_tested");
    }
}
