//! Common types for query parsing

use loanscout_domain::LoanType;
use serde::{Deserialize, Serialize};

/// Provider tag used when a backend answered with something that is not the
/// expected JSON.
pub const PARSE_ERROR_TAG: &str = "PARSE_ERROR";

/// Provider tag used when the active provider and its single fallback both failed.
pub const ALL_PROVIDERS_FAILED_TAG: &str = "ALL_PROVIDERS_FAILED";

/// Provider kind for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat completions (primary)
    OpenAI,
    /// Anthropic messages API (secondary, complex reasoning)
    Anthropic,
    /// Keyword heuristic, no network
    Deterministic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAI, Self::Anthropic, Self::Deterministic];

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" | "primary" => Some(Self::OpenAI),
            "anthropic" | "claude" | "secondary" => Some(Self::Anthropic),
            "deterministic" | "none" | "fallback" | "local" | "keyword" => Some(Self::Deterministic),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic Claude",
            Self::Deterministic => "Deterministic",
        }
    }

    /// Environment variable holding the API key, if this kind needs one.
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Deterministic => None,
        }
    }

    pub fn requires_credential(&self) -> bool {
        self.credential_env_var().is_some()
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Deterministic => write!(f, "deterministic"),
        }
    }
}

/// Language context used to pick a provider pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageContext {
    #[default]
    Turkish,
    English,
    /// Long or ambiguous queries that benefit from the stronger reasoning backend.
    Complex,
}

impl LanguageContext {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tr" | "turkish" | "türkçe" | "turkce" => Some(Self::Turkish),
            "en" | "english" => Some(Self::English),
            "complex" | "reasoning" => Some(Self::Complex),
            _ => None,
        }
    }
}

/// Source phrases the provider based each field on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPhrases {
    pub amount: Option<String>,
    pub term: Option<String>,
    #[serde(rename = "type")]
    pub credit_type: Option<String>,
}

/// Structured interpretation of a free-text loan query.
///
/// Every field is always serialized, `null` included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub credit_type: Option<LoanType>,
    pub amount: Option<f64>,
    /// Term in months.
    pub term: Option<u32>,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
    pub extracted_phrases: ExtractedPhrases,
    pub uncertainties: Vec<String>,
    pub is_loan_query: bool,
    /// Provider that produced the answer, or one of the failure tags.
    pub provider: String,
    pub latency_ms: u64,
}

impl ParsedQuery {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            credit_type: None,
            amount: None,
            term: None,
            confidence: 0.0,
            reasoning: String::new(),
            extracted_phrases: ExtractedPhrases::default(),
            uncertainties: vec![],
            is_loan_query: false,
            provider: provider.to_string(),
            latency_ms: 0,
        }
    }

    /// Terminal low-confidence result for a response that could not be decoded.
    pub fn parse_error(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            reasoning: format!("Could not decode provider response: {}", reason),
            uncertainties: vec![reason],
            provider: PARSE_ERROR_TAG.to_string(),
            ..Self::new(ProviderKind::Deterministic)
        }
    }

    /// Confidence-0 result returned when every attempted provider failed.
    pub fn all_failed(reasons: Vec<String>) -> Self {
        Self {
            reasoning: format!("All providers failed: {}", reasons.join("; ")),
            uncertainties: reasons,
            provider: ALL_PROVIDERS_FAILED_TAG.to_string(),
            ..Self::new(ProviderKind::Deterministic)
        }
    }

    pub fn is_parse_error(&self) -> bool {
        self.provider == PARSE_ERROR_TAG
    }

    pub fn is_failure(&self) -> bool {
        self.is_parse_error() || self.provider == ALL_PROVIDERS_FAILED_TAG
    }

    /// Names of the fields a search needs that are still missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.credit_type.is_none() {
            missing.push("type");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.term.is_none() {
            missing.push("term");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub(crate) fn with_latency(mut self, started: std::time::Instant) -> Self {
        self.latency_ms = started.elapsed().as_millis() as u64;
        self
    }
}

/// Per-call overrides for [`crate::service::QueryParserService::parse_query_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Use this provider regardless of the current selection.
    pub provider: Option<ProviderKind>,
    /// Pick the provider pair for this context instead of the configured one.
    pub context: Option<LanguageContext>,
}

impl ParseOptions {
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_context(mut self, context: LanguageContext) -> Self {
        self.context = Some(context);
        self
    }
}
