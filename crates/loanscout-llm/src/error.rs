//! Provider error taxonomy.
//!
//! Every backend failure is mapped to a [`ProviderError`] inside the adapter, so
//! callers never see `reqwest` or backend-specific error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Authentication,
    Billing,
    RateLimit,
    ModelNotFound,
    BadRequest,
    ServerError,
    Connection,
    Unknown,
}

impl ProviderErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Billing => "BILLING_ERROR",
            Self::RateLimit => "RATE_LIMIT_ERROR",
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::ServerError => "SERVER_ERROR",
            Self::Connection => "CONNECTION_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// What an operator can do about it.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check that the API key is correct and has not been revoked.",
            Self::Billing => "Add credits or update the billing details of the provider account.",
            Self::RateLimit => "Too many requests; wait before retrying or switch to another provider.",
            Self::ModelNotFound => "Verify that the configured model name exists and is enabled for this account.",
            Self::BadRequest => "The provider rejected the request; check the model, max_tokens and temperature settings.",
            Self::ServerError => "The provider is having problems; retry later or rely on the fallback provider.",
            Self::Connection => "Check network connectivity and the provider base URL, or raise the timeout.",
            Self::Unknown => "Inspect the error message and the provider status page.",
        }
    }

    /// Network failures, timeouts and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection | Self::ServerError)
    }

    /// Maps an HTTP status (plus the response body, for the cases where the
    /// status alone is ambiguous) to a kind.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.to_lowercase();
        let mentions_billing = body.contains("insufficient_quota")
            || body.contains("credit balance")
            || body.contains("billing");
        match status {
            401 | 403 => Self::Authentication,
            402 => Self::Billing,
            429 if mentions_billing => Self::Billing,
            429 => Self::RateLimit,
            400 if mentions_billing => Self::Billing,
            400 if body.contains("model")
                && (body.contains("not found") || body.contains("does not exist")) =>
            {
                Self::ModelNotFound
            }
            404 => Self::ModelNotFound,
            400 | 413 | 422 => Self::BadRequest,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A failed call to a provider backend.
#[derive(Error, Debug, Clone)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    pub provider: ProviderKind,
    pub kind: ProviderErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(provider: ProviderKind, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn from_status(provider: ProviderKind, status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(300).collect();
        Self {
            provider,
            kind: ProviderErrorKind::from_status(status, body),
            message: format!("HTTP {}: {}", status, snippet),
            status: Some(status),
        }
    }

    pub fn from_reqwest(provider: ProviderKind, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(provider, status.as_u16(), &err.to_string());
        }
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            ProviderErrorKind::Connection
        } else {
            ProviderErrorKind::Unknown
        };
        Self::new(provider, kind, err.to_string())
    }

    pub fn missing_credential(provider: ProviderKind) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Authentication,
            format!("no API key configured ({})", provider.credential_env_var().unwrap_or("-")),
        )
    }

    pub fn timeout(provider: ProviderKind, after: std::time::Duration) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Connection,
            format!("timed out after {:.1}s", after.as_secs_f64()),
        )
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn suggestion(&self) -> &'static str {
        self.kind.suggestion()
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
