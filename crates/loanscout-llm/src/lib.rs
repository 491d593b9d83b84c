//! LoanScout LLM - natural-language loan query parsing
//!
//! Turns queries such as "5 milyon 48 ay konut kredisi" into a structured
//! [`ParsedQuery`] through one of three backends:
//!
//! - OpenAI chat completions (primary)
//! - Anthropic messages API (secondary, complex reasoning)
//! - Deterministic keyword heuristic (no network, always available)
//!
//! ## Key Design Principles
//!
//! 1. Callers talk to [`QueryParserService`] and never see transport errors
//! 2. A failed provider gets exactly one alternate, never a chain
//! 3. Model output is decoded leniently; garbage becomes a `PARSE_ERROR` result
//! 4. Provider instances are cached per configuration in a [`ProviderRegistry`]

pub mod config;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod heuristic;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod service;
pub mod types;

pub use config::{AiSettings, CacheKey, CredentialSource, EnvCredentials, ProviderConfig, ProviderConfigUpdate, StaticCredentials};
pub use diagnostics::{ApiKeyStatus, ConnectionStatus, DiagnosticError, Diagnostics};
pub use error::{ProviderError, ProviderErrorKind};
pub use providers::{AnthropicProvider, DeterministicProvider, OpenAIProvider, QueryParser};
pub use registry::{FallbackPair, ProviderFactory, ProviderRegistry};
pub use service::QueryParserService;
pub use types::*;
