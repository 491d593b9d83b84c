//! Query parser implementations

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, ProviderConfigUpdate};
use crate::decode::decode_response;
use crate::diagnostics::{ApiKeyStatus, Diagnostics, ProbeState};
use crate::error::{ProviderError, ProviderErrorKind, Result};
use crate::heuristic::parse_keywords;
use crate::prompt::{user_prompt, PROBE_QUERY, SYSTEM_PROMPT};
use crate::types::{ParsedQuery, ProviderKind};

/// A backend that turns free text into a [`ParsedQuery`].
#[async_trait]
pub trait QueryParser: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Snapshot of the working configuration.
    fn config(&self) -> Arc<ProviderConfig>;

    /// Swap in a new configuration. Calls already in flight keep their snapshot.
    fn update_config(&self, update: ProviderConfigUpdate);

    fn has_credential(&self) -> bool {
        self.config().has_credential()
    }

    /// Parse a query. Undecodable output is an `Ok` result tagged `PARSE_ERROR`.
    async fn parse_query(&self, text: &str) -> Result<ParsedQuery>;

    /// Run a canned query and record the outcome for [`QueryParser::diagnostics`].
    async fn test_connectivity(&self) -> bool;

    async fn diagnostics(&self) -> Diagnostics;
}

/// Wire protocol of one chat backend.
#[async_trait]
pub trait ChatBackend: Send + Sync + Default + 'static {
    const KIND: ProviderKind;

    /// Send one request and return the raw assistant text.
    async fn complete(
        &self,
        client: &reqwest::Client,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<String>;
}

/// Retry `op` on transient errors, at most `max_retries` extra attempts.
pub async fn with_retries<T, F, Fut>(kind: ProviderKind, max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay = backoff(attempt);
                tracing::warn!(provider = %kind, attempt, error = %e, "transient failure, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 250ms doubling per attempt, capped at 8s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(250u64 << attempt.saturating_sub(1).min(5))
}

async fn check_status(kind: ProviderKind, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(kind, status.as_u16(), &body))
}

// ============================================================================
// HTTP Provider
// ============================================================================

/// LLM-backed parser: prompt, HTTP call, lenient decode.
pub struct HttpProvider<B: ChatBackend> {
    config: RwLock<Arc<ProviderConfig>>,
    probe: Mutex<ProbeState>,
    client: reqwest::Client,
    backend: B,
}

pub type OpenAIProvider = HttpProvider<OpenAIChat>;
pub type AnthropicProvider = HttpProvider<AnthropicMessages>;

impl<B: ChatBackend> HttpProvider<B> {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(ProviderConfig { kind: B::KIND, ..config })),
            probe: Mutex::new(ProbeState::default()),
            client: reqwest::Client::new(),
            backend: B::default(),
        }
    }

    fn key_status(config: &ProviderConfig) -> ApiKeyStatus {
        ApiKeyStatus::check(B::KIND, config.api_key.as_deref())
    }
}

#[async_trait]
impl<B: ChatBackend> QueryParser for HttpProvider<B> {
    fn kind(&self) -> ProviderKind {
        B::KIND
    }

    fn config(&self) -> Arc<ProviderConfig> {
        self.config.read().clone()
    }

    fn update_config(&self, update: ProviderConfigUpdate) {
        let mut config = self.config.write();
        let next = config.apply(&update);
        if next.api_key != config.api_key || next.base_url != config.base_url {
            *self.probe.lock() = ProbeState::default();
        }
        *config = Arc::new(next);
    }

    async fn parse_query(&self, text: &str) -> Result<ParsedQuery> {
        let config = self.config();
        if !config.has_credential() {
            return Err(ProviderError::missing_credential(B::KIND));
        }
        let started = Instant::now();
        let (backend, client, cfg) = (&self.backend, &self.client, &*config);
        let raw = with_retries(B::KIND, config.max_retries, move || {
            backend.complete(client, cfg, text)
        })
        .await?;
        tracing::debug!(provider = %B::KIND, model = %config.model, chars = raw.len(), "provider responded");
        Ok(decode_response(B::KIND, &raw).with_latency(started))
    }

    async fn test_connectivity(&self) -> bool {
        let config = self.config();
        if Self::key_status(&config) != ApiKeyStatus::Configured {
            return false;
        }
        let probe = match self.parse_query(PROBE_QUERY).await {
            Ok(parsed) if parsed.is_parse_error() => ProbeState::failed(ProviderError::new(
                B::KIND,
                ProviderErrorKind::Unknown,
                parsed.reasoning,
            )),
            Ok(_) => ProbeState::succeeded(),
            Err(e) => ProbeState::failed(e),
        };
        let ok = probe.error.is_none();
        tracing::info!(provider = %B::KIND, ok, "connectivity probe finished");
        *self.probe.lock() = probe;
        ok
    }

    async fn diagnostics(&self) -> Diagnostics {
        let config = self.config();
        let status = Self::key_status(&config);
        let diagnostics = Diagnostics::new(B::KIND, config.model.clone(), status);
        if status != ApiKeyStatus::Configured {
            return diagnostics;
        }
        let probe = self.probe.lock().clone();
        diagnostics.with_probe(&probe)
    }
}

// ============================================================================
// OpenAI
// ============================================================================

#[derive(Debug, Default)]
pub struct OpenAIChat;

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAIChoiceMessage {
    content: Option<String>,
}

impl OpenAIChat {
    fn request<'a>(config: &'a ProviderConfig, prompt: &'a str) -> OpenAIChatRequest<'a> {
        OpenAIChatRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: serde_json::json!({"type": "json_object"}),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIChat {
    const KIND: ProviderKind = ProviderKind::OpenAI;

    async fn complete(
        &self,
        client: &reqwest::Client,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<String> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::missing_credential(Self::KIND))?;
        let prompt = user_prompt(query);

        let response = client
            .post(format!("{}/chat/completions", config.base_url))
            .bearer_auth(api_key)
            .timeout(config.timeout)
            .json(&Self::request(config, &prompt))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(Self::KIND, &e))?;
        let response = check_status(Self::KIND, response).await?;

        let chat: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(Self::KIND, ProviderErrorKind::Unknown, e.to_string()))?;
        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ============================================================================
// Anthropic
// ============================================================================

/// Messages API with a `{` assistant prefill, which keeps the model from
/// prefacing the JSON with prose.
#[derive(Debug, Default)]
pub struct AnthropicMessages;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PREFILL: &str = "{";

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

impl AnthropicMessages {
    fn request<'a>(config: &'a ProviderConfig, prompt: &'a str) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
                ChatMessage {
                    role: "assistant",
                    content: PREFILL,
                },
            ],
        }
    }
}

/// The reply continues after the prefill, so put the brace back.
fn restore_prefill(text: &str) -> String {
    if text.trim_start().starts_with(PREFILL) {
        text.to_string()
    } else {
        format!("{}{}", PREFILL, text)
    }
}

#[async_trait]
impl ChatBackend for AnthropicMessages {
    const KIND: ProviderKind = ProviderKind::Anthropic;

    async fn complete(
        &self,
        client: &reqwest::Client,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<String> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::missing_credential(Self::KIND))?;
        let prompt = user_prompt(query);

        let response = client
            .post(format!("{}/v1/messages", config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(config.timeout)
            .json(&Self::request(config, &prompt))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(Self::KIND, &e))?;
        let response = check_status(Self::KIND, response).await?;

        let message: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(Self::KIND, ProviderErrorKind::Unknown, e.to_string()))?;
        let text: String = message.content.into_iter().map(|c| c.text).collect();
        Ok(restore_prefill(&text))
    }
}

// ============================================================================
// Deterministic Provider (Fallback)
// ============================================================================

/// Keyword heuristic. No network, always available.
pub struct DeterministicProvider {
    config: RwLock<Arc<ProviderConfig>>,
}

impl DeterministicProvider {
    pub fn new() -> Self {
        Self::with_config(ProviderConfig::new(ProviderKind::Deterministic))
    }

    pub fn with_config(config: ProviderConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(ProviderConfig {
                kind: ProviderKind::Deterministic,
                ..config
            })),
        }
    }
}

impl Default for DeterministicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryParser for DeterministicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Deterministic
    }

    fn config(&self) -> Arc<ProviderConfig> {
        self.config.read().clone()
    }

    fn update_config(&self, update: ProviderConfigUpdate) {
        let mut config = self.config.write();
        *config = Arc::new(config.apply(&update));
    }

    fn has_credential(&self) -> bool {
        true
    }

    async fn parse_query(&self, text: &str) -> Result<ParsedQuery> {
        let started = Instant::now();
        Ok(parse_keywords(text).with_latency(started))
    }

    async fn test_connectivity(&self) -> bool {
        true
    }

    async fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(ProviderKind::Deterministic, self.config().model.clone(), ApiKeyStatus::Configured)
            .with_probe(&ProbeState::succeeded())
    }
}
