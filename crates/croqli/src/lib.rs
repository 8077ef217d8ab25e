//! Core library for the croqli terminal assistant.
//!
//! `croqli` talks to an OpenAI-compatible chat completions endpoint (Groq by
//! default) and keeps a user-curated set of system prompts, one of which is
//! sent as the system message for every chat turn.
//!
//! # Where to find things
//!
//! - **System prompts:** [`PromptEngine`](prompts::PromptEngine) owns the
//!   ordered collection (pinned prompts first, then the user's list order) and
//!   writes every change through a [`PromptStore`](prompts::PromptStore).
//!   [`JsonFileStore`](prompts::JsonFileStore) is the on-disk store.
//!
//! - **Chat completions:** [`ChatClient`] with [`ChatRequest`] / [`Message`].
//!   Transient failures are retried by [`ChatClient::chat_with_retry`] using
//!   [`RetryConfig`](api::RetryConfig).
//!
//! - **Web search:** [`search::SearchClient`] for the Tavily API.
//!
//! - **Shell assistance:** [`shell`] detects the user's shell and OS, runs
//!   commands with a blocked-command guard, and searches shell history files.
//!
//! - **Log capture:** [`logging::LogCaptureLayer`] buffers tracing output so an
//!   interactive front end can print it between prompts.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`prompts`] | Prompt records, ordering engine, persistence, built-in prompts |
//! | [`api`] | Known-model limits, retry with backoff |
//! | [`search`] | Tavily web search client and result formatting |
//! | [`shell`] | Shell/OS detection, command execution, history, assistant prompt |
//! | [`logging`] | Tracing layer that buffers log lines |
//! | [`prompt`] | Section builder for generated system prompts |

pub mod api;
pub mod logging;
pub mod prompt;
pub mod prompts;
pub mod search;
pub mod shell;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use api::retry::{RetryConfig, retry};

pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model for chat and command assistance.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TOP_P: f32 = 1.0;

// ── Schema generation ──────────────────────────────────────────────

/// JSON Schema of `T` as a `serde_json::Value`, for embedding in prompts that
/// ask the model for structured output.
///
/// ```
/// use croqli::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Reply {
///     command: String,
/// }
///
/// let schema = json_schema_for::<Reply>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"command".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Sampling settings shared by every request of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl ChatRequest {
    pub fn new(params: &GenerationParams, messages: Vec<Message>) -> Self {
        Self {
            model: params.model.clone(),
            messages,
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
            top_p: Some(params.top_p),
            response_format: None,
        }
    }

    /// Ask for a JSON object response.
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat::json_object());
        self
    }
}

/// Output format constraint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            fmt_type: "json_object".to_string(),
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Result of [`ChatClient::chat`].
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// The response text, or an error if the model returned none.
    pub fn text(self) -> Result<String, String> {
        self.content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| "empty response from model".to_string())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    /// Client for the default Groq endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_endpoint(api_key, GROQ_URL)
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("croqli/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={:?}, temp={:?}, json={}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
            body.response_format.is_some(),
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("Groq API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;
        if let Some(err) = parsed.error {
            return Err(format!("Groq API error: {}", err.message));
        }
        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let choice = parsed.choices.and_then(|c| c.into_iter().next());
        if choice.is_none() {
            debug!("LLM output: empty (no choices)");
        }
        Ok(ChatCompletion {
            content: choice.as_ref().and_then(|c| c.message.content.clone()),
            finish_reason: choice.and_then(|c| c.finish_reason),
            usage: parsed.usage,
        })
    }

    /// [`chat`](Self::chat), retrying transient failures.
    pub async fn chat_with_retry(
        &self,
        body: &ChatRequest,
        config: &RetryConfig,
    ) -> Result<ChatCompletion, String> {
        retry(config, "chat completion", || self.chat(body)).await
    }
}
