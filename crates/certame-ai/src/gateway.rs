//! Stateless gateway to the external text-generation service.
//!
//! One payload in, one response out. The gateway does not interpret the
//! content and does not retry; both are the orchestrator's job.

use std::time::Duration;

use async_trait::async_trait;
use certame_core::PromptPayload;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://api.cohere.com";
pub const DEFAULT_MODEL: &str = "command-r7b-12-2024";

pub const API_KEY_VAR: &str = "COHERE_API_KEY";
pub const ENDPOINT_VAR: &str = "COHERE_BASE_URL";
pub const MODEL_VAR: &str = "CERTAME_MODEL";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("model service credential is not configured (set {0})")]
    MissingCredential(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether resubmitting the same payload may succeed.
    ///
    /// Connection failures, timeouts, rate limiting and server-side errors
    /// qualify; authentication and request errors do not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Server { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::MissingCredential(_) | Self::Decode(_) => false,
        }
    }
}

/// What the service sent back. `content` is `None` when the reply carried no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse {
    pub content: Option<String>,
    pub model: String,
    pub tokens_used: Option<u32>,
}

/// A single round trip to a text-generation capability.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    async fn generate(&self, payload: &PromptPayload) -> Result<RawModelResponse, GatewayError>;
}

/// Endpoint, credential and model identifier, resolved once at startup.
#[derive(Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Transport timeout; `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    /// Read `COHERE_API_KEY` (required), `COHERE_BASE_URL` and `CERTAME_MODEL`.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(GatewayError::MissingCredential(API_KEY_VAR))?;
        let mut config = Self::new(api_key);
        if let Some(endpoint) = non_empty(ENDPOINT_VAR) {
            config.endpoint = endpoint;
        }
        if let Some(model) = non_empty(MODEL_VAR) {
            config.model = model;
        }
        Ok(config)
    }
}

// ── Cohere v2 chat wire types ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<AssistantMessage>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    tokens: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct TokenUsage {
    input_tokens: Option<f64>,
    output_tokens: Option<f64>,
}

/// HTTP gateway for Cohere's `/v2/chat` endpoint.
pub struct CohereGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl CohereGateway {
    pub fn new(mut config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.api_key.trim().is_empty() {
            return Err(GatewayError::MissingCredential(API_KEY_VAR));
        }
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LanguageModelGateway for CohereGateway {
    async fn generate(&self, payload: &PromptPayload) -> Result<RawModelResponse, GatewayError> {
        let url = format!("{}/v2/chat", self.config.endpoint);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &payload.rendered_text,
            }],
            temperature: payload.temperature,
        };

        info!(
            url = %url,
            model = %self.config.model,
            mode = %payload.mode,
            "calling text-generation service"
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| GatewayError::Decode(e.to_string()))?;

        let texts: Vec<String> = parsed
            .message
            .map(|m| m.content)
            .unwrap_or_default()
            .into_iter()
            .filter(|part| part.kind.as_deref().is_none_or(|k| k == "text"))
            .filter_map(|part| part.text)
            .collect();
        let content = if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        };

        let tokens_used = parsed.usage.and_then(|u| u.tokens).map(|t| {
            (t.input_tokens.unwrap_or(0.0) + t.output_tokens.unwrap_or(0.0)) as u32
        });

        debug!(
            chars = content.as_deref().map_or(0, |c| c.chars().count()),
            tokens_used, "received model response"
        );
        Ok(RawModelResponse {
            content,
            model: self.config.model.clone(),
            tokens_used,
        })
    }
}
