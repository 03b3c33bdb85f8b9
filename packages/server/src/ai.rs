//! Outbound AI question answering.
//!
//! The session layer talks to the [`AiProvider`] trait; the concrete
//! implementation posts to an OpenRouter-compatible chat-completions API.
//! Every failure mode a user can hit has its own variant so the session can
//! report a distinguishable cause.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_RATE_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    /// AI requests allowed per user per minute.
    pub rate_limit: u32,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl AiConfig {
    /// Read the AI configuration from the environment.
    pub fn from_env() -> Self {
        let enabled = std::env::var("AI_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);
        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| "openai/gpt-4o".to_string());
        let rate_limit = std::env::var("AI_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT);
        let timeout_secs = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_tokens = std::env::var("AI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        if enabled && api_key.is_empty() {
            error!("AI_ENABLED is set but OPENROUTER_API_KEY is not");
        }

        info!(
            enabled,
            model,
            rate_limit,
            timeout_secs,
            max_tokens,
            has_api_key = !api_key.is_empty(),
            "AI configuration loaded"
        );

        Self {
            enabled,
            api_key,
            model,
            rate_limit,
            timeout_secs,
            max_tokens,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: String::new(),
            rate_limit: DEFAULT_RATE_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI is not enabled on this server.")]
    Disabled,
    #[error("AI request timed out after {0} seconds.")]
    Timeout(u64),
    #[error("AI service is temporarily unavailable.")]
    Unavailable,
    #[error("AI service error: {0}")]
    Upstream(u16),
    #[error("Could not parse the AI response.")]
    InvalidResponse,
}

/// A successful answer, with latency and optional usage figures.
#[derive(Debug, Clone)]
pub struct AiAnswer {
    pub content: String,
    pub response_ms: u64,
    pub tokens: Option<u32>,
    pub cost: Option<f64>,
}

/// The outbound question-answering capability as the session layer sees it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn is_enabled(&self) -> bool;
    /// Configured model name, when the feature is enabled.
    fn model(&self) -> Option<String>;
    async fn ask(&self, prompt: &str) -> Result<AiAnswer, AiError>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatTurn>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatTurn {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
    cost: Option<f64>,
}

/// OpenRouter-backed [`AiProvider`].
pub struct OpenRouterClient {
    config: AiConfig,
    http: Client,
}

impl OpenRouterClient {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.api_key.is_empty()
    }

    fn model(&self) -> Option<String> {
        self.is_enabled().then(|| self.config.model.clone())
    }

    async fn ask(&self, prompt: &str) -> Result<AiAnswer, AiError> {
        if !self.is_enabled() {
            return Err(AiError::Disabled);
        }

        debug!(prompt_len = prompt.len(), "sending AI request");

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatTurn {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                error!(?err, "AI request failed");
                if err.is_timeout() {
                    AiError::Timeout(self.config.timeout_secs)
                } else {
                    AiError::Unavailable
                }
            })?;
        let response_ms = start.elapsed().as_millis() as u64;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "AI upstream error response");
            return Err(AiError::Upstream(status.as_u16()));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|err| {
            error!(?err, "failed to parse AI response");
            AiError::InvalidResponse
        })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(AiError::InvalidResponse)?;
        let tokens = chat_response.usage.as_ref().and_then(|u| u.total_tokens);
        let cost = chat_response.usage.as_ref().and_then(|u| u.cost);

        debug!(
            response_len = content.len(),
            response_ms,
            ?tokens,
            ?cost,
            "AI response received"
        );

        Ok(AiAnswer {
            content,
            response_ms,
            tokens,
            cost,
        })
    }
}
