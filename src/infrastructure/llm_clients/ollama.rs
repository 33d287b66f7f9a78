use super::{classify_transport_error, endpoint_url, LLMClient, LlmResult};
use crate::domain::error::TranslationError;
use crate::domain::llm_config::{ConnectionTarget, GenerationOptions, LlmTimeouts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CHAT_PATH: &str = "/api/chat";

const HEALTH_CHECK_PROMPT: &str = "Reply with the single word OK.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Chat client for an Ollama-compatible server.
pub struct OllamaClient {
    client: reqwest::Client,
    options: GenerationOptions,
    timeouts: LlmTimeouts,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self::with_settings(GenerationOptions::default(), LlmTimeouts::default())
    }

    pub fn with_settings(options: GenerationOptions, timeouts: LlmTimeouts) -> Self {
        Self {
            client: reqwest::Client::new(),
            options,
            timeouts,
        }
    }

    async fn chat(
        &self,
        target: &ConnectionTarget,
        system: &str,
        user: &str,
        timeout: Duration,
    ) -> LlmResult<String> {
        let url = endpoint_url(&target.host, target.port, CHAT_PATH)?;

        let body = ChatRequest {
            model: &target.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: self.options,
        };

        debug!(url = %url, model = %target.model, "Sending chat request");

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::HttpError(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        parse_chat_response(&text)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(
        &self,
        target: &ConnectionTarget,
        system: &str,
        user: &str,
    ) -> LlmResult<String> {
        self.chat(target, system, user, self.timeouts.translate).await
    }

    async fn health_check(&self, target: &ConnectionTarget) -> LlmResult<String> {
        self.chat(
            target,
            "You are a connectivity check.",
            HEALTH_CHECK_PROMPT,
            self.timeouts.health_check,
        )
        .await
    }
}

fn parse_chat_response(body: &str) -> LlmResult<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| TranslationError::ParseError(e.to_string()))?;

    let message = parsed
        .message
        .ok_or_else(|| TranslationError::ParseError("missing `message` field".to_string()))?;

    if message.content.trim().is_empty() {
        return Err(TranslationError::EmptyResponse);
    }

    Ok(message.content)
}
