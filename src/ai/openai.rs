use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::AiHandler;
use super::types::{ChatResponse, FinishReason, Usage};
use crate::config::loader::get_settings;
use crate::error::ReviewTaskError;

/// OpenAI-compatible chat completions handler.
///
/// Works with any provider exposing the `/v1/chat/completions` API.
pub struct OpenAiCompatibleHandler {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatibleHandler {
    /// Create a new handler from the current settings.
    pub fn from_settings() -> Result<Self, ReviewTaskError> {
        let settings = get_settings();
        let api_base = if settings.openai.api_base.is_empty() {
            "https://api.openai.com/v1".to_string()
        } else {
            settings.openai.api_base.clone()
        };
        let timeout_secs = settings.config.ai_timeout as u64;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(ReviewTaskError::Http)?;

        Ok(Self::new(client, api_base, settings.openai.key.clone()))
    }

    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Build the request body for the chat completions API.
    fn build_request_body(
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> serde_json::Value {
        json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": max_tokens,
        })
    }
}

#[async_trait]
impl AiHandler for OpenAiCompatibleHandler {
    async fn chat_completion(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResponse, ReviewTaskError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = Self::build_request_body(model, system, user, max_tokens);

        let mut req = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let resp = req.send().await.map_err(ReviewTaskError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ReviewTaskError::AiHandler(format!(
                "API returned {status}: {body_text}"
            )));
        }

        let api_resp: ApiResponse = resp.json().await.map_err(ReviewTaskError::Http)?;

        // An empty choices array or a null content field is "no feedback
        // text", not an error.
        let (content, finish_reason) = match api_resp.choices.into_iter().next() {
            Some(choice) => (
                choice.message.content.unwrap_or_default(),
                choice
                    .finish_reason
                    .as_deref()
                    .map(FinishReason::from)
                    .unwrap_or_default(),
            ),
            None => (String::new(), FinishReason::default()),
        };

        let usage = api_resp.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

// ── API response types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
