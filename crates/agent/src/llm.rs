use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use advisor_core::config::LlmConfig;

/// Chat-completion collaborator. Implementations must carry their own bounded
/// timeout; callers treat any error as an empty/degraded result, never retry.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Client for Groq's OpenAI-compatible chat-completions endpoint.
pub struct GroqClient {
    http: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
}

impl GroqClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building llm http client")?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("llm api key not configured"))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let body = ChatRequest {
            model: &self.config.model,
            temperature: 0.4,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("llm request failed")?
            .error_for_status()
            .context("llm returned an error status")?;

        let payload: Value = response.json().await.context("llm response was not json")?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("llm response missing message content"))?;

        Ok(strip_code_fences(content).to_string())
    }
}

/// Models occasionally wrap JSON replies in markdown fences despite the
/// response_format hint.
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
