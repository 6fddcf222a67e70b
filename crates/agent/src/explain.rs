//! Short natural-language justifications for recommended products.

use async_trait::async_trait;
use tracing::warn;

use advisor_core::hybrid::ExplanationWriter;

use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You write one short, friendly sentence explaining why a laptop fits \
    a user's needs. Return a JSON object of the form {\"summary\": \"...\"}.";

pub struct GroqExplanationWriter<C> {
    client: C,
}

impl<C: LlmClient> GroqExplanationWriter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LlmClient> ExplanationWriter for GroqExplanationWriter<C> {
    /// Degrades instead of failing: on any error the raw reasons are joined
    /// into a valid sentence that embeds the failure.
    async fn summarize(&self, name: &str, reasons: &[String], use_case: &str) -> String {
        let user_prompt = format!(
            "Laptop: {name}. Intended use: {use_case}. Scoring notes: {}.",
            reasons.join("; ")
        );

        match self.client.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(content) => serde_json::from_str::<serde_json::Value>(&content)
                .ok()
                .and_then(|v| v.get("summary").and_then(|s| s.as_str().map(str::to_string)))
                .unwrap_or(content),
            Err(error) => {
                warn!(event_name = "agent.explain.degraded", error = %error,
                    "explanation fell back to raw reasons");
                format!(
                    "{name}: {} (explanation service unavailable: {error})",
                    reasons.join("; ")
                )
            }
        }
    }
}
