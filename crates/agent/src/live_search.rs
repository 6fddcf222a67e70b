//! Live candidate search through the text-generation collaborator.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use advisor_core::domain::product::Product;
use advisor_core::domain::query::Preferences;
use advisor_core::hybrid::LiveSearch;
use advisor_core::normalize::{extract_description, normalize_product};

use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are a technology expert. Return a JSON object with a list named \
    'laptops' or 'productos', whose items contain: brand, name, cpu, gpu, ram, storage, os, \
    price (number), url, and a natural-language description explaining why the machine is \
    recommendable, what kind of user or task it suits, and its main advantages.";

pub struct GroqLiveSearch<C> {
    client: C,
    max_results: usize,
}

impl<C: LlmClient> GroqLiveSearch<C> {
    pub fn new(client: C, max_results: usize) -> Self {
        Self { client, max_results }
    }
}

#[async_trait]
impl<C: LlmClient> LiveSearch for GroqLiveSearch<C> {
    /// Empty on any failure: missing credential, transport error, or a
    /// response that does not parse. The caller falls back to the local
    /// engine without seeing the error.
    async fn search(
        &self,
        use_case: &str,
        budget: f64,
        preferences: Option<&Preferences>,
    ) -> Vec<(Product, Option<String>)> {
        let prefs_text = preferences
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_else(|| "{}".to_string());
        let user_prompt = format!(
            "I need laptops for {use_case}, with a maximum budget of {budget} USD. \
             Additional preferences: {prefs_text}. Return only the requested JSON."
        );

        let content = match self.client.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(content) => content,
            Err(error) => {
                warn!(event_name = "agent.live_search.unavailable", error = %error,
                    "live search degraded to local catalog");
                return Vec::new();
            }
        };

        let products = parse_candidates(&content, self.max_results);
        debug!(
            event_name = "agent.live_search.parsed",
            count = products.len(),
            "live search response parsed"
        );
        products
    }
}

/// Accepts `{"laptops": [...]}` / `{"productos": [...]}`, a bare array, or a
/// single object. Anything else reads as no candidates.
pub(crate) fn parse_candidates(content: &str, max_results: usize) -> Vec<(Product, Option<String>)> {
    let Ok(parsed) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };

    let items: Vec<Value> = match parsed {
        Value::Array(items) => items,
        Value::Object(ref map) => {
            if let Some(Value::Array(items)) =
                ["laptops", "productos"].iter().find_map(|key| map.get(*key))
            {
                items.clone()
            } else {
                vec![parsed]
            }
        }
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .take(max_results)
        .map(|item| (normalize_product(item), extract_description(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_list_with_spanish_keys_parses_and_normalizes() {
        let content = r#"{"productos": [
            {"marca": "Asus", "modelo": "TUF A15", "precio": "$899.00",
             "descripcion": "great thermals for long gaming sessions"}
        ]}"#;

        let results = parse_candidates(content, 8);
        assert_eq!(results.len(), 1);
        let (product, description) = &results[0];
        assert_eq!(product.brand, "Asus");
        assert_eq!(product.name, "TUF A15");
        assert_eq!(product.price, 899.0);
        assert_eq!(description.as_deref(), Some("great thermals for long gaming sessions"));
    }

    #[test]
    fn bare_array_and_single_object_shapes_are_accepted() {
        assert_eq!(parse_candidates(r#"[{"name": "XPS 13"}, {"name": "XPS 15"}]"#, 8).len(), 2);
        assert_eq!(parse_candidates(r#"{"name": "XPS 13"}"#, 8).len(), 1);
    }

    #[test]
    fn malformed_content_reads_as_no_candidates() {
        assert!(parse_candidates("not json at all", 8).is_empty());
        assert!(parse_candidates("42", 8).is_empty());
        assert!(parse_candidates(r#""just a string""#, 8).is_empty());
    }

    #[test]
    fn results_are_capped_at_max() {
        let content = r#"{"laptops": [
            {"name": "A"}, {"name": "B"}, {"name": "C"}, {"name": "D"}
        ]}"#;
        assert_eq!(parse_candidates(content, 2).len(), 2);
    }
}
