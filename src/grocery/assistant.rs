use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::LlmConfig;

/// Ingredient line normalized by the language model, ready for the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDraft {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "Other".into()
}

/// Text reorganization backed by a language model.
#[async_trait]
pub trait GroceryAssistant: Send + Sync {
    /// Categorize, deduplicate and standardize a grocery list.
    async fn organize(&self, items: &[String]) -> anyhow::Result<String>;
    /// Turn free-form ingredient lines into structured inventory items.
    async fn extract_inventory(&self, ingredients: &[String]) -> anyhow::Result<Vec<InventoryDraft>>;
}

const ORGANIZE_SYSTEM: &str =
    "You are a helpful assistant that organizes grocery lists. Keep the output clean and well-formatted.";
const INVENTORY_SYSTEM: &str =
    "You are a helpful assistant that processes and organizes ingredients. Reply with JSON only.";

pub fn organize_prompt(items: &[String]) -> String {
    format!(
        "Please organize this grocery list by category (e.g., Produce, Meat, Dairy, etc.) and combine similar items.\n\
         Also, standardize measurements and remove duplicates.\n\
         Format the response as a clean, organized list with category headers.\n\n\
         Ingredients:\n{}",
        items.join("\n")
    )
}

pub fn inventory_prompt(ingredients: &[String]) -> String {
    format!(
        "Process this list of ingredients: remove duplicates, combine similar items, \
         standardize measurements and categorize each item (Produce, Meat, Dairy, ...).\n\n\
         Ingredients:\n{}\n\n\
         Return {{\"items\": [{{\"name\": string, \"quantity\": number, \"unit\": string, \"category\": string}}]}}",
        ingredients.join("\n")
    )
}

/// Accepts either a bare JSON array or an object wrapping it under `items`.
pub fn parse_inventory(content: &str) -> anyhow::Result<Vec<InventoryDraft>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Payload {
        Wrapped { items: Vec<InventoryDraft> },
        Bare(Vec<InventoryDraft>),
    }

    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let payload: Payload = serde_json::from_str(trimmed).context("parse inventory json")?;
    let items = match payload {
        Payload::Wrapped { items } | Payload::Bare(items) => items,
    };
    Ok(items
        .into_iter()
        .filter(|i| !i.name.trim().is_empty())
        .collect())
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiAssistant {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAssistant {
    pub fn new(http: reqwest::Client, config: &LlmConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, system: &str, user: &str, json_mode: bool) -> anyhow::Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("chat completion returned {}: {}", status, text);
        }
        let parsed: ChatResponse = res.json().await.context("decode chat completion")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("chat completion had no content")?;
        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl GroceryAssistant for OpenAiAssistant {
    async fn organize(&self, items: &[String]) -> anyhow::Result<String> {
        let text = self.complete(ORGANIZE_SYSTEM, &organize_prompt(items), false).await?;
        Ok(text.trim().to_string())
    }

    async fn extract_inventory(&self, ingredients: &[String]) -> anyhow::Result<Vec<InventoryDraft>> {
        let text = self
            .complete(INVENTORY_SYSTEM, &inventory_prompt(ingredients), true)
            .await?;
        parse_inventory(&text)
    }
}
