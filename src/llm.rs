use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Capability that turns a raw reminder prompt into the message actually
/// sent. Swapped for the identity implementation when no key is configured
/// and in tests.
#[async_trait::async_trait]
pub trait Rephraser: Send + Sync {
    async fn rephrase(&self, prompt: &str) -> Result<String>;
}

/// Echoes the prompt unchanged.
pub struct IdentityRephraser;

#[async_trait::async_trait]
impl Rephraser for IdentityRephraser {
    async fn rephrase(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqRephraser {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

impl GroqRephraser {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Rephraser for GroqRephraser {
    async fn rephrase(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error ({}): {}", status, body);
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        body.choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("Empty response from LLM"))
    }
}

/// Pick the configured rephraser, falling back to identity when no key is
/// set.
pub fn create_rephraser(config: Option<&LlmConfig>) -> Arc<dyn Rephraser> {
    match config {
        Some(cfg) => Arc::new(GroqRephraser::new(cfg)),
        None => Arc::new(IdentityRephraser),
    }
}
