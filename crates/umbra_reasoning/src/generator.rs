use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use umbra_core::config::LlmConfig;
use umbra_core::{GeneratedThought, Generator};

use crate::extraction::parse_thought;
use crate::prompts::PersonaPrompt;

/// Generation over an OpenAI-compatible chat completions endpoint (DeepSeek by default).
#[derive(Debug, Clone)]
pub struct ChatGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    persona: PersonaPrompt,
}

impl ChatGenerator {
    pub fn new(api_key: &str, config: &LlmConfig, persona: PersonaPrompt) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            persona,
        })
    }

    /// Reads the key from `DEEPSEEK_API_KEY`.
    pub fn from_env(config: &LlmConfig, persona: PersonaPrompt) -> Result<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .context("DEEPSEEK_API_KEY is required for generation")?;
        Self::new(&api_key, config, persona)
    }

    /// Raw assistant text for one system + user exchange.
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "stream": false,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to generation service")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Generation API error ({}): {}",
                status,
                error_text.chars().take(200).collect::<String>()
            );
        }

        let resp_json: Value = response
            .json()
            .await
            .context("Failed to parse generation response")?;
        let message = &resp_json["choices"][0]["message"];

        // Reasoning models expose their chain of thought separately
        if let Some(reasoning) = message["reasoning_content"].as_str() {
            if !reasoning.is_empty() {
                tracing::debug!("Model reasoning: {}", reasoning);
            }
        }

        message["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Generation response has no message content"))
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(
        &self,
        stimulus_text: &str,
        mood_description: &str,
        memory_texts: &[String],
    ) -> Result<GeneratedThought> {
        let system = self.persona.system_prompt(mood_description, memory_texts);
        let user = PersonaPrompt::user_message(stimulus_text);
        let reply = self.complete(&system, &user).await?;
        let thought = parse_thought(&reply)?;
        tracing::info!(rationale = %thought.rationale, "Generated: {}", thought.content);
        Ok(thought)
    }
}
