//! Adapter for the openai-style "chat.completions" API family.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::dispatch::provider::{ModelInfo, ModelRequest, Provider, RawResponse};

pub struct OpenAiProvider {
    name: String,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(name: String, config: ProviderConfig, timeout: Duration) -> Self {
        Self {
            name,
            config,
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }

    fn api_key(&self) -> Option<String> {
        self.config.api_key_env.as_ref().and_then(|var| std::env::var(var).ok())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> ModelInfo {
        ModelInfo { name: self.name.clone(), family: "openai".to_string(), base_url: self.config.base_url.clone() }
    }

    async fn send(&self, request: &ModelRequest) -> anyhow::Result<RawResponse> {
        let api_key = self
            .api_key()
            .ok_or_else(|| anyhow::anyhow!("provider '{}' has no api key configured", self.name))?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_message },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("openai request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("openai returned {status}: {text}");
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| anyhow::anyhow!("failed to parse openai response: {e}"))?;
        let text = parsed.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default();

        Ok(RawResponse { text, provider: self.name.clone(), model: self.config.model.clone() })
    }

    async fn validate_connection(&self) -> anyhow::Result<()> {
        if self.api_key().is_none() {
            anyhow::bail!("no api key configured for '{}'", self.name);
        }
        let response = self
            .client
            .get(format!("{}/v1/models", self.config.base_url))
            .bearer_auth(self.api_key().unwrap_or_default())
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("connectivity probe failed: {e}"))?;
        if response.status().is_server_error() {
            anyhow::bail!("openai returned {}", response.status());
        }
        Ok(())
    }
}
