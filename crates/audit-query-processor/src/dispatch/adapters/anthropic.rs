//! Adapter for the anthropic-style "messages" API family.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::dispatch::provider::{ModelInfo, ModelRequest, Provider, RawResponse};

pub struct AnthropicProvider {
    name: String,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
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
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn info(&self) -> ModelInfo {
        ModelInfo { name: self.name.clone(), family: "anthropic".to_string(), base_url: self.config.base_url.clone() }
    }

    async fn send(&self, request: &ModelRequest) -> anyhow::Result<RawResponse> {
        let api_key = self
            .api_key()
            .ok_or_else(|| anyhow::anyhow!("provider '{}' has no api key configured", self.name))?;

        let body = MessagesRequest {
            model: &self.config.model,
            system: &request.system_prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message { role: "user", content: &request.user_message }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("anthropic request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("anthropic returned {status}: {text}");
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| anyhow::anyhow!("failed to parse anthropic response: {e}"))?;
        let text = parsed.content.into_iter().map(|c| c.text).collect::<Vec<_>>().join("");

        Ok(RawResponse { text, provider: self.name.clone(), model: self.config.model.clone() })
    }

    async fn validate_connection(&self) -> anyhow::Result<()> {
        if self.api_key().is_none() {
            anyhow::bail!("no api key configured for '{}'", self.name);
        }
        let response = self
            .client
            .head(&self.config.base_url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("connectivity probe failed: {e}"))?;
        if response.status().is_server_error() {
            anyhow::bail!("anthropic base url returned {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> ProviderConfig {
        ProviderConfig {
            family: "anthropic".to_string(),
            model: "claude-test".to_string(),
            base_url,
            api_key_env: Some("ANTHROPIC_TEST_KEY".to_string()),
        }
    }

    #[tokio::test]
    async fn send_joins_content_blocks_into_one_string() {
        std::env::set_var("ANTHROPIC_TEST_KEY", "test-key");
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[{"text":"{\"verb\":"},{"text":"\"delete\"}"}]}"#)
            .create_async()
            .await;

        let provider = AnthropicProvider::new("claude".to_string(), config(server.url()), Duration::from_secs(5));
        let request = ModelRequest {
            system_prompt: "sys".to_string(),
            user_message: "who deleted what".to_string(),
            max_tokens: 256,
            temperature: 0.0,
        };

        let response = provider.send(&request).await.unwrap();
        assert_eq!(response.text, r#"{"verb":"delete"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_fails_without_api_key() {
        std::env::remove_var("ANTHROPIC_MISSING_KEY");
        let mut cfg = config("http://localhost:0".to_string());
        cfg.api_key_env = Some("ANTHROPIC_MISSING_KEY".to_string());
        let provider = AnthropicProvider::new("claude".to_string(), cfg, Duration::from_secs(5));
        let request = ModelRequest {
            system_prompt: "sys".to_string(),
            user_message: "hi".to_string(),
            max_tokens: 16,
            temperature: 0.0,
        };
        assert!(provider.send(&request).await.is_err());
    }
}
