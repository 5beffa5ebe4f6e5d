//! Adapter for a local/ollama-style family. No authorization header:
//! these are typically loopback deployments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::dispatch::provider::{ModelInfo, ModelRequest, Provider, RawResponse};

pub struct OllamaProvider {
    name: String,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(name: String, config: ProviderConfig, timeout: Duration) -> Self {
        Self {
            name,
            config,
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl Provider for OllamaProvider {
    fn info(&self) -> ModelInfo {
        ModelInfo { name: self.name.clone(), family: "ollama".to_string(), base_url: self.config.base_url.clone() }
    }

    async fn send(&self, request: &ModelRequest) -> anyhow::Result<RawResponse> {
        let prompt = format!("{}\n\n{}", request.system_prompt, request.user_message);
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: request.temperature },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("ollama request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("ollama returned {status}: {text}");
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| anyhow::anyhow!("failed to parse ollama response: {e}"))?;

        Ok(RawResponse { text: parsed.response, provider: self.name.clone(), model: self.config.model.clone() })
    }

    async fn validate_connection(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("connectivity probe failed: {e}"))?;
        if response.status().is_server_error() {
            anyhow::bail!("ollama returned {}", response.status());
        }
        Ok(())
    }
}
