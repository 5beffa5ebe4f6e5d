//! Trait and wire-adjacent types shared by every provider adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single turn sent to a provider, already assembled by that
/// provider's adapter (system prompt, few-shot examples, message
/// layout are all adapter concerns, not dispatcher concerns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// What a provider call returns once unwrapped from its
/// family-specific envelope. Never carries the API key used to make
/// the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub family: String,
    pub base_url: String,
}

/// One model-family adapter: request/response shape plus
/// authentication. Adapters never see anything beyond the api key
/// env var name; the key's value is read once per call and never
/// logged or echoed back.
#[async_trait]
pub trait Provider: Send + Sync {
    fn info(&self) -> ModelInfo;

    async fn send(&self, request: &ModelRequest) -> anyhow::Result<RawResponse>;

    /// Cheap connectivity probe used by the health ticker; does not
    /// need to exercise the full completion path.
    async fn validate_connection(&self) -> anyhow::Result<()>;
}
