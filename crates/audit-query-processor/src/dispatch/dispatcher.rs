//! Selects a healthy provider and drives the retry/backoff call loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dispatch::adapters::{AnthropicProvider, OllamaProvider, OpenAiProvider};
use crate::dispatch::health::ProviderHealth;
use crate::dispatch::provider::{ModelRequest, Provider, RawResponse};
use crate::metrics;

struct Registered {
    provider: Arc<dyn Provider>,
    health: Arc<ProviderHealth>,
}

pub struct SelectionOutcome {
    pub name: String,
    pub reason: &'static str,
    pub fallback_used: bool,
}

pub struct ModelDispatcher {
    providers: HashMap<String, Registered>,
    preference: Vec<String>,
    provider_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    max_retry_delay: Duration,
}

impl ModelDispatcher {
    pub fn new(config: &AppConfig) -> Self {
        let mut providers = HashMap::new();
        for (name, provider_config) in &config.providers {
            let adapter: Arc<dyn Provider> = match provider_config.family.as_str() {
                "anthropic" => Arc::new(AnthropicProvider::new(
                    name.clone(),
                    provider_config.clone(),
                    config.provider_timeout,
                )),
                "openai" => Arc::new(OpenAiProvider::new(
                    name.clone(),
                    provider_config.clone(),
                    config.provider_timeout,
                )),
                "ollama" => Arc::new(OllamaProvider::new(
                    name.clone(),
                    provider_config.clone(),
                    config.provider_timeout,
                )),
                other => {
                    tracing::warn!(family = other, provider = %name, "unknown provider family, skipping");
                    continue;
                }
            };
            providers.insert(name.clone(), Registered { provider: adapter, health: Arc::new(ProviderHealth::new()) });
        }

        Self {
            providers,
            preference: config.provider_preference.clone(),
            provider_timeout: config.provider_timeout,
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
            max_retry_delay: config.max_retry_delay,
        }
    }

    pub fn health_snapshot(&self) -> Vec<(String, Arc<dyn Provider>, Arc<ProviderHealth>)> {
        self.providers
            .iter()
            .map(|(name, r)| (name.clone(), r.provider.clone(), r.health.clone()))
            .collect()
    }

    /// Selection algorithm: preferred model first if healthy,
    /// otherwise the first healthy entry in the preference list.
    pub fn select(&self, preferred_model: Option<&str>) -> anyhow::Result<SelectionOutcome> {
        if let Some(preferred) = preferred_model {
            if let Some(registered) = self.providers.get(preferred) {
                if registered.health.is_healthy() {
                    return Ok(SelectionOutcome { name: preferred.to_string(), reason: "preferred_model", fallback_used: false });
                }
            }
        }

        for name in &self.preference {
            if let Some(registered) = self.providers.get(name) {
                if registered.health.is_healthy() {
                    return Ok(SelectionOutcome {
                        name: name.clone(),
                        reason: "preference_order",
                        fallback_used: preferred_model.is_some(),
                    });
                }
            }
        }

        anyhow::bail!("no healthy providers available")
    }

    pub async fn dispatch(&self, request: ModelRequest, preferred_model: Option<&str>) -> anyhow::Result<RawResponse> {
        let selection = self.select(preferred_model)?;
        let registered = self
            .providers
            .get(&selection.name)
            .ok_or_else(|| anyhow::anyhow!("selected provider '{}' is not registered", selection.name))?;

        let mut delay = self.retry_delay;
        let mut attempt = 0;

        loop {
            let outcome = tokio::time::timeout(self.provider_timeout, registered.provider.send(&request)).await;

            match outcome {
                Ok(Ok(response)) => {
                    registered.health.record(true, 1);
                    metrics::inc_dispatch_outcome(&selection.name, "success");
                    return Ok(response);
                }
                Ok(Err(err)) => {
                    registered.health.record(false, 1);
                    metrics::inc_dispatch_outcome(&selection.name, "error");
                    if attempt >= self.retry_attempts {
                        return Err(err);
                    }
                }
                Err(_) => {
                    registered.health.record(false, 1);
                    metrics::inc_dispatch_outcome(&selection.name, "timeout");
                    if attempt >= self.retry_attempts {
                        anyhow::bail!("provider '{}' timed out after {} attempts", selection.name, attempt + 1);
                    }
                }
            }

            tokio::time::sleep(delay).await;
            delay = std::cmp::min(delay * 2, self.max_retry_delay);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;

    #[test]
    fn select_prefers_healthy_preferred_model() {
        let dispatcher = ModelDispatcher::new(&test_config());
        let outcome = dispatcher.select(Some("claude")).unwrap();
        assert_eq!(outcome.name, "claude");
        assert_eq!(outcome.reason, "preferred_model");
        assert!(!outcome.fallback_used);
    }

    #[test]
    fn select_falls_back_to_preference_order_when_preferred_unhealthy() {
        let dispatcher = ModelDispatcher::new(&test_config());
        dispatcher.providers.get("claude").unwrap().health.record(false, 1);
        let outcome = dispatcher.select(Some("claude")).unwrap();
        assert_ne!(outcome.name, "claude");
        assert_eq!(outcome.reason, "preference_order");
        assert!(outcome.fallback_used);
    }

    #[test]
    fn select_fails_when_nothing_is_healthy() {
        let dispatcher = ModelDispatcher::new(&test_config());
        for registered in dispatcher.providers.values() {
            registered.health.record(false, 1);
        }
        assert!(dispatcher.select(None).is_err());
    }
}
