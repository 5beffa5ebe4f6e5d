// audit-query-processor/src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Fully-resolved, immutable configuration. Loaded once at startup via
/// [`AppConfig::load`], then handed out behind an `Arc` — nothing after
/// startup mutates it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_host: String,
    pub api_port: u16,

    // Context manager
    pub cleanup_interval: Duration,
    pub session_timeout: Duration,
    pub max_sessions: usize,
    pub max_memory_mb: usize,
    pub monitor_interval: Duration,
    pub memory_warn_threshold: f64,
    pub memory_critical_threshold: f64,
    pub enable_persistence: bool,
    pub persistence_path: String,
    pub persistence_format: PersistenceFormat,
    pub persistence_interval: Duration,
    pub enable_async_persistence: bool,
    pub crd_acronym: String,

    // Dispatcher
    pub provider_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub health_check_interval: Duration,
    pub health_check_timeout: Duration,
    pub provider_preference: Vec<String>,
    pub providers: HashMap<String, ProviderConfig>,

    // Parser
    pub confidence_threshold: f64,
    pub max_retries: u32,
    pub enable_reprompting: bool,
    pub default_limit: u32,

    // Safety validator
    pub required_fields: Vec<String>,
    pub log_source_whitelist: Vec<String>,
    pub verb_whitelist: Vec<String>,
    pub resource_whitelist: Vec<String>,
    pub forbidden_patterns: Vec<String>,
    pub allowed_timeframes: Vec<String>,
    pub max_timeframe_span: Duration,
    pub max_field_length: usize,

    // Demo mode
    pub demo_mode: bool,
    pub demo_fixed_timestamps: bool,

    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub family: String,
    pub base_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceFormat {
    Json,
    Gob,
}

impl PersistenceFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PersistenceFormat::Json => "json",
            PersistenceFormat::Gob => "gob",
        }
    }
}

/// Document shape accepted from `CONFIG_DIR/config.toml` (or
/// `config.json`). Every field is optional: anything absent falls back
/// to the environment-variable default, matching the teacher's
/// `env::var(...).unwrap_or_else(...)` idiom.
#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    api_host: Option<String>,
    api_port: Option<u16>,
    cleanup_interval_seconds: Option<u64>,
    session_timeout_seconds: Option<u64>,
    max_sessions: Option<usize>,
    max_memory_mb: Option<usize>,
    monitor_interval_seconds: Option<u64>,
    memory_warn_threshold: Option<f64>,
    memory_critical_threshold: Option<f64>,
    enable_persistence: Option<bool>,
    persistence_path: Option<String>,
    persistence_format: Option<String>,
    persistence_interval_seconds: Option<u64>,
    enable_async_persistence: Option<bool>,
    crd_acronym: Option<String>,
    provider_timeout_seconds: Option<u64>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    max_retry_delay_ms: Option<u64>,
    health_check_interval_seconds: Option<u64>,
    health_check_timeout_seconds: Option<u64>,
    provider_preference: Option<Vec<String>>,
    providers: Option<HashMap<String, ProviderConfig>>,
    confidence_threshold: Option<f64>,
    max_retries: Option<u32>,
    enable_reprompting: Option<bool>,
    default_limit: Option<u32>,
    required_fields: Option<Vec<String>>,
    log_source_whitelist: Option<Vec<String>>,
    verb_whitelist: Option<Vec<String>>,
    resource_whitelist: Option<Vec<String>>,
    forbidden_patterns: Option<Vec<String>>,
    allowed_timeframes: Option<Vec<String>>,
    max_timeframe_span_seconds: Option<u64>,
    max_field_length: Option<usize>,
    request_timeout_seconds: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file loaded: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let doc = Self::load_document().unwrap_or_default();

        let api_port = env_override("API_PORT", doc.api_port)
            .or_else(|| env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(8000);

        let persistence_format = match env::var("PERSISTENCE_FORMAT")
            .ok()
            .or(doc.persistence_format)
            .unwrap_or_else(|| "json".to_string())
            .as_str()
        {
            "gob" => PersistenceFormat::Gob,
            _ => PersistenceFormat::Json,
        };

        let providers = doc.providers.unwrap_or_else(default_providers);

        let cfg = Self {
            api_host: env::var("API_HOST").ok().or(doc.api_host).unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port,

            cleanup_interval: secs(env_override("CLEANUP_INTERVAL_SECONDS", doc.cleanup_interval_seconds).unwrap_or(60)),
            session_timeout: secs(env_override("SESSION_TIMEOUT_SECONDS", doc.session_timeout_seconds).unwrap_or(3600)),
            max_sessions: env_override("MAX_SESSIONS", doc.max_sessions).unwrap_or(10_000),
            max_memory_mb: env_override("MAX_MEMORY_MB", doc.max_memory_mb).unwrap_or(512),
            monitor_interval: secs(env_override("MONITOR_INTERVAL_SECONDS", doc.monitor_interval_seconds).unwrap_or(15)),
            memory_warn_threshold: env_override("MEMORY_WARN_THRESHOLD", doc.memory_warn_threshold).unwrap_or(0.80),
            memory_critical_threshold: env_override("MEMORY_CRITICAL_THRESHOLD", doc.memory_critical_threshold).unwrap_or(0.95),
            enable_persistence: env_override("ENABLE_PERSISTENCE", doc.enable_persistence).unwrap_or(true),
            persistence_path: env::var("PERSISTENCE_PATH").ok().or(doc.persistence_path).unwrap_or_else(|| "./data/sessions".to_string()),
            persistence_format,
            persistence_interval: secs(env_override("PERSISTENCE_INTERVAL_SECONDS", doc.persistence_interval_seconds).unwrap_or(5)),
            enable_async_persistence: env_override("ENABLE_ASYNC_PERSISTENCE", doc.enable_async_persistence).unwrap_or(true),
            crd_acronym: env::var("CRD_ACRONYM").ok().or(doc.crd_acronym).unwrap_or_else(|| "CRD".to_string()),

            provider_timeout: secs(env_override("PROVIDER_TIMEOUT_SECONDS", doc.provider_timeout_seconds).unwrap_or(30)),
            retry_attempts: env_override("RETRY_ATTEMPTS", doc.retry_attempts).unwrap_or(3),
            retry_delay: millis(env_override("RETRY_DELAY_MS", doc.retry_delay_ms).unwrap_or(500)),
            max_retry_delay: millis(env_override("MAX_RETRY_DELAY_MS", doc.max_retry_delay_ms).unwrap_or(8_000)),
            health_check_interval: secs(env_override("HEALTH_CHECK_INTERVAL_SECONDS", doc.health_check_interval_seconds).unwrap_or(30)),
            health_check_timeout: secs(env_override("HEALTH_CHECK_TIMEOUT_SECONDS", doc.health_check_timeout_seconds).unwrap_or(5)),
            provider_preference: env::var("PROVIDER_PREFERENCE")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .or(doc.provider_preference)
                .unwrap_or_else(|| providers.keys().cloned().collect()),
            providers,

            confidence_threshold: env_override("CONFIDENCE_THRESHOLD", doc.confidence_threshold).unwrap_or(0.75),
            max_retries: env_override("MAX_RETRIES", doc.max_retries).unwrap_or(2),
            enable_reprompting: env_override("ENABLE_REPROMPTING", doc.enable_reprompting).unwrap_or(false),
            default_limit: env_override("DEFAULT_LIMIT", doc.default_limit).unwrap_or(20),

            required_fields: doc.required_fields.unwrap_or_else(|| {
                vec!["log_source".to_string(), "verb".to_string(), "resource".to_string()]
            }),
            log_source_whitelist: doc.log_source_whitelist.unwrap_or_else(|| {
                vec!["kube-apiserver".to_string(), "oauth-server".to_string()]
            }),
            verb_whitelist: doc.verb_whitelist.unwrap_or_else(|| {
                vec![
                    "get".to_string(), "list".to_string(), "watch".to_string(),
                    "create".to_string(), "update".to_string(), "patch".to_string(),
                    "delete".to_string(), "deletecollection".to_string(),
                ]
            }),
            resource_whitelist: doc.resource_whitelist.unwrap_or_else(|| {
                vec![
                    "pods".to_string(), "services".to_string(), "deployments".to_string(),
                    "configmaps".to_string(), "secrets".to_string(), "namespaces".to_string(),
                    "customresourcedefinitions".to_string(), "roles".to_string(), "rolebindings".to_string(),
                ]
            }),
            forbidden_patterns: doc.forbidden_patterns.unwrap_or_else(|| {
                vec!["DROP TABLE".to_string(), ";--".to_string(), "<script".to_string()]
            }),
            allowed_timeframes: doc.allowed_timeframes.unwrap_or_else(|| {
                vec![
                    "today".to_string(), "yesterday".to_string(), "last_hour".to_string(),
                    "last_24_hours".to_string(), "last_7_days".to_string(), "last_30_days".to_string(),
                ]
            }),
            max_timeframe_span: secs(env_override("MAX_TIMEFRAME_SPAN_SECONDS", doc.max_timeframe_span_seconds).unwrap_or(30 * 86_400)),
            max_field_length: env_override("MAX_FIELD_LENGTH", doc.max_field_length).unwrap_or(512),

            demo_mode: bool_env("DEMO_MODE"),
            demo_fixed_timestamps: bool_env("DEMO_FIXED_TIMESTAMPS"),

            request_timeout: secs(env_override("REQUEST_TIMEOUT_SECONDS", doc.request_timeout_seconds).unwrap_or(30)),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    fn load_document() -> Option<ConfigDocument> {
        let dir = env::var("CONFIG_DIR").ok()?;
        let toml_path = Path::new(&dir).join("config.toml");
        let json_path = Path::new(&dir).join("config.json");

        if toml_path.exists() {
            let text = std::fs::read_to_string(&toml_path)
                .with_context(|| format!("reading {}", toml_path.display()))
                .ok()?;
            return toml::from_str(&text).ok();
        }
        if json_path.exists() {
            let text = std::fs::read_to_string(&json_path)
                .with_context(|| format!("reading {}", json_path.display()))
                .ok()?;
            return serde_json::from_str(&text).ok();
        }
        warn!("CONFIG_DIR set to '{}' but no config.toml or config.json found; using environment defaults", dir);
        None
    }

    fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            anyhow::bail!("max_sessions must be > 0");
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) || self.confidence_threshold <= 0.0 {
            anyhow::bail!("confidence_threshold must be in (0,1]");
        }
        if self.provider_preference.is_empty() {
            anyhow::bail!("provider_preference must not be empty");
        }
        for name in &self.provider_preference {
            if !self.providers.contains_key(name) {
                anyhow::bail!("provider '{}' listed in preference order but not configured", name);
            }
        }
        Ok(())
    }

    pub fn print_config(&self) {
        info!(
            "Config: api={}:{} providers={:?} confidence_threshold={} persistence={}({:?})",
            self.api_host, self.api_port, self.provider_preference,
            self.confidence_threshold, self.enable_persistence, self.persistence_format,
        );
    }
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut map = HashMap::new();
    map.insert(
        "claude".to_string(),
        ProviderConfig {
            family: "anthropic".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
        },
    );
    map.insert(
        "gpt4".to_string(),
        ProviderConfig {
            family: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        },
    );
    map.insert(
        "local".to_string(),
        ProviderConfig {
            family: "ollama".to_string(),
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: None,
        },
    );
    map
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn millis(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn bool_env(key: &str) -> bool {
    env::var(key).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Environment variable (upper-precedence) over a value already read
/// from the config document, for any `FromStr` type.
fn env_override<T: std::str::FromStr>(key: &str, document_value: Option<T>) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok()).or(document_value)
}

/// Builds a minimal, valid `AppConfig` for unit tests in other
/// modules, without touching the environment or filesystem.
#[cfg(test)]
pub mod tests_support {
    use super::*;

    pub fn test_config() -> AppConfig {
        AppConfig {
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,

            cleanup_interval: secs(300),
            session_timeout: secs(3600),
            max_sessions: 10_000,
            max_memory_mb: 512,
            monitor_interval: secs(30),
            memory_warn_threshold: 0.8,
            memory_critical_threshold: 0.95,
            enable_persistence: false,
            persistence_path: "/tmp/audit-query-processor-test-sessions".to_string(),
            persistence_format: PersistenceFormat::Json,
            persistence_interval: secs(60),
            enable_async_persistence: false,
            crd_acronym: "CRD".to_string(),

            provider_timeout: secs(10),
            retry_attempts: 2,
            retry_delay: millis(200),
            max_retry_delay: secs(8),
            health_check_interval: secs(30),
            health_check_timeout: secs(5),
            provider_preference: vec!["claude".to_string(), "gpt4".to_string(), "local".to_string()],
            providers: default_providers(),

            confidence_threshold: 0.75,
            max_retries: 2,
            enable_reprompting: false,
            default_limit: 20,

            required_fields: vec!["log_source".into(), "verb".into(), "resource".into()],
            log_source_whitelist: vec!["kube-apiserver".into(), "oauth-server".into()],
            verb_whitelist: vec![
                "get".into(), "list".into(), "watch".into(), "create".into(),
                "update".into(), "patch".into(), "delete".into(), "deletecollection".into(),
            ],
            resource_whitelist: vec![
                "pods".into(), "services".into(), "deployments".into(), "configmaps".into(),
                "secrets".into(), "namespaces".into(), "customresourcedefinitions".into(),
                "roles".into(), "rolebindings".into(),
            ],
            forbidden_patterns: vec!["DROP TABLE".into(), ";--".into(), "<script".into()],
            allowed_timeframes: vec![
                "today".into(), "yesterday".into(), "last_hour".into(),
                "last_24_hours".into(), "last_7_days".into(), "last_30_days".into(),
            ],
            max_timeframe_span: secs(30 * 86_400),
            max_field_length: 512,

            demo_mode: false,
            demo_fixed_timestamps: false,

            request_timeout: secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_providers_cover_three_families() {
        let providers = default_providers();
        let families: std::collections::HashSet<_> =
            providers.values().map(|p| p.family.clone()).collect();
        assert!(families.contains("anthropic"));
        assert!(families.contains("openai"));
        assert!(families.contains("ollama"));
    }

    #[test]
    fn persistence_format_extension() {
        assert_eq!(PersistenceFormat::Json.extension(), "json");
        assert_eq!(PersistenceFormat::Gob.extension(), "gob");
    }
}
