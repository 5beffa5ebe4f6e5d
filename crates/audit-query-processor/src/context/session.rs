//! In-memory representation of a single session's conversation context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::query::StructuredQuery;

/// The antecedent kind a resolved reference stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    User,
    Resource,
    Namespace,
    Action,
    Time,
    ResourceName,
}

/// A single turn recorded against a session: the original query text
/// and the structured query it resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub query: String,
    pub structured_query: StructuredQuery,
    pub recorded_at_epoch_secs: u64,
}

/// A single resolved reference, keyed by the names in the reference
/// extraction table (`last_user`, `last_resource`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub reference_type: ReferenceType,
    pub value: String,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

/// Everything the context manager holds for one session. Persisted
/// one-file-per-session when persistence is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub entries: Vec<ConversationEntry>,
    pub references: std::collections::HashMap<String, ResolvedReference>,
    pub last_activity_epoch_secs: u64,
    pub expires_at_epoch_secs: u64,
    #[serde(skip)]
    pub dirty: bool,
}

impl ConversationContext {
    pub fn new(session_id: String, session_timeout_secs: u64) -> Self {
        let now = now_epoch_secs();
        Self {
            session_id,
            user_id: None,
            entries: Vec::new(),
            references: std::collections::HashMap::new(),
            last_activity_epoch_secs: now,
            expires_at_epoch_secs: now + session_timeout_secs,
            dirty: true,
        }
    }

    pub fn touch(&mut self, session_timeout_secs: u64) {
        let now = now_epoch_secs();
        self.last_activity_epoch_secs = now;
        self.expires_at_epoch_secs = now + session_timeout_secs;
        self.dirty = true;
    }

    pub fn is_expired(&self, now_epoch_secs: u64) -> bool {
        now_epoch_secs >= self.expires_at_epoch_secs
    }

    /// Rough in-memory footprint, used against `max_memory_mb`.
    pub fn approx_size_bytes(&self) -> usize {
        let entries_size: usize = self
            .entries
            .iter()
            .map(|e| e.query.len() + 256)
            .sum();
        let refs_size: usize = self.references.values().map(|r| r.value.len() + 32).sum();
        entries_size + refs_size + 128
    }
}

pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Applies the fixed reference-extraction table to a successfully
/// produced `StructuredQuery`, writing only non-empty values.
pub fn extract_references(
    query: &StructuredQuery,
) -> std::collections::HashMap<String, ResolvedReference> {
    let mut refs = std::collections::HashMap::new();
    let now = Utc::now();
    let mut put = |key: &str, reference_type: ReferenceType, value: Option<String>| {
        if let Some(v) = value {
            if !v.is_empty() {
                refs.insert(key.to_string(), ResolvedReference { reference_type, value: v, confidence: 0.9, updated_at: now });
            }
        }
    };

    put("last_user", ReferenceType::User, query.user.as_ref().and_then(|u| u.first()).map(str::to_string));
    put("last_resource", ReferenceType::Resource, query.resource.as_ref().and_then(|r| r.first()).map(str::to_string));
    put("last_namespace", ReferenceType::Namespace, query.namespace.as_ref().and_then(|n| n.first()).map(str::to_string));
    put("last_action", ReferenceType::Action, query.verb.as_ref().and_then(|v| v.first()).map(str::to_string));
    put("last_timeframe", ReferenceType::Time, query.timeframe.clone());
    put("last_resource_name", ReferenceType::ResourceName, query.resource_name_pattern.clone());

    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::OneOrMany;

    #[test]
    fn extracts_only_non_empty_references() {
        let mut q = StructuredQuery::default();
        q.user = Some(OneOrMany::List(vec!["alice".into(), "bob".into()]));
        q.timeframe = Some(String::new());
        let refs = extract_references(&q);
        assert_eq!(refs.get("last_user").unwrap().value, "alice");
        assert!(!refs.contains_key("last_timeframe"));
    }
}
