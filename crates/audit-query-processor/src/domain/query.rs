//! The normalized descriptor produced by the pipeline, and the
//! "one-or-many" sum type used by its multi-valued fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field that the model may return as a single scalar or as an
/// ordered list. Kept as a tagged sum rather than always-a-list so that
/// serialization round-trips the shape the caller actually used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Scalar(String),
    List(Vec<String>),
}

impl OneOrMany {
    /// The value used for reference extraction and single-value contexts.
    pub fn first(&self) -> Option<&str> {
        match self {
            OneOrMany::Scalar(s) => Some(s.as_str()),
            OneOrMany::List(items) => items.first().map(|s| s.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::Scalar(s) => s.is_empty(),
            OneOrMany::List(items) => items.is_empty() || items.iter().all(|s| s.is_empty()),
        }
    }

    pub fn as_list(&self) -> Vec<&str> {
        match self {
            OneOrMany::Scalar(s) => vec![s.as_str()],
            OneOrMany::List(items) => items.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Coerce a one-element array that arrived from JSON into a scalar,
    /// per the JSON normalizer's contract. Lists with more than one
    /// element are left untouched.
    pub fn coerce_single_element_list(self) -> Self {
        match self {
            OneOrMany::List(items) if items.len() == 1 => {
                OneOrMany::Scalar(items.into_iter().next().unwrap())
            }
            other => other,
        }
    }

    pub fn map_strings(self, f: impl Fn(String) -> String) -> Self {
        match self {
            OneOrMany::Scalar(s) => OneOrMany::Scalar(f(s)),
            OneOrMany::List(items) => OneOrMany::List(items.into_iter().map(f).collect()),
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(s: &str) -> Self {
        OneOrMany::Scalar(s.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(s: String) -> Self {
        OneOrMany::Scalar(s)
    }
}

/// The normalized, safety-checked query descriptor this whole pipeline
/// exists to produce. Built by the parser, mutated only by the field
/// mapper and schema normalizer, then treated as immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_users: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    /// Advanced field, used instead of `timeframe` when the model
    /// returns an explicit span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Anything the extractor produced that isn't a recognized field.
    /// Tracked so the JSON normalizer can report what it dropped, but
    /// never serialized back out.
    #[serde(skip)]
    pub dropped_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl StructuredQuery {
    /// Parse a raw JSON object into a StructuredQuery, recording any
    /// key not in the known schema as dropped rather than failing.
    pub fn from_json_value(value: Value) -> anyhow::Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("structured query must be a JSON object"))?;

        let known_keys = [
            "log_source",
            "verb",
            "resource",
            "namespace",
            "user",
            "timeframe",
            "limit",
            "response_status",
            "exclude_users",
            "resource_name_pattern",
            "source_ip",
            "group_by",
            "time_range",
        ];

        let mut dropped = Vec::new();
        for key in obj.keys() {
            if !known_keys.contains(&key.as_str()) {
                dropped.push(key.clone());
            }
        }

        let mut query = StructuredQuery {
            log_source: field_str(obj, "log_source"),
            verb: field_one_or_many(obj, "verb"),
            resource: field_one_or_many(obj, "resource"),
            namespace: field_one_or_many(obj, "namespace"),
            user: field_one_or_many(obj, "user"),
            timeframe: field_str(obj, "timeframe"),
            limit: obj.get("limit").and_then(|v| v.as_u64()).map(|v| v as u32),
            response_status: field_str(obj, "response_status"),
            exclude_users: field_str_list(obj, "exclude_users"),
            resource_name_pattern: field_str(obj, "resource_name_pattern"),
            source_ip: field_str(obj, "source_ip"),
            group_by: field_str_list(obj, "group_by"),
            time_range: obj
                .get("time_range")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            dropped_fields: dropped,
        };

        if let Some(v) = query.verb.take() {
            query.verb = Some(v.coerce_single_element_list());
        }
        if let Some(v) = query.resource.take() {
            query.resource = Some(v.coerce_single_element_list());
        }
        if let Some(v) = query.namespace.take() {
            query.namespace = Some(v.coerce_single_element_list());
        }
        if let Some(v) = query.user.take() {
            query.user = Some(v.coerce_single_element_list());
        }

        Ok(query)
    }
}

fn field_str(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn field_str_list(obj: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn field_one_or_many(obj: &serde_json::Map<String, Value>, key: &str) -> Option<OneOrMany> {
    match obj.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(OneOrMany::Scalar(trimmed.to_string()))
            }
        }
        Some(Value::Array(items)) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if list.is_empty() {
                None
            } else {
                Some(OneOrMany::List(list))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_single_element_list_to_scalar() {
        let list = OneOrMany::List(vec!["delete".to_string()]);
        assert_eq!(list.coerce_single_element_list(), OneOrMany::Scalar("delete".to_string()));
    }

    #[test]
    fn leaves_multi_element_list_alone() {
        let list = OneOrMany::List(vec!["get".to_string(), "list".to_string()]);
        assert_eq!(list.clone().coerce_single_element_list(), list);
    }

    #[test]
    fn from_json_value_drops_unknown_keys() {
        let value = serde_json::json!({
            "log_source": "kube-apiserver",
            "verb": "delete",
            "unknown_field": "should be dropped",
        });
        let query = StructuredQuery::from_json_value(value).unwrap();
        assert_eq!(query.log_source.as_deref(), Some("kube-apiserver"));
        assert_eq!(query.dropped_fields, vec!["unknown_field".to_string()]);
    }

    #[test]
    fn first_returns_list_head() {
        let v = OneOrMany::List(vec!["a".into(), "b".into()]);
        assert_eq!(v.first(), Some("a"));
    }
}
