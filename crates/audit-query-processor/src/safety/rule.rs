//! Shared types for the safety validator's rule set: the per-rule
//! trait, its outcome, and the composite result attached to a
//! `ProcessingResponse`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::query::StructuredQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

/// Outcome of a single rule's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_name: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
}

/// A single configurable safety rule.
///
/// `id()` is the short identifier the validator keys `rule_results`
/// by (`whitelist`, `required_fields`, `patterns`, `timeframe`,
/// `sanitization`).
pub trait ValidationRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn evaluate(&self, query: &StructuredQuery) -> RuleResult;
}

/// Composite output of the safety validator, attached verbatim to a
/// `ProcessingResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub rule_results: HashMap<String, RuleResult>,
    /// Deep copy of the query as validated; never an alias into the
    /// live query the orchestrator continues to hold.
    pub query_snapshot: StructuredQuery,
    pub timestamp: DateTime<Utc>,
}

impl ValidationResult {
    pub fn failing_rules(&self) -> Vec<&RuleResult> {
        self.rule_results
            .values()
            .filter(|r| !r.passed)
            .collect()
    }
}
