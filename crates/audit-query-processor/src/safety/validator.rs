//! Composes the configured rule set into a single pass/fail verdict.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::query::StructuredQuery;
use crate::metrics;
use crate::safety::rule::{Severity, ValidationResult, ValidationRule};
use crate::safety::rules::{
    ForbiddenPatternsRule, RequiredFieldsRule, SanitizationRule, TimeframeRule, WhitelistRule,
};

pub struct SafetyValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl SafetyValidator {
    pub fn new(config: &AppConfig) -> Self {
        let max_span = chrono::Duration::from_std(config.max_timeframe_span)
            .unwrap_or_else(|_| chrono::Duration::days(30));

        let rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(RequiredFieldsRule { required: config.required_fields.clone() }),
            Box::new(WhitelistRule {
                log_source_whitelist: config.log_source_whitelist.clone(),
                verb_whitelist: config.verb_whitelist.clone(),
                resource_whitelist: config.resource_whitelist.clone(),
            }),
            Box::new(ForbiddenPatternsRule { patterns: config.forbidden_patterns.clone() }),
            Box::new(TimeframeRule {
                allowed_timeframes: config.allowed_timeframes.clone(),
                max_span,
            }),
            Box::new(SanitizationRule { max_field_length: config.max_field_length }),
        ];

        Self { rules }
    }

    pub fn from_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// Runs every configured rule and folds the results into a single
    /// verdict. `is_valid` is false as soon as any rule of severity
    /// `>= High` fails; the composite `rule_name`/`severity`/`message`
    /// mirror the worst failing rule (or the first rule if all pass).
    pub fn validate(&self, query: &StructuredQuery) -> ValidationResult {
        let mut rule_results = HashMap::new();
        let mut worst: Option<(&'static str, Severity, String)> = None;
        let mut is_valid = true;

        for rule in &self.rules {
            let result = rule.evaluate(query);
            if !result.passed {
                metrics::inc_validation_failure(rule.id());
                if result.severity >= Severity::High {
                    is_valid = false;
                }
                let replace = match &worst {
                    None => true,
                    Some((_, sev, _)) => result.severity > *sev,
                };
                if replace {
                    worst = Some((rule.id(), result.severity, result.message.clone()));
                }
            }
            rule_results.insert(rule.id().to_string(), result);
        }

        let (rule_name, severity, message) = worst.unwrap_or((
            "none",
            Severity::Info,
            "all safety rules passed".to_string(),
        ));

        ValidationResult {
            is_valid,
            rule_name: rule_name.to_string(),
            severity,
            message,
            rule_results,
            query_snapshot: query.clone(),
            timestamp: Utc::now(),
        }
    }
}

pub fn shared(config: &AppConfig) -> Arc<SafetyValidator> {
    Arc::new(SafetyValidator::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::OneOrMany;

    fn validator() -> SafetyValidator {
        SafetyValidator::from_rules(vec![
            Box::new(RequiredFieldsRule { required: vec!["verb".into()] }),
            Box::new(WhitelistRule {
                log_source_whitelist: vec!["kube-apiserver".into()],
                verb_whitelist: vec!["delete".into()],
                resource_whitelist: vec!["pods".into()],
            }),
        ])
    }

    #[test]
    fn is_valid_when_all_rules_pass() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("delete".into()));
        q.log_source = Some("kube-apiserver".into());
        let result = validator().validate(&q);
        assert!(result.is_valid);
        assert_eq!(result.rule_results.len(), 2);
    }

    #[test]
    fn is_invalid_on_critical_failure() {
        let q = StructuredQuery::default();
        let result = validator().validate(&q);
        assert!(!result.is_valid);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn query_snapshot_is_a_deep_copy() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("delete".into()));
        let result = validator().validate(&q);
        let mut mutated = q.clone();
        mutated.verb = Some(OneOrMany::Scalar("get".into()));
        assert_ne!(result.query_snapshot.verb, mutated.verb);
    }
}
