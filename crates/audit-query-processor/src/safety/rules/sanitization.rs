use crate::domain::query::StructuredQuery;
use crate::safety::rule::{RuleResult, Severity, ValidationRule};

/// Rejects control characters in free-text fields and enforces a
/// maximum length on every string field.
pub struct SanitizationRule {
    pub max_field_length: usize,
}

impl SanitizationRule {
    fn check(&self, name: &str, value: &str, violations: &mut Vec<String>) {
        if value.chars().any(|c| c.is_control() && c != '\t') {
            violations.push(format!("{name} contains control characters"));
        }
        if value.len() > self.max_field_length {
            violations.push(format!("{name} exceeds max length of {}", self.max_field_length));
        }
    }
}

impl ValidationRule for SanitizationRule {
    fn id(&self) -> &'static str {
        "sanitization"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, query: &StructuredQuery) -> RuleResult {
        let mut violations = Vec::new();

        if let Some(v) = &query.log_source {
            self.check("log_source", v, &mut violations);
        }
        if let Some(v) = &query.resource_name_pattern {
            self.check("resource_name_pattern", v, &mut violations);
        }
        if let Some(v) = &query.source_ip {
            self.check("source_ip", v, &mut violations);
        }
        if let Some(v) = &query.response_status {
            self.check("response_status", v, &mut violations);
        }
        for (i, u) in query.exclude_users.iter().enumerate() {
            self.check(&format!("exclude_users[{i}]"), u, &mut violations);
        }
        for (i, g) in query.group_by.iter().enumerate() {
            self.check(&format!("group_by[{i}]"), g, &mut violations);
        }

        let passed = violations.is_empty();
        let message = if passed {
            "all free-text fields clean".to_string()
        } else {
            violations.join("; ")
        };

        RuleResult {
            rule_name: self.id().to_string(),
            passed,
            severity: self.severity(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_control_characters() {
        let rule = SanitizationRule { max_field_length: 512 };
        let mut q = StructuredQuery::default();
        q.resource_name_pattern = Some("custom\u{0007}er".into());
        assert!(!rule.evaluate(&q).passed);
    }

    #[test]
    fn rejects_overlong_field() {
        let rule = SanitizationRule { max_field_length: 4 };
        let mut q = StructuredQuery::default();
        q.source_ip = Some("10.0.0.1".into());
        assert!(!rule.evaluate(&q).passed);
    }

    #[test]
    fn passes_clean_fields() {
        let rule = SanitizationRule { max_field_length: 512 };
        let mut q = StructuredQuery::default();
        q.resource_name_pattern = Some("customer".into());
        assert!(rule.evaluate(&q).passed);
    }
}
