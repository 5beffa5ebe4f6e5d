use crate::domain::query::StructuredQuery;
use crate::safety::rule::{RuleResult, Severity, ValidationRule};

/// Every field named in the configured required-field list must be
/// present and non-empty on the query.
pub struct RequiredFieldsRule {
    pub required: Vec<String>,
}

impl ValidationRule for RequiredFieldsRule {
    fn id(&self) -> &'static str {
        "required_fields"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, query: &StructuredQuery) -> RuleResult {
        let mut missing = Vec::new();
        for field in &self.required {
            let present = match field.as_str() {
                "log_source" => query.log_source.as_deref().is_some_and(|s| !s.is_empty()),
                "verb" => query.verb.as_ref().is_some_and(|v| !v.is_empty()),
                "resource" => query.resource.as_ref().is_some_and(|v| !v.is_empty()),
                "namespace" => query.namespace.as_ref().is_some_and(|v| !v.is_empty()),
                "user" => query.user.as_ref().is_some_and(|v| !v.is_empty()),
                "timeframe" => query.timeframe.as_deref().is_some_and(|s| !s.is_empty()),
                other => {
                    tracing::warn!(field = other, "required_fields rule references unknown field");
                    true
                }
            };
            if !present {
                missing.push(field.clone());
            }
        }

        let passed = missing.is_empty();
        let message = if passed {
            "all required fields present".to_string()
        } else {
            format!("missing required fields: {}", missing.join(", "))
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

    fn rule() -> RequiredFieldsRule {
        RequiredFieldsRule {
            required: vec!["log_source".into(), "verb".into(), "resource".into()],
        }
    }

    #[test]
    fn fails_when_missing_verb() {
        let mut q = StructuredQuery::default();
        q.log_source = Some("kube-apiserver".into());
        q.resource = Some("pods".into());
        let result = rule().evaluate(&q);
        assert!(!result.passed);
        assert!(result.message.contains("verb"));
    }

    #[test]
    fn passes_when_all_present() {
        let mut q = StructuredQuery::default();
        q.log_source = Some("kube-apiserver".into());
        q.verb = Some("delete".into());
        q.resource = Some("pods".into());
        assert!(rule().evaluate(&q).passed);
    }
}
