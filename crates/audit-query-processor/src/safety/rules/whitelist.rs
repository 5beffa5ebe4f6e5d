use crate::domain::query::StructuredQuery;
use crate::safety::rule::{RuleResult, Severity, ValidationRule};

/// `log_source`, `verb`, and `resource` values (scalar or array
/// elements) must each appear in their respective configured
/// allow-list.
pub struct WhitelistRule {
    pub log_source_whitelist: Vec<String>,
    pub verb_whitelist: Vec<String>,
    pub resource_whitelist: Vec<String>,
}

impl ValidationRule for WhitelistRule {
    fn id(&self) -> &'static str {
        "whitelist"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, query: &StructuredQuery) -> RuleResult {
        let mut violations = Vec::new();

        if let Some(ls) = &query.log_source {
            if !self.log_source_whitelist.iter().any(|w| w == ls) {
                violations.push(format!("log_source '{ls}' not allowed"));
            }
        }
        if let Some(verb) = &query.verb {
            for v in verb.as_list() {
                if !self.verb_whitelist.iter().any(|w| w == v) {
                    violations.push(format!("verb '{v}' not allowed"));
                }
            }
        }
        if let Some(resource) = &query.resource {
            for r in resource.as_list() {
                if !self.resource_whitelist.iter().any(|w| w == r) {
                    violations.push(format!("resource '{r}' not allowed"));
                }
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            "log_source, verb, resource all within allow-lists".to_string()
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
    use crate::domain::query::OneOrMany;

    fn rule() -> WhitelistRule {
        WhitelistRule {
            log_source_whitelist: vec!["kube-apiserver".into()],
            verb_whitelist: vec!["get".into(), "delete".into()],
            resource_whitelist: vec!["pods".into()],
        }
    }

    #[test]
    fn rejects_unlisted_verb() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("exec".into()));
        assert!(!rule().evaluate(&q).passed);
    }

    #[test]
    fn rejects_one_bad_element_in_list() {
        let mut q = StructuredQuery::default();
        q.resource = Some(OneOrMany::List(vec!["pods".into(), "secrets".into()]));
        let result = rule().evaluate(&q);
        assert!(!result.passed);
        assert!(result.message.contains("secrets"));
    }
}
