use regex::Regex;

use crate::domain::query::StructuredQuery;
use crate::safety::rule::{RuleResult, Severity, ValidationRule};

/// The serialized query must not contain any configured forbidden
/// substring or regex. A configured pattern is tried as a plain
/// substring first; if it also parses as a valid regex it is matched
/// that way too, so `;--` catches the literal text while something
/// like `(?i)drop\s+table` still works as intended.
pub struct ForbiddenPatternsRule {
    pub patterns: Vec<String>,
}

impl ValidationRule for ForbiddenPatternsRule {
    fn id(&self) -> &'static str {
        "patterns"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, query: &StructuredQuery) -> RuleResult {
        let serialized = serde_json::to_string(query).unwrap_or_default();

        let mut hit = None;
        for pattern in &self.patterns {
            if serialized.contains(pattern.as_str()) {
                hit = Some(pattern.clone());
                break;
            }
            if let Ok(re) = Regex::new(pattern) {
                if re.is_match(&serialized) {
                    hit = Some(pattern.clone());
                    break;
                }
            }
        }

        let passed = hit.is_none();
        let message = match &hit {
            Some(p) => format!("matched forbidden pattern '{p}'"),
            None => "no forbidden pattern matched".to_string(),
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
    fn catches_substring() {
        let rule = ForbiddenPatternsRule { patterns: vec!["DROP TABLE".into()] };
        let mut q = StructuredQuery::default();
        q.resource_name_pattern = Some("DROP TABLE users".into());
        assert!(!rule.evaluate(&q).passed);
    }

    #[test]
    fn catches_regex_pattern() {
        let rule = ForbiddenPatternsRule { patterns: vec![r"(?i)drop\s+table".into()] };
        let mut q = StructuredQuery::default();
        q.resource_name_pattern = Some("Drop   Table".into());
        assert!(!rule.evaluate(&q).passed);
    }

    #[test]
    fn passes_clean_query() {
        let rule = ForbiddenPatternsRule { patterns: vec!["DROP TABLE".into()] };
        let q = StructuredQuery::default();
        assert!(rule.evaluate(&q).passed);
    }
}
