use chrono::{DateTime, Utc};

use crate::domain::query::StructuredQuery;
use crate::safety::rule::{RuleResult, Severity, ValidationRule};

/// If `timeframe` is present it must be one of the configured allowed
/// values; if `time_range` is used instead, its span must not exceed
/// the configured maximum.
pub struct TimeframeRule {
    pub allowed_timeframes: Vec<String>,
    pub max_span: chrono::Duration,
}

impl ValidationRule for TimeframeRule {
    fn id(&self) -> &'static str {
        "timeframe"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn evaluate(&self, query: &StructuredQuery) -> RuleResult {
        if let Some(tf) = &query.timeframe {
            let passed = self.allowed_timeframes.iter().any(|a| a == tf);
            let message = if passed {
                format!("timeframe '{tf}' allowed")
            } else {
                format!("timeframe '{tf}' not in allowed list")
            };
            return RuleResult { rule_name: self.id().to_string(), passed, severity: self.severity(), message };
        }

        if let Some(range) = &query.time_range {
            let (start, end) = (
                DateTime::parse_from_rfc3339(&range.start),
                DateTime::parse_from_rfc3339(&range.end),
            );
            return match (start, end) {
                (Ok(start), Ok(end)) => {
                    let span = end.with_timezone(&Utc) - start.with_timezone(&Utc);
                    let passed = span <= self.max_span && span >= chrono::Duration::zero();
                    let message = if passed {
                        "time_range within configured span".to_string()
                    } else {
                        "time_range exceeds configured maximum span".to_string()
                    };
                    RuleResult { rule_name: self.id().to_string(), passed, severity: self.severity(), message }
                }
                _ => RuleResult {
                    rule_name: self.id().to_string(),
                    passed: false,
                    severity: self.severity(),
                    message: "time_range start/end are not valid RFC3339 timestamps".to_string(),
                },
            };
        }

        RuleResult {
            rule_name: self.id().to_string(),
            passed: true,
            severity: self.severity(),
            message: "no timeframe or time_range present".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> TimeframeRule {
        TimeframeRule {
            allowed_timeframes: vec!["today".into(), "yesterday".into()],
            max_span: chrono::Duration::days(30),
        }
    }

    #[test]
    fn accepts_allowed_timeframe() {
        let mut q = StructuredQuery::default();
        q.timeframe = Some("yesterday".into());
        assert!(rule().evaluate(&q).passed);
    }

    #[test]
    fn rejects_unknown_timeframe() {
        let mut q = StructuredQuery::default();
        q.timeframe = Some("last_year".into());
        assert!(!rule().evaluate(&q).passed);
    }

    #[test]
    fn passes_absent_timeframe() {
        assert!(rule().evaluate(&StructuredQuery::default()).passed);
    }
}
