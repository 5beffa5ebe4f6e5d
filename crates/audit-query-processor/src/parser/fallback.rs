//! Last-resort heuristic: builds a minimal `StructuredQuery` from
//! textual cues when every extractor in the ladder has failed.

use crate::domain::query::StructuredQuery;

/// The confidence constant surfaced by a fallback result. Always
/// below the configured threshold so callers can tell it apart from
/// a confident extraction; 0.7 mirrors the one the demo fixture
/// expects and is low enough to stay under any reasonable
/// `confidence_threshold`.
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

pub fn build_fallback_query(content: &str, default_limit: u32) -> StructuredQuery {
    let lower = content.to_lowercase();

    let log_source = if lower.contains("oauth") {
        "oauth-server"
    } else {
        "kube-apiserver"
    };

    let timeframe = if lower.contains("yesterday") {
        Some("yesterday".to_string())
    } else if lower.contains("today") {
        Some("today".to_string())
    } else {
        None
    };

    StructuredQuery {
        log_source: Some(log_source.to_string()),
        timeframe,
        limit: Some(default_limit),
        ..Default::default()
    }
}

/// Confidence returned for a fallback result, guaranteed to sit
/// strictly below `threshold`.
pub fn fallback_confidence(threshold: f64) -> f64 {
    if FALLBACK_CONFIDENCE < threshold {
        FALLBACK_CONFIDENCE
    } else {
        (threshold - 0.05).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_oauth_log_source() {
        let q = build_fallback_query("who logged into the oauth subsystem yesterday", 20);
        assert_eq!(q.log_source.as_deref(), Some("oauth-server"));
        assert_eq!(q.timeframe.as_deref(), Some("yesterday"));
    }

    #[test]
    fn defaults_to_kube_apiserver() {
        let q = build_fallback_query("who deleted the deployment", 20);
        assert_eq!(q.log_source.as_deref(), Some("kube-apiserver"));
        assert_eq!(q.limit, Some(20));
    }

    #[test]
    fn fallback_confidence_stays_below_threshold() {
        assert!(fallback_confidence(0.75) < 0.75);
        assert!(fallback_confidence(0.5) < 0.5);
    }
}
