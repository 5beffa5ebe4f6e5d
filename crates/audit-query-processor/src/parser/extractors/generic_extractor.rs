//! Last structured rung before the heuristic fallback: find the first
//! balanced JSON object anywhere in the content and parse it.

use crate::domain::query::StructuredQuery;
use crate::parser::strategy::{first_balanced_json_object, ExtractionOutcome, ExtractionStrategy, ParseError};

pub struct GenericExtractor {
    pub confidence: f64,
}

impl ExtractionStrategy for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn extract(&self, content: &str) -> Result<ExtractionOutcome, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::non_recoverable("empty content"));
        }

        let candidate =
            first_balanced_json_object(content).ok_or_else(|| ParseError::recoverable("no balanced JSON object found"))?;
        let value: serde_json::Value =
            serde_json::from_str(candidate).map_err(|e| ParseError::recoverable(format!("invalid JSON: {e}")))?;
        let query = StructuredQuery::from_json_value(value)
            .map_err(|e| ParseError::recoverable(format!("malformed structured query: {e}")))?;

        Ok(ExtractionOutcome { query, confidence: self.confidence, strategy: self.name() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_embedded_object() {
        let extractor = GenericExtractor { confidence: 0.85 };
        let content = "Sure, here you go: {\"verb\": \"delete\", \"resource\": \"pods\"} hope that helps";
        let outcome = extractor.extract(content).unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "delete");
    }

    #[test]
    fn rejects_content_with_no_json() {
        let extractor = GenericExtractor { confidence: 0.85 };
        assert!(extractor.extract("nothing useful here").is_err());
    }
}
