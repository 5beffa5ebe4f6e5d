//! Tolerates the leading prose small local models tend to prepend
//! before the actual JSON payload.

use crate::domain::query::StructuredQuery;
use crate::parser::strategy::{first_balanced_json_object, ExtractionOutcome, ExtractionStrategy, ParseError};

pub struct LocalExtractor {
    pub confidence: f64,
}

impl ExtractionStrategy for LocalExtractor {
    fn name(&self) -> &'static str {
        "local"
    }

    fn extract(&self, content: &str) -> Result<ExtractionOutcome, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::non_recoverable("empty content"));
        }

        let candidate = first_balanced_json_object(content)
            .ok_or_else(|| ParseError::recoverable("no JSON object in local model response"))?;
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
    fn tolerates_leading_prose() {
        let extractor = LocalExtractor { confidence: 0.8 };
        let content = "Sure thing! Based on your question, here is what I found:\n{\"verb\": \"delete\"}";
        let outcome = extractor.extract(content).unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "delete");
    }
}
