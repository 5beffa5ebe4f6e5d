//! Accepts plain JSON or fenced JSON from the openai family.

use crate::domain::query::StructuredQuery;
use crate::parser::strategy::{first_balanced_json_object, ExtractionOutcome, ExtractionStrategy, ParseError};

pub struct OpenAiExtractor {
    pub confidence: f64,
}

impl ExtractionStrategy for OpenAiExtractor {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn extract(&self, content: &str) -> Result<ExtractionOutcome, ParseError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ParseError::non_recoverable("empty content"));
        }

        let unfenced = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .map(|rest| rest.trim_end_matches("```").trim())
            .unwrap_or(trimmed);

        let candidate = first_balanced_json_object(unfenced)
            .ok_or_else(|| ParseError::recoverable("no JSON object in openai response"))?;
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
    fn parses_plain_json() {
        let extractor = OpenAiExtractor { confidence: 0.9 };
        let outcome = extractor.extract("{\"verb\": \"list\"}").unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "list");
    }

    #[test]
    fn parses_fenced_json() {
        let extractor = OpenAiExtractor { confidence: 0.9 };
        let outcome = extractor.extract("```json\n{\"verb\": \"list\"}\n```").unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "list");
    }
}
