//! Tolerates the anthropic family's habit of wrapping JSON in
//! `<result>...</result>` tags or markdown code fences.

use crate::domain::query::StructuredQuery;
use crate::parser::strategy::{first_balanced_json_object, ExtractionOutcome, ExtractionStrategy, ParseError};

pub struct AnthropicExtractor {
    pub confidence: f64,
}

impl ExtractionStrategy for AnthropicExtractor {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn extract(&self, content: &str) -> Result<ExtractionOutcome, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::non_recoverable("empty content"));
        }

        let unwrapped = strip_result_tag(content);
        let unwrapped = strip_markdown_fence(unwrapped);

        let candidate = first_balanced_json_object(unwrapped)
            .ok_or_else(|| ParseError::recoverable("no JSON object in anthropic response"))?;
        let value: serde_json::Value =
            serde_json::from_str(candidate).map_err(|e| ParseError::recoverable(format!("invalid JSON: {e}")))?;
        let query = StructuredQuery::from_json_value(value)
            .map_err(|e| ParseError::recoverable(format!("malformed structured query: {e}")))?;

        Ok(ExtractionOutcome { query, confidence: self.confidence, strategy: self.name() })
    }
}

fn strip_result_tag(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find("<result>"), trimmed.find("</result>")) {
        (Some(start), Some(end)) if end > start => &trimmed[start + "<result>".len()..end],
        _ => trimmed,
    }
}

fn strip_markdown_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        return rest.trim_end_matches("```").trim();
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        return rest.trim_end_matches("```").trim();
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_result_tag() {
        let extractor = AnthropicExtractor { confidence: 0.95 };
        let content = "<result>{\"verb\": \"delete\"}</result>";
        let outcome = extractor.extract(content).unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "delete");
    }

    #[test]
    fn unwraps_markdown_fence() {
        let extractor = AnthropicExtractor { confidence: 0.95 };
        let content = "```json\n{\"verb\": \"get\"}\n```";
        let outcome = extractor.extract(content).unwrap();
        assert_eq!(outcome.query.verb.unwrap().first().unwrap(), "get");
    }
}
