//! Drives the strategy ladder: specific extractor, generic extractor,
//! fallback heuristic, honoring `confidence_threshold` and classifying
//! errors into recoverable/non-recoverable along the way.

use crate::config::AppConfig;
use crate::domain::query::StructuredQuery;
use crate::parser::extractors::{AnthropicExtractor, GenericExtractor, LocalExtractor, OpenAiExtractor};
use crate::parser::fallback::{build_fallback_query, fallback_confidence};
use crate::parser::field_mapper::map_fields;
use crate::parser::json_normalizer::normalize;
use crate::parser::schema_validator::SchemaValidator;
use crate::parser::strategy::{ExtractionOutcome, ExtractionStrategy, ParseErrorKind};
use crate::metrics;

pub struct ParsedQuery {
    pub query: StructuredQuery,
    pub confidence: f64,
    pub strategy: &'static str,
}

/// Distinguishes a failure to extract/parse a model response at all
/// from a failure of an already-extracted query to pass schema
/// normalization, so the orchestrator can map them to distinct error
/// kinds (`parsing_failed` vs `normalization_failed`).
#[derive(Debug)]
pub enum RecoveryParseError {
    Extraction(String),
    Schema(String),
}

impl std::fmt::Display for RecoveryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryParseError::Extraction(message) => write!(f, "{message}"),
            RecoveryParseError::Schema(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for RecoveryParseError {}

pub struct RecoveryParser {
    confidence_threshold: f64,
    default_limit: u32,
    schema: SchemaValidator,
}

impl RecoveryParser {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            default_limit: config.default_limit,
            schema: SchemaValidator {
                verb_allow_list: config.verb_whitelist.clone(),
                min_limit: 1,
                max_limit: 1000,
            },
        }
    }

    /// `provider_family` selects the specific extractor tried first
    /// (falls back to the generic ladder rung for unknown families).
    pub fn parse(&self, content: &str, provider_family: &str) -> Result<ParsedQuery, RecoveryParseError> {
        let specific: Box<dyn ExtractionStrategy> = match provider_family {
            "anthropic" => Box::new(AnthropicExtractor { confidence: 0.95 }),
            "openai" => Box::new(OpenAiExtractor { confidence: 0.9 }),
            "ollama" => Box::new(LocalExtractor { confidence: 0.8 }),
            _ => Box::new(GenericExtractor { confidence: 0.85 }),
        };
        let generic = GenericExtractor { confidence: 0.85 };

        for extractor in [specific.as_ref(), &generic] {
            match extractor.extract(content) {
                Ok(outcome) if outcome.confidence >= self.confidence_threshold => {
                    metrics::inc_parser_strategy_win(outcome.strategy);
                    return self.finish(outcome);
                }
                Ok(_) => continue,
                Err(e) if e.kind == ParseErrorKind::NonRecoverable => {
                    return Err(RecoveryParseError::Extraction(e.message));
                }
                Err(_) => continue,
            }
        }

        let fallback_query = build_fallback_query(content, self.default_limit);
        let confidence = fallback_confidence(self.confidence_threshold);
        metrics::inc_parser_strategy_win("fallback");
        self.finish(ExtractionOutcome { query: fallback_query, confidence, strategy: "fallback" })
    }

    fn finish(&self, outcome: ExtractionOutcome) -> Result<ParsedQuery, RecoveryParseError> {
        let normalized = normalize(outcome.query, self.default_limit);
        let mapped = map_fields(normalized);

        if outcome.strategy != "fallback" {
            self.schema.check(&mapped).map_err(|e| RecoveryParseError::Schema(e.0))?;
        }

        Ok(ParsedQuery { query: mapped, confidence: outcome.confidence, strategy: outcome.strategy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;

    #[test]
    fn specific_extractor_wins_when_confident() {
        let parser = RecoveryParser::new(&test_config());
        let content = "<result>{\"verb\": \"delete\", \"resource\": \"pods\"}</result>";
        let parsed = parser.parse(content, "anthropic").unwrap();
        assert_eq!(parsed.strategy, "anthropic");
        assert!(parsed.confidence >= test_config().confidence_threshold);
    }

    #[test]
    fn falls_through_to_heuristic_on_unparseable_content() {
        let parser = RecoveryParser::new(&test_config());
        let parsed = parser.parse("I couldn't find anything about that today", "anthropic").unwrap();
        assert_eq!(parsed.strategy, "fallback");
        assert!(parsed.confidence < test_config().confidence_threshold);
        assert_eq!(parsed.query.timeframe.as_deref(), Some("today"));
    }

    #[test]
    fn rejects_zero_byte_content() {
        let parser = RecoveryParser::new(&test_config());
        assert!(parser.parse("", "anthropic").is_err());
    }
}
