//! Drives a single `ProcessingRequest` through the seven-step
//! pipeline and always resolves to a `ProcessingResponse` — failures
//! are encoded in the response, never surfaced as transport errors.

use std::sync::Arc;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::context::ContextManager;
use crate::demo;
use crate::dispatch::{ModelDispatcher, ModelRequest};
use crate::domain::request::{ProcessingRequest, ProcessingResponse};
use crate::errors::{ProcessingError, ProcessingErrorKind};
use crate::parser::{RecoveryParseError, RecoveryParser};
use crate::safety::SafetyValidator;

const SYSTEM_PROMPT: &str = "You translate a natural-language audit question about a Kubernetes-style \
audit log into a single JSON object matching the StructuredQuery schema. Respond with JSON only.";

pub struct Orchestrator {
    config: Arc<AppConfig>,
    context: Arc<ContextManager>,
    dispatcher: Arc<ModelDispatcher>,
    parser: Arc<RecoveryParser>,
    validator: Arc<SafetyValidator>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        context: Arc<ContextManager>,
        dispatcher: Arc<ModelDispatcher>,
        parser: Arc<RecoveryParser>,
        validator: Arc<SafetyValidator>,
    ) -> Self {
        Self { config, context, dispatcher, parser, validator }
    }

    pub async fn process(&self, request: ProcessingRequest) -> ProcessingResponse {
        if self.config.demo_mode {
            if let Some(response) = demo::canned_response(&request, &self.config) {
                return response;
            }
        }

        let span = tracing::info_span!("process_query", session_id = %request.session_id);
        self.process_inner(request).instrument(span).await
    }

    async fn process_inner(&self, request: ProcessingRequest) -> ProcessingResponse {
        // 1. resolve pronouns using the session.
        let resolved_query = self.context.resolve_pronouns(&request.query, &request.session_id).await;

        // 2. fetch or create conversation context (a no-op read here;
        // the context is materialized by `update` at the end of the
        // pipeline so a failed request never phantom-creates one).
        tracing::debug!(resolved_query = %resolved_query, "resolved pronoun references");

        // 3. dispatch to a model provider.
        let model_request = ModelRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_message: resolved_query.clone(),
            max_tokens: 1024,
            temperature: 0.0,
        };

        let raw_response = match self
            .dispatcher
            .dispatch(model_request, request.model_type.as_deref())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let error = ProcessingError::LlmProcessing(err);
                tracing::warn!(%error, "model dispatch failed");
                return ProcessingResponse::error(error.kind());
            }
        };

        // 4. parse to a StructuredQuery via the recovery parser. Field
        // mapping and schema normalization (step 5) happen inside
        // `RecoveryParser::parse` before it returns; a schema failure
        // there is distinguished from an extraction failure so it maps
        // to `normalization_failed` rather than `parsing_failed`.
        let parsed = match self.parser.parse(&raw_response.text, &raw_response.provider) {
            Ok(parsed) => parsed,
            Err(RecoveryParseError::Extraction(message)) => {
                let error = ProcessingError::Parsing(anyhow::anyhow!(message));
                tracing::warn!(%error, "parsing failed");
                return ProcessingResponse::error(error.kind());
            }
            Err(RecoveryParseError::Schema(message)) => {
                let error = ProcessingError::Normalization(anyhow::anyhow!(message));
                tracing::warn!(%error, "normalization failed");
                return ProcessingResponse::error(error.kind());
            }
        };

        // 6. validate via the safety validator.
        let validation = self.validator.validate(&parsed.query);
        if !validation.is_valid {
            return ProcessingResponse {
                structured_query: None,
                confidence: parsed.confidence,
                validation_info: Some(validation),
                error: Some(ProcessingErrorKind::ValidationFailed),
            };
        }

        // 7. update the session with the original query and the final
        // structured query. Never fails the request.
        self.context
            .update_with_user(&request.session_id, request.user_id.as_deref(), &request.query, &parsed.query)
            .await;

        ProcessingResponse {
            structured_query: Some(parsed.query),
            confidence: parsed.confidence,
            validation_info: Some(validation),
            error: None,
        }
    }
}
