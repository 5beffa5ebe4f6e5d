//! Wire-adjacent request/response shapes for a single translation call.

use serde::{Deserialize, Serialize};

use crate::domain::query::StructuredQuery;
use crate::errors::ProcessingErrorKind;
use crate::safety::rule::ValidationResult;

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingRequest {
    pub query: String,
    pub session_id: String,
    #[serde(default)]
    pub model_type: Option<String>,
    /// Bearer token subject extracted at the HTTP boundary (see
    /// §6's Authorization stub); not part of the wire envelope.
    #[serde(skip)]
    pub user_id: Option<String>,
}

impl ProcessingRequest {
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        if self.query.trim().is_empty() {
            return Err(("Invalid request", "query is required and cannot be empty".to_string()));
        }
        if self.query.chars().count() > 1000 {
            return Err(("Invalid request", "query must be at most 1000 characters".to_string()));
        }
        if self.session_id.is_empty() {
            return Err(("Invalid request", "session_id is required".to_string()));
        }
        if self.session_id.chars().count() > 100 {
            return Err(("Invalid request", "session_id must be at most 100 characters".to_string()));
        }
        if let Some(ref mt) = self.model_type {
            if mt.chars().count() > 50 {
                return Err(("Invalid request", "model_type must be at most 50 characters".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_query: Option<StructuredQuery>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_info: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingErrorKind>,
}

impl ProcessingResponse {
    pub fn error(kind: ProcessingErrorKind) -> Self {
        Self {
            structured_query: None,
            confidence: 0.0,
            validation_info: None,
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
