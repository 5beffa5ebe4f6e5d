//! Error taxonomy surfaced on `ProcessingResponse.error`.
//!
//! Nothing here is returned across the HTTP boundary as a transport
//! error: the orchestrator always resolves to a `ProcessingResponse`,
//! and the HTTP layer maps that response's `error` field (if any) to
//! a 4xx/5xx envelope.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingErrorKind {
    ContextResolutionFailed,
    LlmProcessingFailed,
    ParsingFailed,
    NormalizationFailed,
    ValidationFailed,
}

impl ProcessingErrorKind {
    /// HTTP status code the transport layer should map this to.
    pub fn status_code(&self) -> u16 {
        match self {
            ProcessingErrorKind::ContextResolutionFailed => 500,
            ProcessingErrorKind::LlmProcessingFailed => 500,
            ProcessingErrorKind::ParsingFailed => 500,
            ProcessingErrorKind::NormalizationFailed => 400,
            ProcessingErrorKind::ValidationFailed => 400,
        }
    }
}

/// Internal orchestration error carrying both the taxonomy tag and a
/// human-readable cause, kept separate from the `anyhow::Error` used
/// by lower I/O and provider layers per the teacher's convention of
/// `anyhow` at the boundary and a typed enum where callers must match.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("context resolution failed: {0}")]
    ContextResolution(#[source] anyhow::Error),
    #[error("llm processing failed: {0}")]
    LlmProcessing(#[source] anyhow::Error),
    #[error("parsing failed: {0}")]
    Parsing(#[source] anyhow::Error),
    #[error("normalization failed: {0}")]
    Normalization(#[source] anyhow::Error),
    #[error("validation failed: {0}")]
    Validation(#[source] anyhow::Error),
}

impl ProcessingError {
    pub fn kind(&self) -> ProcessingErrorKind {
        match self {
            ProcessingError::ContextResolution(_) => ProcessingErrorKind::ContextResolutionFailed,
            ProcessingError::LlmProcessing(_) => ProcessingErrorKind::LlmProcessingFailed,
            ProcessingError::Parsing(_) => ProcessingErrorKind::ParsingFailed,
            ProcessingError::Normalization(_) => ProcessingErrorKind::NormalizationFailed,
            ProcessingError::Validation(_) => ProcessingErrorKind::ValidationFailed,
        }
    }
}
