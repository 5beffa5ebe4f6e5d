//! `POST /query` — translate one natural-language audit question.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use crate::api::error_envelope::ErrorEnvelope;
use crate::domain::request::ProcessingRequest;
use crate::metrics;
use crate::state::AppState;

/// Extracts the `<user-id>` out of `Authorization: Bearer user:<user-id>`.
/// Any other scheme or value is ignored, per the §6 stub note.
fn extract_user_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    token.strip_prefix("user:").map(|s| s.to_string())
}

pub async fn handle_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<ProcessingRequest>,
) -> Response {
    if let Err((error_type, message)) = request.validate() {
        metrics::inc_request("query", "400");
        let (status, body) = ErrorEnvelope::new(StatusCode::BAD_REQUEST, error_type, message);
        return (status, body).into_response();
    }

    request.user_id = extract_user_id(&headers);

    let response = state.orchestrator.process(request).await;

    if let Some(kind) = response.error {
        use crate::errors::ProcessingErrorKind;

        error!(?kind, "query processing failed");
        metrics::inc_request("query", "error");
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Validation failures carry their rule-level detail in
        // `validation_info`; the richer ProcessingResponse body is
        // returned directly rather than flattened into the generic
        // error envelope.
        if matches!(kind, ProcessingErrorKind::ValidationFailed) {
            return (status, Json(response)).into_response();
        }

        let message = match kind {
            ProcessingErrorKind::NormalizationFailed => "structured query failed schema normalization",
            ProcessingErrorKind::LlmProcessingFailed => "no healthy model provider was able to service this request",
            ProcessingErrorKind::ParsingFailed => "the model response could not be parsed into a structured query",
            ProcessingErrorKind::ContextResolutionFailed => "failed to resolve session context",
            ProcessingErrorKind::ValidationFailed => unreachable!(),
        };
        let (status, body) = ErrorEnvelope::from_kind(kind, message);
        return (status, body).into_response();
    }

    info!("query processed successfully");
    metrics::inc_request("query", "200");
    (StatusCode::OK, Json(response)).into_response()
}

/// Registered as the fallback on the `/query` route so any method
/// other than POST gets the documented envelope instead of axum's
/// bare default 405.
pub async fn reject_query_method() -> Response {
    metrics::inc_request("query", "405");
    let (status, body) = ErrorEnvelope::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "Invalid request",
        "Only POST is supported on this endpoint",
    );
    (status, body).into_response()
}
