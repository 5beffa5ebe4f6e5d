//! The `{error:{type,message,code},timestamp}` envelope every 4xx/5xx
//! response carries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::errors::ProcessingErrorKind;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub code: u16,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        let envelope = Self {
            error: ErrorBody { error_type: error_type.into(), message: message.into(), code: status.as_u16() },
            timestamp: Utc::now(),
        };
        (status, Json(envelope))
    }

    pub fn from_kind(kind: ProcessingErrorKind, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, format!("{kind:?}"), message)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
