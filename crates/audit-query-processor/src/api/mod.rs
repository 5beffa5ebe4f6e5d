//! API module — external interfaces for the query translation pipeline.

pub mod docs_api;
pub mod error_envelope;
pub mod health_api;
pub mod query_api;

pub use docs_api::{docs_page, openapi_json, redoc_page};
pub use error_envelope::ErrorEnvelope;
pub use health_api::handle_health;
pub use query_api::{handle_query, reject_query_method};
