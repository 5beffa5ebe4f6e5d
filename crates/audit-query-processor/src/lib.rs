pub mod api;
pub mod config;
pub mod context;
pub mod demo;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod http_server;
pub mod metrics;
pub mod orchestrator;
pub mod parser;
pub mod safety;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use domain::{OneOrMany, ProcessingRequest, ProcessingResponse, StructuredQuery};
pub use errors::{ProcessingError, ProcessingErrorKind};
pub use http_server::run_server;
pub use orchestrator::Orchestrator;
