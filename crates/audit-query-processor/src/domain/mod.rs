pub mod query;
pub mod request;

pub use query::{OneOrMany, StructuredQuery, TimeRange};
pub use request::{ProcessingRequest, ProcessingResponse};
