//! Batch changeset compilation and response decoding

pub mod builder;
pub mod parser;

pub use builder::{build_batch_body, build_contexts};
pub use parser::{BatchOutcome, BatchResult, parse_batch_response};
