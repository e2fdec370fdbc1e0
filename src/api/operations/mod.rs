//! Entity operations and batch compilation

pub mod batch;
pub mod operation;
pub mod operations;

pub use batch::{BatchOutcome, BatchResult};
pub use operation::Operation;
pub use operations::BatchOperations;
