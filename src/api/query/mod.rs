//! OData query construction
//!
//! Filter trees, the query model and the options types for the listing
//! operations.

pub mod filters;
pub mod options;
pub mod query;

pub use filters::Filter;
pub use options::{QueryEntitiesOptions, QueryTablesOptions};
pub use query::Query;
