//! Client library for OData-flavored cloud table storage services.

pub mod api;
