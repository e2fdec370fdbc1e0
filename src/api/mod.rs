//! Table storage service client
//!
//! Turns typed operations (create table, query/insert/update/merge/delete
//! entity, atomic batches, ACL get/set) into wire-correct HTTP requests and
//! maps the responses back into typed results. The HTTP transport and the
//! Atom/MIME/ACL serializers are collaborators behind narrow traits, with
//! default implementations wired up by [`TableClient::new`].

pub mod acl;
pub mod blocking;
pub mod client;
pub mod constants;
pub mod context;
pub mod edm;
pub mod encoding;
pub mod entity;
pub mod error;
pub mod models;
pub mod operations;
pub mod query;
pub mod serialization;
pub mod transport;

pub use acl::{AccessPolicy, SignedIdentifier, TableAcl};
pub use client::TableClient;
pub use context::RequestContext;
pub use edm::{EdmType, EdmValue};
pub use entity::{Entity, Property};
pub use error::TableError;
pub use models::{
    DeleteEntityOptions, GetEntityResult, GetTableResult, InsertEntityResult, LocationMode,
    QueryEntitiesResult, QueryTablesResult, TableServiceOptions, UpdateEntityResult,
};
pub use operations::{BatchOperations, BatchOutcome, BatchResult, Operation};
pub use query::{Filter, Query, QueryEntitiesOptions, QueryTablesOptions};
pub use serialization::{AclSerializer, EntitySerializer, MimeSerializer};
pub use transport::{ReqwestTransport, RetryConfig, Transport, TransportResponse};
