//! Serialization collaborators
//!
//! The proxy core consumes these narrow traits; the submodules provide the
//! default implementations wired up by `TableClient::new`.

pub mod atom;
pub mod mime;
pub mod xml;

pub use atom::AtomReaderWriter;
pub use mime::{EncodedMime, MimeReaderWriter};
pub use xml::XmlAclSerializer;

use crate::api::acl::TableAcl;
use crate::api::entity::Entity;

/// Entity and table-descriptor (de)serialization in the service's Atom
/// dialect.
pub trait EntitySerializer: Send + Sync {
    fn serialize_table(&self, name: &str) -> anyhow::Result<Vec<u8>>;
    fn parse_table(&self, body: &[u8]) -> anyhow::Result<String>;
    fn parse_table_entries(&self, body: &[u8]) -> anyhow::Result<Vec<String>>;
    fn serialize_entity(&self, entity: &Entity) -> anyhow::Result<Vec<u8>>;
    fn parse_entity(&self, body: &[u8]) -> anyhow::Result<Entity>;
    fn parse_entities(&self, body: &[u8]) -> anyhow::Result<Vec<Entity>>;
}

/// MIME multipart framing for batch changesets.
pub trait MimeSerializer: Send + Sync {
    /// Wrap HTTP-message texts into a changeset inside a batch body.
    fn encode_parts(&self, parts: &[String]) -> EncodedMime;
    /// Split a batch response body into its per-part texts.
    fn decode_parts(&self, body: &str) -> anyhow::Result<Vec<String>>;
}

/// Structured (de)serialization for ACL payloads.
pub trait AclSerializer: Send + Sync {
    fn serialize(&self, acl: &TableAcl) -> anyhow::Result<Vec<u8>>;
    fn deserialize(&self, body: &[u8]) -> anyhow::Result<TableAcl>;
}
