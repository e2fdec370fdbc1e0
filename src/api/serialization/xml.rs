//! ACL document (de)serialization

use anyhow::Context;

use crate::api::acl::TableAcl;
use crate::api::serialization::AclSerializer;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Serde-backed XML serializer for `SignedIdentifiers` payloads.
#[derive(Debug, Clone, Default)]
pub struct XmlAclSerializer;

impl XmlAclSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl AclSerializer for XmlAclSerializer {
    fn serialize(&self, acl: &TableAcl) -> anyhow::Result<Vec<u8>> {
        let document = quick_xml::se::to_string(acl).context("failed to serialize table ACL")?;
        Ok(format!("{}{}", XML_DECLARATION, document).into_bytes())
    }

    fn deserialize(&self, body: &[u8]) -> anyhow::Result<TableAcl> {
        let text = std::str::from_utf8(body).context("ACL payload is not valid UTF-8")?;
        quick_xml::de::from_str(text).context("failed to parse table ACL")
    }
}
