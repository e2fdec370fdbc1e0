//! Atom entry/feed reading and writing
//!
//! Entities and table descriptors travel as Atom `<entry>` documents with the
//! data-services property extension; listings come back as `<feed>`s.

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use roxmltree::{Document, Node};

use crate::api::edm::{EdmType, EdmValue};
use crate::api::entity::{Entity, Property};
use crate::api::serialization::EntitySerializer;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
const META_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

const TABLE_NAME_PROPERTY: &str = "TableName";

/// Default Atom serializer.
#[derive(Debug, Clone, Default)]
pub struct AtomReaderWriter;

impl AtomReaderWriter {
    pub fn new() -> Self {
        Self
    }

    fn entry_envelope(&self, properties_xml: &str) -> String {
        let updated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>\n",
                "<entry xmlns:d=\"{d}\" xmlns:m=\"{m}\" xmlns=\"{atom}\">",
                "<title/>",
                "<updated>{updated}</updated>",
                "<author><name/></author>",
                "<id/>",
                "<content type=\"application/xml\">",
                "<m:properties>{properties}</m:properties>",
                "</content>",
                "</entry>"
            ),
            d = DATA_NS,
            m = META_NS,
            atom = ATOM_NS,
            updated = updated,
            properties = properties_xml,
        )
    }

    fn property_xml(&self, name: &str, property: &Property) -> String {
        let type_attr = if property.edm_type == EdmType::String {
            String::new()
        } else {
            format!(" m:type=\"{}\"", property.edm_type)
        };

        match &property.value {
            None => format!("<d:{}{} m:null=\"true\"/>", name, type_attr),
            Some(value) => format!(
                "<d:{name}{type_attr}>{text}</d:{name}>",
                name = name,
                type_attr = type_attr,
                text = escape(&value.serialize_atom_value()),
            ),
        }
    }

    fn parse_document(&self, body: &[u8]) -> anyhow::Result<String> {
        Ok(std::str::from_utf8(body)
            .context("Atom payload is not valid UTF-8")?
            .to_string())
    }

    fn entity_from_entry(&self, entry: Node) -> anyhow::Result<Entity> {
        let mut entity = Entity::new();

        if let Some(etag) = entry.attribute((META_NS, "etag")) {
            entity.set_etag(etag);
        }

        let properties = entry
            .descendants()
            .find(|node| node.has_tag_name((META_NS, "properties")))
            .context("Atom entry has no m:properties element")?;

        for node in properties.children().filter(Node::is_element) {
            let name = node.tag_name().name().to_string();
            let edm_type = EdmType::parse(node.attribute((META_NS, "type")))?;
            let is_null = node.attribute((META_NS, "null")) == Some("true");

            let property = if is_null {
                Property::null(edm_type)
            } else {
                let text = node.text().unwrap_or_default();
                Property {
                    edm_type,
                    value: Some(EdmValue::parse_atom_value(edm_type, text)?),
                }
            };
            entity.insert_property(name, property);
        }

        Ok(entity)
    }

    fn table_name_from_entry(&self, entry: Node) -> anyhow::Result<String> {
        entry
            .descendants()
            .find(|node| node.has_tag_name((DATA_NS, TABLE_NAME_PROPERTY)))
            .and_then(|node| node.text())
            .map(str::to_string)
            .context("Atom entry has no TableName property")
    }
}

impl EntitySerializer for AtomReaderWriter {
    fn serialize_table(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        let property = format!(
            "<d:{tag}>{name}</d:{tag}>",
            tag = TABLE_NAME_PROPERTY,
            name = escape(name)
        );
        Ok(self.entry_envelope(&property).into_bytes())
    }

    fn parse_table(&self, body: &[u8]) -> anyhow::Result<String> {
        let text = self.parse_document(body)?;
        let doc = Document::parse(&text).context("invalid Atom XML")?;
        let entry = doc
            .descendants()
            .find(|node| node.has_tag_name((ATOM_NS, "entry")))
            .context("Atom document has no entry")?;
        self.table_name_from_entry(entry)
    }

    fn parse_table_entries(&self, body: &[u8]) -> anyhow::Result<Vec<String>> {
        let text = self.parse_document(body)?;
        let doc = Document::parse(&text).context("invalid Atom XML")?;
        doc.descendants()
            .filter(|node| node.has_tag_name((ATOM_NS, "entry")))
            .map(|entry| self.table_name_from_entry(entry))
            .collect()
    }

    fn serialize_entity(&self, entity: &Entity) -> anyhow::Result<Vec<u8>> {
        let properties: String = entity
            .properties()
            .iter()
            .map(|(name, property)| self.property_xml(name, property))
            .collect();
        Ok(self.entry_envelope(&properties).into_bytes())
    }

    fn parse_entity(&self, body: &[u8]) -> anyhow::Result<Entity> {
        let text = self.parse_document(body)?;
        let doc = Document::parse(&text).context("invalid Atom XML")?;
        let entry = doc
            .descendants()
            .find(|node| node.has_tag_name((ATOM_NS, "entry")))
            .context("Atom document has no entry")?;
        self.entity_from_entry(entry)
    }

    fn parse_entities(&self, body: &[u8]) -> anyhow::Result<Vec<Entity>> {
        let text = self.parse_document(body)?;
        let doc = Document::parse(&text).context("invalid Atom XML")?;
        doc.descendants()
            .filter(|node| node.has_tag_name((ATOM_NS, "entry")))
            .map(|entry| self.entity_from_entry(entry))
            .collect()
    }
}
