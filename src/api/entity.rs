//! Table entity model

use std::collections::BTreeMap;

use crate::api::edm::{EdmType, EdmValue};
use crate::api::error::TableError;

pub const PARTITION_KEY: &str = "PartitionKey";
pub const ROW_KEY: &str = "RowKey";

/// A typed entity property. `value: None` encodes a typed null.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub edm_type: EdmType,
    pub value: Option<EdmValue>,
}

impl Property {
    pub fn new(value: impl Into<EdmValue>) -> Self {
        let value = value.into();
        Self {
            edm_type: value.edm_type(),
            value: Some(value),
        }
    }

    pub fn null(edm_type: EdmType) -> Self {
        Self {
            edm_type,
            value: None,
        }
    }
}

/// An entity: named typed properties plus the mandatory PartitionKey/RowKey
/// pair and an optional ETag.
///
/// ETag presence means "known version"; absence means writes are
/// unconditional (wildcard concurrency).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    properties: BTreeMap<String, Property>,
    etag: Option<String>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor with the mandatory key pair in place.
    pub fn with_keys(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        let mut entity = Self::new();
        entity.set_partition_key(partition_key);
        entity.set_row_key(row_key);
        entity
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<EdmValue>) -> &mut Self {
        self.properties.insert(name.into(), Property::new(value));
        self
    }

    pub fn insert_null(&mut self, name: impl Into<String>, edm_type: EdmType) -> &mut Self {
        self.properties.insert(name.into(), Property::null(edm_type));
        self
    }

    pub fn insert_property(&mut self, name: impl Into<String>, property: Property) -> &mut Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }

    fn string_property(&self, name: &str) -> Option<&str> {
        match self.properties.get(name)?.value.as_ref()? {
            EdmValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn partition_key(&self) -> Option<&str> {
        self.string_property(PARTITION_KEY)
    }

    pub fn set_partition_key(&mut self, partition_key: impl Into<String>) -> &mut Self {
        self.insert(PARTITION_KEY, partition_key.into())
    }

    pub fn row_key(&self) -> Option<&str> {
        self.string_property(ROW_KEY)
    }

    pub fn set_row_key(&mut self, row_key: impl Into<String>) -> &mut Self {
        self.insert(ROW_KEY, row_key.into())
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn set_etag(&mut self, etag: impl Into<String>) -> &mut Self {
        self.etag = Some(etag.into());
        self
    }

    /// An entity is valid for writes once both keys are present.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.partition_key().is_none() {
            return Err(TableError::validation("entity is missing PartitionKey").into());
        }
        if self.row_key().is_none() {
            return Err(TableError::validation("entity is missing RowKey").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_properties() {
        let mut entity = Entity::with_keys("pk", "rk");
        entity.insert("Age", 30i32);
        entity.insert_null("Nickname", EdmType::String);

        assert_eq!(entity.partition_key(), Some("pk"));
        assert_eq!(entity.row_key(), Some("rk"));
        assert_eq!(
            entity.property("Age").unwrap().value,
            Some(EdmValue::Int32(30))
        );
        assert_eq!(entity.property("Nickname").unwrap().value, None);
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_validation_requires_both_keys() {
        let mut entity = Entity::new();
        assert!(entity.validate().is_err());
        entity.set_partition_key("pk");
        assert!(entity.validate().is_err());
        entity.set_row_key("rk");
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_etag_presence_is_optional() {
        let mut entity = Entity::with_keys("pk", "rk");
        assert_eq!(entity.etag(), None);
        entity.set_etag("W/\"datetime'2020-01-01'\"");
        assert!(entity.etag().unwrap().starts_with("W/"));
    }
}
