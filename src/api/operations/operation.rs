//! Batch operation variants

use crate::api::entity::Entity;

/// A single entity operation inside a changeset.
///
/// The enum is closed: every variant the service understands is represented,
/// so an unrecognized operation cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert a new entity; fails if the key pair already exists.
    Insert { table: String, entity: Entity },
    /// Replace an existing entity, conditional on its ETag.
    Update { table: String, entity: Entity },
    /// Merge properties into an existing entity, conditional on its ETag.
    Merge { table: String, entity: Entity },
    /// Insert, or replace unconditionally when the entity exists.
    InsertOrReplace { table: String, entity: Entity },
    /// Insert, or merge unconditionally when the entity exists.
    InsertOrMerge { table: String, entity: Entity },
    /// Delete by key pair; `etag: None` deletes unconditionally.
    Delete {
        table: String,
        partition_key: String,
        row_key: String,
        etag: Option<String>,
    },
}

impl Operation {
    pub fn insert(table: impl Into<String>, entity: Entity) -> Self {
        Self::Insert {
            table: table.into(),
            entity,
        }
    }

    pub fn update(table: impl Into<String>, entity: Entity) -> Self {
        Self::Update {
            table: table.into(),
            entity,
        }
    }

    pub fn merge(table: impl Into<String>, entity: Entity) -> Self {
        Self::Merge {
            table: table.into(),
            entity,
        }
    }

    pub fn insert_or_replace(table: impl Into<String>, entity: Entity) -> Self {
        Self::InsertOrReplace {
            table: table.into(),
            entity,
        }
    }

    pub fn insert_or_merge(table: impl Into<String>, entity: Entity) -> Self {
        Self::InsertOrMerge {
            table: table.into(),
            entity,
        }
    }

    pub fn delete(
        table: impl Into<String>,
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        etag: Option<String>,
    ) -> Self {
        Self::Delete {
            table: table.into(),
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            etag,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Merge { table, .. }
            | Self::InsertOrReplace { table, .. }
            | Self::InsertOrMerge { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }

    /// Whether this operation carries an entity body.
    pub fn is_write_with_body(&self) -> bool {
        !matches!(self, Self::Delete { .. })
    }

    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Merge { .. } => "merge",
            Self::InsertOrReplace { .. } => "insert_or_replace",
            Self::InsertOrMerge { .. } => "insert_or_merge",
            Self::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_accessors() {
        let insert = Operation::insert("people", Entity::with_keys("p", "r"));
        assert_eq!(insert.table(), "people");
        assert_eq!(insert.operation_type(), "insert");
        assert!(insert.is_write_with_body());

        let delete = Operation::delete("people", "p", "r", Some("W/1".to_string()));
        assert_eq!(delete.operation_type(), "delete");
        assert!(!delete.is_write_with_body());
    }
}
