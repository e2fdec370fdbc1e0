//! Ordered collection of batch operations

use super::operation::Operation;
use crate::api::entity::Entity;

/// Operations to run as one atomic changeset, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BatchOperations {
    operations: Vec<Operation>,
}

impl BatchOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn insert_entity(self, table: impl Into<String>, entity: Entity) -> Self {
        self.add(Operation::insert(table, entity))
    }

    pub fn update_entity(self, table: impl Into<String>, entity: Entity) -> Self {
        self.add(Operation::update(table, entity))
    }

    pub fn merge_entity(self, table: impl Into<String>, entity: Entity) -> Self {
        self.add(Operation::merge(table, entity))
    }

    pub fn insert_or_replace_entity(self, table: impl Into<String>, entity: Entity) -> Self {
        self.add(Operation::insert_or_replace(table, entity))
    }

    pub fn insert_or_merge_entity(self, table: impl Into<String>, entity: Entity) -> Self {
        self.add(Operation::insert_or_merge(table, entity))
    }

    pub fn delete_entity(
        self,
        table: impl Into<String>,
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        etag: Option<String>,
    ) -> Self {
        self.add(Operation::delete(table, partition_key, row_key, etag))
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<Operation>> for BatchOperations {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl From<Operation> for BatchOperations {
    fn from(operation: Operation) -> Self {
        Self {
            operations: vec![operation],
        }
    }
}

impl<'a> IntoIterator for &'a BatchOperations {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
