//! Blocking façade over [`TableClient`](crate::api::TableClient)
//!
//! Every method starts the corresponding async operation and waits for it on
//! an owned runtime; there is no independent logic here.

use crate::api::acl::TableAcl;
use crate::api::entity::Entity;
use crate::api::models::{
    DeleteEntityOptions, GetEntityResult, GetTableResult, InsertEntityResult, QueryEntitiesResult,
    QueryTablesResult, TableServiceOptions, UpdateEntityResult,
};
use crate::api::operations::{BatchOperations, BatchResult};
use crate::api::query::{QueryEntitiesOptions, QueryTablesOptions};

/// Synchronous table service client.
pub struct TableClient {
    inner: crate::api::TableClient,
    runtime: tokio::runtime::Runtime,
}

impl TableClient {
    pub fn new(primary_uri: impl Into<String>) -> anyhow::Result<Self> {
        Self::from_async(crate::api::TableClient::new(primary_uri))
    }

    /// Wrap an already-configured async client.
    pub fn from_async(inner: crate::api::TableClient) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    pub fn query_tables(
        &self,
        options: impl Into<QueryTablesOptions>,
    ) -> anyhow::Result<QueryTablesResult> {
        self.runtime.block_on(self.inner.query_tables(options))
    }

    pub fn create_table(&self, table: &str, options: TableServiceOptions) -> anyhow::Result<()> {
        self.runtime.block_on(self.inner.create_table(table, options))
    }

    pub fn get_table(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<GetTableResult> {
        self.runtime.block_on(self.inner.get_table(table, options))
    }

    pub fn delete_table(&self, table: &str, options: TableServiceOptions) -> anyhow::Result<()> {
        self.runtime.block_on(self.inner.delete_table(table, options))
    }

    pub fn query_entities(
        &self,
        table: &str,
        options: impl Into<QueryEntitiesOptions>,
    ) -> anyhow::Result<QueryEntitiesResult> {
        self.runtime
            .block_on(self.inner.query_entities(table, options))
    }

    pub fn insert_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<InsertEntityResult> {
        self.runtime
            .block_on(self.inner.insert_entity(table, entity, options))
    }

    pub fn update_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.runtime
            .block_on(self.inner.update_entity(table, entity, options))
    }

    pub fn merge_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.runtime
            .block_on(self.inner.merge_entity(table, entity, options))
    }

    pub fn insert_or_replace_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.runtime
            .block_on(self.inner.insert_or_replace_entity(table, entity, options))
    }

    pub fn insert_or_merge_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.runtime
            .block_on(self.inner.insert_or_merge_entity(table, entity, options))
    }

    pub fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        options: DeleteEntityOptions,
    ) -> anyhow::Result<()> {
        self.runtime.block_on(
            self.inner
                .delete_entity(table, partition_key, row_key, options),
        )
    }

    pub fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<GetEntityResult> {
        self.runtime.block_on(
            self.inner
                .get_entity(table, partition_key, row_key, options),
        )
    }

    pub fn batch(
        &self,
        operations: impl Into<BatchOperations>,
        options: TableServiceOptions,
    ) -> anyhow::Result<BatchResult> {
        self.runtime.block_on(self.inner.batch(operations, options))
    }

    pub fn get_table_acl(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<TableAcl> {
        self.runtime.block_on(self.inner.get_table_acl(table, options))
    }

    pub fn set_table_acl(
        &self,
        table: &str,
        acl: &TableAcl,
        options: TableServiceOptions,
    ) -> anyhow::Result<()> {
        self.runtime
            .block_on(self.inner.set_table_acl(table, acl, options))
    }
}
