//! Async table service client
//!
//! The public operation surface. Each method builds a request context, hands
//! it to the transport, and maps the confirmed response into a typed result.

use std::sync::Arc;

use log::debug;

use crate::api::acl::TableAcl;
use crate::api::constants::{self, headers, methods, query_params, status};
use crate::api::context::{
    self, RequestContext, add_optional_query_param, append_timeout, delete_entity_context,
    get_entity_context, insert_entity_context, put_or_merge_entity_context, validate_table_name,
};
use crate::api::entity::Entity;
use crate::api::error::TableError;
use crate::api::models::{
    DeleteEntityOptions, GetEntityResult, GetTableResult, InsertEntityResult, LocationMode,
    QueryEntitiesResult, QueryTablesResult, TableServiceOptions, UpdateEntityResult,
};
use crate::api::operations::batch::{build_batch_body, build_contexts, parse_batch_response};
use crate::api::operations::{BatchOperations, BatchResult};
use crate::api::query::{QueryEntitiesOptions, QueryTablesOptions};
use crate::api::serialization::{
    AclSerializer, AtomReaderWriter, EntitySerializer, MimeReaderWriter, MimeSerializer,
    XmlAclSerializer,
};
use crate::api::transport::{ReqwestTransport, Transport, TransportResponse};

/// Client for one table storage account.
///
/// Cheap to clone; all collaborators are shared behind `Arc`. No state is
/// mutated across calls.
#[derive(Clone)]
pub struct TableClient {
    primary_uri: String,
    transport: Arc<dyn Transport>,
    atom: Arc<dyn EntitySerializer>,
    mime: Arc<dyn MimeSerializer>,
    acl: Arc<dyn AclSerializer>,
}

impl TableClient {
    /// Client with the default collaborators against a single endpoint.
    pub fn new(primary_uri: impl Into<String>) -> Self {
        let primary_uri = primary_uri.into();
        Self {
            transport: Arc::new(ReqwestTransport::new(primary_uri.clone())),
            atom: Arc::new(AtomReaderWriter::new()),
            mime: Arc::new(MimeReaderWriter::new()),
            acl: Arc::new(XmlAclSerializer::new()),
            primary_uri,
        }
    }

    /// Client with a secondary read endpoint.
    pub fn with_secondary(
        primary_uri: impl Into<String>,
        secondary_uri: impl Into<String>,
    ) -> Self {
        let primary_uri = primary_uri.into();
        Self {
            transport: Arc::new(
                ReqwestTransport::new(primary_uri.clone()).with_secondary(secondary_uri),
            ),
            atom: Arc::new(AtomReaderWriter::new()),
            mime: Arc::new(MimeReaderWriter::new()),
            acl: Arc::new(XmlAclSerializer::new()),
            primary_uri,
        }
    }

    /// Client with explicit collaborators; any of them can be replaced.
    pub fn with_collaborators(
        primary_uri: impl Into<String>,
        transport: Arc<dyn Transport>,
        atom: Arc<dyn EntitySerializer>,
        mime: Arc<dyn MimeSerializer>,
        acl: Arc<dyn AclSerializer>,
    ) -> Self {
        Self {
            primary_uri: primary_uri.into(),
            transport,
            atom,
            mime,
            acl,
        }
    }

    pub fn primary_uri(&self) -> &str {
        &self.primary_uri
    }

    async fn send(&self, context: &RequestContext) -> anyhow::Result<TransportResponse> {
        self.transport.send_context(context).await
    }

    /// List tables.
    ///
    /// Accepts full [`QueryTablesOptions`], a bare name prefix (`&str`), or a
    /// bare [`crate::api::Filter`].
    pub async fn query_tables(
        &self,
        options: impl Into<QueryTablesOptions>,
    ) -> anyhow::Result<QueryTablesResult> {
        let options = options.into();
        let query = options.effective_query();

        let mut query_params = Vec::new();
        query.append_query_params(&mut query_params);
        append_timeout(&mut query_params, &options.service_options);
        add_optional_query_param(
            &mut query_params,
            query_params::NEXT_TABLE_NAME,
            options.next_table_name.as_deref().unwrap_or_default(),
        );

        // The service ignores NextTableName unless $filter appears in the
        // same request, so an empty $filter is injected alongside any
        // continuation token. Deliberate workaround, not a bug.
        let has_continuation = query_params
            .iter()
            .any(|(name, _)| name == query_params::NEXT_TABLE_NAME);
        let has_filter = query_params
            .iter()
            .any(|(name, _)| name == query_params::FILTER);
        if has_continuation && !has_filter {
            query_params.push((query_params::FILTER.to_string(), String::new()));
        }

        let context = RequestContext {
            method: methods::GET.to_string(),
            path: constants::TABLES_PATH.to_string(),
            headers: Vec::new(),
            query_params,
            body: Vec::new(),
            status_codes: vec![status::OK],
            location_mode: options.service_options.location_mode,
        };

        let response = self.send(&context).await?;
        let tables = self.atom.parse_table_entries(&response.body)?;
        debug!("query_tables returned {} tables", tables.len());
        Ok(QueryTablesResult::create(&response.headers, tables))
    }

    /// Create a new table.
    pub async fn create_table(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<()> {
        validate_table_name(table)?;
        debug!("creating table {}", table);

        let mut headers = Vec::new();
        context::add_optional_header(
            &mut headers,
            headers::CONTENT_TYPE,
            constants::ATOM_CONTENT_TYPE,
        );
        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);

        let request = RequestContext {
            method: methods::POST.to_string(),
            path: constants::TABLES_PATH.to_string(),
            headers,
            query_params,
            body: self.atom.serialize_table(table)?,
            status_codes: vec![status::CREATED],
            location_mode: LocationMode::PrimaryOnly,
        };

        self.send(&request).await?;
        Ok(())
    }

    /// Fetch a single table descriptor.
    pub async fn get_table(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<GetTableResult> {
        validate_table_name(table)?;

        let mut headers = Vec::new();
        context::add_optional_header(
            &mut headers,
            headers::CONTENT_TYPE,
            constants::ATOM_CONTENT_TYPE,
        );
        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);

        let request = RequestContext {
            method: methods::GET.to_string(),
            path: constants::table_path(table),
            headers,
            query_params,
            body: Vec::new(),
            status_codes: vec![status::OK],
            location_mode: options.location_mode,
        };

        let response = self.send(&request).await?;
        let name = self.atom.parse_table(&response.body)?;
        Ok(GetTableResult { name })
    }

    /// Delete a table and all data it contains.
    pub async fn delete_table(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<()> {
        validate_table_name(table)?;
        debug!("deleting table {}", table);

        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);

        let request = RequestContext {
            method: methods::DELETE.to_string(),
            path: constants::table_path(table),
            headers: Vec::new(),
            query_params,
            body: Vec::new(),
            status_codes: vec![status::NO_CONTENT],
            location_mode: LocationMode::PrimaryOnly,
        };

        self.send(&request).await?;
        Ok(())
    }

    /// Query entities in a table.
    ///
    /// Accepts full [`QueryEntitiesOptions`], a raw `$filter` string, or a
    /// bare [`crate::api::Filter`].
    pub async fn query_entities(
        &self,
        table: &str,
        options: impl Into<QueryEntitiesOptions>,
    ) -> anyhow::Result<QueryEntitiesResult> {
        validate_table_name(table)?;
        let options = options.into();

        let mut query_params = Vec::new();
        options.query.append_query_params(&mut query_params);
        append_timeout(&mut query_params, &options.service_options);
        add_optional_query_param(
            &mut query_params,
            query_params::NEXT_PARTITION_KEY,
            options.next_partition_key.as_deref().unwrap_or_default(),
        );
        add_optional_query_param(
            &mut query_params,
            query_params::NEXT_ROW_KEY,
            options.next_row_key.as_deref().unwrap_or_default(),
        );

        let mut headers = Vec::new();
        context::add_optional_header(
            &mut headers,
            headers::CONTENT_TYPE,
            constants::ATOM_CONTENT_TYPE,
        );
        // Projections require the newer data service version.
        if options.query.has_select() {
            context::add_optional_header(
                &mut headers,
                headers::DATA_SERVICE_VERSION,
                constants::MAX_DATA_SERVICE_VERSION,
            );
        }

        let request = RequestContext {
            method: methods::GET.to_string(),
            path: table.to_string(),
            headers,
            query_params,
            body: Vec::new(),
            status_codes: vec![status::OK],
            location_mode: options.service_options.location_mode,
        };

        let response = self.send(&request).await?;
        let entities = self.atom.parse_entities(&response.body)?;
        debug!(
            "query_entities returned {} entities from {}",
            entities.len(),
            table
        );
        Ok(QueryEntitiesResult::create(&response.headers, entities))
    }

    /// Insert a new entity.
    pub async fn insert_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<InsertEntityResult> {
        let context = insert_entity_context(table, entity, &options, self.atom.as_ref())?;
        let response = self.send(&context).await?;

        let mut entity = self.atom.parse_entity(&response.body)?;
        if let Some(etag) = response.header(headers::ETAG) {
            entity.set_etag(etag);
        }
        Ok(InsertEntityResult { entity })
    }

    /// Replace an existing entity, conditional on its ETag (wildcard when the
    /// entity carries none).
    pub async fn update_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.put_or_merge(table, entity, methods::PUT, true, options)
            .await
    }

    /// Merge properties into an existing entity, conditional on its ETag.
    pub async fn merge_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.put_or_merge(table, entity, methods::MERGE, true, options)
            .await
    }

    /// Replace the entity, or insert it when it does not exist.
    pub async fn insert_or_replace_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.put_or_merge(table, entity, methods::PUT, false, options)
            .await
    }

    /// Merge into the entity, or insert it when it does not exist.
    pub async fn insert_or_merge_entity(
        &self,
        table: &str,
        entity: &Entity,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        self.put_or_merge(table, entity, methods::MERGE, false, options)
            .await
    }

    async fn put_or_merge(
        &self,
        table: &str,
        entity: &Entity,
        verb: &str,
        use_etag: bool,
        options: TableServiceOptions,
    ) -> anyhow::Result<UpdateEntityResult> {
        let context =
            put_or_merge_entity_context(table, entity, verb, use_etag, &options, self.atom.as_ref())?;
        let response = self.send(&context).await?;
        UpdateEntityResult::create(&response.headers)
    }

    /// Delete an entity by key pair.
    pub async fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        options: DeleteEntityOptions,
    ) -> anyhow::Result<()> {
        let context = delete_entity_context(table, partition_key, row_key, &options)?;
        self.send(&context).await?;
        Ok(())
    }

    /// Fetch a single entity by key pair.
    pub async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<GetEntityResult> {
        let context = get_entity_context(table, partition_key, row_key, &options)?;
        let response = self.send(&context).await?;
        let entity = self.atom.parse_entity(&response.body)?;
        Ok(GetEntityResult { entity })
    }

    /// Run a set of entity operations as one atomic changeset.
    ///
    /// The returned [`BatchResult`] holds one outcome per operation. When a
    /// part fails the service commits nothing; the result carries the first
    /// fault and its index, and [`BatchResult::error`] yields the
    /// corresponding [`TableError::BatchFault`].
    pub async fn batch(
        &self,
        operations: impl Into<BatchOperations>,
        options: TableServiceOptions,
    ) -> anyhow::Result<BatchResult> {
        let operations = operations.into();
        if operations.is_empty() {
            return Err(TableError::validation("batch contains no operations").into());
        }

        let ops = operations.operations();
        debug!("sending batch of {} operations", ops.len());

        let contexts = build_contexts(ops, self.atom.as_ref())?;
        let encoded = build_batch_body(ops, &contexts, &self.primary_uri, self.mime.as_ref())?;

        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);

        let request = RequestContext {
            method: methods::POST.to_string(),
            path: constants::BATCH_PATH.to_string(),
            headers: vec![(headers::CONTENT_TYPE.to_string(), encoded.content_type)],
            query_params,
            body: encoded.body.into_bytes(),
            status_codes: vec![status::ACCEPTED],
            location_mode: LocationMode::PrimaryOnly,
        };

        let response = self.send(&request).await?;
        parse_batch_response(
            &response.body_text(),
            ops,
            self.mime.as_ref(),
            self.atom.as_ref(),
        )
    }

    /// Fetch the table's access control list.
    pub async fn get_table_acl(
        &self,
        table: &str,
        options: TableServiceOptions,
    ) -> anyhow::Result<TableAcl> {
        validate_table_name(table)?;

        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);
        query_params.push((query_params::COMP.to_string(), "acl".to_string()));

        let request = RequestContext {
            method: methods::GET.to_string(),
            path: table.to_string(),
            headers: Vec::new(),
            query_params,
            body: Vec::new(),
            status_codes: vec![status::OK],
            location_mode: options.location_mode,
        };

        let response = self.send(&request).await?;
        self.acl.deserialize(&response.body)
    }

    /// Replace the table's access control list.
    pub async fn set_table_acl(
        &self,
        table: &str,
        acl: &TableAcl,
        options: TableServiceOptions,
    ) -> anyhow::Result<()> {
        validate_table_name(table)?;

        let mut query_params = Vec::new();
        append_timeout(&mut query_params, &options);
        query_params.push((query_params::COMP.to_string(), "acl".to_string()));

        let request = RequestContext {
            method: methods::PUT.to_string(),
            path: table.to_string(),
            headers: Vec::new(),
            query_params,
            body: self.acl.serialize(acl)?,
            status_codes: vec![status::NO_CONTENT],
            location_mode: LocationMode::PrimaryOnly,
        };

        self.send(&request).await?;
        Ok(())
    }
}
