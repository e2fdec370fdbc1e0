//! Service options and typed operation results

use std::collections::HashMap;
use std::time::Duration;

use crate::api::constants::headers;
use crate::api::entity::Entity;

/// Endpoint routing for a single request.
///
/// Table mutations are not eligible for read-from-secondary routing, so every
/// write context forces `PrimaryOnly` regardless of the caller's options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationMode {
    #[default]
    PrimaryOnly,
    SecondaryOnly,
    PrimaryThenSecondary,
}

/// Options shared by every table service operation.
#[derive(Debug, Clone, Default)]
pub struct TableServiceOptions {
    /// Server-side timeout, sent as the `timeout` query parameter (seconds).
    pub timeout: Option<Duration>,
    pub location_mode: LocationMode,
}

impl TableServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_location_mode(mut self, location_mode: LocationMode) -> Self {
        self.location_mode = location_mode;
        self
    }
}

/// Options for `delete_entity`. An absent ETag means an unconditional delete
/// (`If-Match: *`).
#[derive(Debug, Clone, Default)]
pub struct DeleteEntityOptions {
    pub etag: Option<String>,
    pub service_options: TableServiceOptions,
}

impl DeleteEntityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Result of `query_tables`.
#[derive(Debug, Clone, Default)]
pub struct QueryTablesResult {
    pub tables: Vec<String>,
    pub next_table_name: Option<String>,
}

impl QueryTablesResult {
    pub fn create(headers: &HashMap<String, String>, tables: Vec<String>) -> Self {
        Self {
            tables,
            next_table_name: find_header(headers, headers::CONTINUATION_NEXT_TABLE_NAME),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_table_name.is_some()
    }
}

/// Result of `get_table`.
#[derive(Debug, Clone)]
pub struct GetTableResult {
    pub name: String,
}

/// Result of `query_entities`.
#[derive(Debug, Clone, Default)]
pub struct QueryEntitiesResult {
    pub entities: Vec<Entity>,
    pub next_partition_key: Option<String>,
    pub next_row_key: Option<String>,
}

impl QueryEntitiesResult {
    pub fn create(headers: &HashMap<String, String>, entities: Vec<Entity>) -> Self {
        Self {
            entities,
            next_partition_key: find_header(headers, headers::CONTINUATION_NEXT_PARTITION_KEY),
            next_row_key: find_header(headers, headers::CONTINUATION_NEXT_ROW_KEY),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_partition_key.is_some() || self.next_row_key.is_some()
    }
}

/// Result of `insert_entity`; the entity is the service's echo of the
/// inserted row, with its assigned ETag.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertEntityResult {
    pub entity: Entity,
}

/// Result of the update/merge family; carries the new version token.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEntityResult {
    pub etag: String,
}

impl UpdateEntityResult {
    pub fn create(headers: &HashMap<String, String>) -> anyhow::Result<Self> {
        let etag = find_header(headers, headers::ETAG)
            .ok_or_else(|| anyhow::anyhow!("response is missing the ETag header"))?;
        Ok(Self { etag })
    }
}

/// Result of `get_entity`.
#[derive(Debug, Clone)]
pub struct GetEntityResult {
    pub entity: Entity,
}

/// Case-insensitive header lookup over a plain header map.
pub fn find_header(headers: &HashMap<String, String>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}
