//! Request context construction
//!
//! One constructor per operation family. Every constructor returns a fully
//! populated, immutable [`RequestContext`]; nothing mutates a context after
//! it is built, so a context can be serialized into a batch part or handed to
//! the transport as-is.

use crate::api::constants::{self, headers, methods, query_params, status};
use crate::api::entity::Entity;
use crate::api::error::TableError;
use crate::api::models::{DeleteEntityOptions, LocationMode, TableServiceOptions};
use crate::api::serialization::EntitySerializer;
use crate::api::encoding::encode_odata_uri_value;

/// A single outbound request, fully described.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Acceptable success status codes; exactly one per operation.
    pub status_codes: Vec<u16>,
    pub location_mode: LocationMode,
}

impl RequestContext {
    pub fn expects_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// Serialize to HTTP-message text for embedding in a changeset part:
    /// request line, headers, blank line, body.
    pub fn to_http_message(&self, base_uri: &str) -> String {
        let mut uri = format!("{}/{}", base_uri.trim_end_matches('/'), self.path);
        if !self.query_params.is_empty() {
            let joined: Vec<String> = self
                .query_params
                .iter()
                .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
                .collect();
            uri.push('?');
            uri.push_str(&joined.join("&"));
        }

        let mut message = format!("{} {} HTTP/1.1\r\n", self.method, uri);
        for (name, value) in &self.headers {
            message.push_str(&format!("{}: {}\r\n", name, value));
        }
        message.push_str("\r\n");
        message.push_str(&String::from_utf8_lossy(&self.body));
        message
    }
}

/// Append a header unless the value is empty.
pub fn add_optional_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if !value.is_empty() {
        headers.push((name.to_string(), value.to_string()));
    }
}

/// Append a query parameter unless the value is empty.
///
/// The `query_tables` continuation workaround inserts its empty `$filter`
/// directly, bypassing this helper on purpose.
pub fn add_optional_query_param(params: &mut Vec<(String, String)>, name: &str, value: &str) {
    if !value.is_empty() {
        params.push((name.to_string(), value.to_string()));
    }
}

/// Append the server-side `timeout` parameter when the caller configured one.
pub fn append_timeout(params: &mut Vec<(String, String)>, options: &TableServiceOptions) {
    if let Some(timeout) = options.timeout {
        params.push((
            query_params::TIMEOUT.to_string(),
            timeout.as_secs().to_string(),
        ));
    }
}

pub fn validate_table_name(table: &str) -> anyhow::Result<()> {
    if table.is_empty() {
        return Err(TableError::validation("table name must not be empty").into());
    }
    Ok(())
}

/// URI path addressing a single entity by its key pair.
pub fn entity_path(table: &str, partition_key: &str, row_key: &str) -> String {
    format!(
        "{}(PartitionKey='{}',RowKey='{}')",
        table,
        encode_odata_uri_value(partition_key),
        encode_odata_uri_value(row_key)
    )
}

/// Context for `insert_entity`: POST to the table resource, expect 201.
pub fn insert_entity_context(
    table: &str,
    entity: &Entity,
    options: &TableServiceOptions,
    atom: &dyn EntitySerializer,
) -> anyhow::Result<RequestContext> {
    validate_table_name(table)?;
    entity.validate()?;

    let mut headers = Vec::new();
    add_optional_header(&mut headers, headers::CONTENT_TYPE, constants::ATOM_CONTENT_TYPE);

    let mut query_params = Vec::new();
    append_timeout(&mut query_params, options);

    Ok(RequestContext {
        method: methods::POST.to_string(),
        path: table.to_string(),
        headers,
        query_params,
        body: atom.serialize_entity(entity)?,
        status_codes: vec![status::CREATED],
        location_mode: LocationMode::PrimaryOnly,
    })
}

/// Context for the update/merge family.
///
/// `verb` is PUT for replace semantics, MERGE for merge semantics. With
/// `use_etag` the write is conditional: `If-Match` carries the entity's ETag,
/// or `*` when the entity has none.
pub fn put_or_merge_entity_context(
    table: &str,
    entity: &Entity,
    verb: &str,
    use_etag: bool,
    options: &TableServiceOptions,
    atom: &dyn EntitySerializer,
) -> anyhow::Result<RequestContext> {
    validate_table_name(table)?;
    entity.validate()?;

    let partition_key = entity.partition_key().unwrap_or_default();
    let row_key = entity.row_key().unwrap_or_default();

    let mut headers = Vec::new();
    if use_etag {
        let if_match = entity.etag().unwrap_or(constants::ASTERISK);
        add_optional_header(&mut headers, headers::IF_MATCH, if_match);
    }
    add_optional_header(&mut headers, headers::CONTENT_TYPE, constants::ATOM_CONTENT_TYPE);

    let mut query_params = Vec::new();
    append_timeout(&mut query_params, options);

    Ok(RequestContext {
        method: verb.to_string(),
        path: entity_path(table, partition_key, row_key),
        headers,
        query_params,
        body: atom.serialize_entity(entity)?,
        status_codes: vec![status::NO_CONTENT],
        location_mode: LocationMode::PrimaryOnly,
    })
}

/// Context for `delete_entity`: DELETE with `If-Match` always set, to the
/// supplied ETag or the wildcard.
pub fn delete_entity_context(
    table: &str,
    partition_key: &str,
    row_key: &str,
    options: &DeleteEntityOptions,
) -> anyhow::Result<RequestContext> {
    validate_table_name(table)?;

    let mut headers = Vec::new();
    let if_match = options.etag.as_deref().unwrap_or(constants::ASTERISK);
    add_optional_header(&mut headers, headers::IF_MATCH, if_match);

    let mut query_params = Vec::new();
    append_timeout(&mut query_params, &options.service_options);

    Ok(RequestContext {
        method: methods::DELETE.to_string(),
        path: entity_path(table, partition_key, row_key),
        headers,
        query_params,
        body: Vec::new(),
        status_codes: vec![status::NO_CONTENT],
        location_mode: LocationMode::PrimaryOnly,
    })
}

/// Context for `get_entity`: GET the entity path, expect 200.
pub fn get_entity_context(
    table: &str,
    partition_key: &str,
    row_key: &str,
    options: &TableServiceOptions,
) -> anyhow::Result<RequestContext> {
    validate_table_name(table)?;

    let mut headers = Vec::new();
    add_optional_header(&mut headers, headers::CONTENT_TYPE, constants::ATOM_CONTENT_TYPE);

    let mut query_params = Vec::new();
    append_timeout(&mut query_params, options);

    Ok(RequestContext {
        method: methods::GET.to_string(),
        path: entity_path(table, partition_key, row_key),
        headers,
        query_params,
        body: Vec::new(),
        status_codes: vec![status::OK],
        location_mode: options.location_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::serialization::atom::AtomReaderWriter;

    fn atom() -> AtomReaderWriter {
        AtomReaderWriter::new()
    }

    #[test]
    fn test_entity_path_percent_encodes_keys() {
        assert_eq!(
            entity_path("T", "A/B", "1"),
            "T(PartitionKey='A%2FB',RowKey='1')"
        );
    }

    #[test]
    fn test_insert_context_shape() {
        let entity = Entity::with_keys("pk", "rk");
        let context =
            insert_entity_context("people", &entity, &TableServiceOptions::new(), &atom())
                .unwrap();

        assert_eq!(context.method, "POST");
        assert_eq!(context.path, "people");
        assert_eq!(context.status_codes, vec![201]);
        assert_eq!(context.location_mode, LocationMode::PrimaryOnly);
        assert!(context
            .headers
            .contains(&("Content-Type".to_string(), "application/atom+xml".to_string())));
        assert!(!context.body.is_empty());
    }

    #[test]
    fn test_conditional_update_uses_entity_etag() {
        let mut entity = Entity::with_keys("pk", "rk");
        entity.set_etag("W/abc");
        let context = put_or_merge_entity_context(
            "people",
            &entity,
            methods::PUT,
            true,
            &TableServiceOptions::new(),
            &atom(),
        )
        .unwrap();
        assert!(context
            .headers
            .contains(&("If-Match".to_string(), "W/abc".to_string())));
    }

    #[test]
    fn test_conditional_update_without_etag_uses_wildcard() {
        let entity = Entity::with_keys("pk", "rk");
        let context = put_or_merge_entity_context(
            "people",
            &entity,
            methods::MERGE,
            true,
            &TableServiceOptions::new(),
            &atom(),
        )
        .unwrap();
        assert!(context
            .headers
            .contains(&("If-Match".to_string(), "*".to_string())));
    }

    #[test]
    fn test_unconditional_upsert_has_no_if_match() {
        let mut entity = Entity::with_keys("pk", "rk");
        entity.set_etag("W/abc");
        let context = put_or_merge_entity_context(
            "people",
            &entity,
            methods::PUT,
            false,
            &TableServiceOptions::new(),
            &atom(),
        )
        .unwrap();
        assert!(!context.headers.iter().any(|(name, _)| name == "If-Match"));
    }

    #[test]
    fn test_delete_always_sets_if_match() {
        let context =
            delete_entity_context("people", "pk", "rk", &DeleteEntityOptions::new()).unwrap();
        assert_eq!(context.method, "DELETE");
        assert_eq!(context.status_codes, vec![204]);
        assert!(context
            .headers
            .contains(&("If-Match".to_string(), "*".to_string())));

        let context = delete_entity_context(
            "people",
            "pk",
            "rk",
            &DeleteEntityOptions::new().with_etag("W/xyz"),
        )
        .unwrap();
        assert!(context
            .headers
            .contains(&("If-Match".to_string(), "W/xyz".to_string())));
    }

    #[test]
    fn test_empty_table_name_fails_fast() {
        let err = delete_entity_context("", "pk", "rk", &DeleteEntityOptions::new())
            .unwrap_err();
        assert!(err.downcast_ref::<TableError>().is_some());
    }

    #[test]
    fn test_http_message_form() {
        let context =
            delete_entity_context("people", "pk", "rk", &DeleteEntityOptions::new()).unwrap();
        let message = context.to_http_message("https://acct.table.example.net");
        assert!(message.starts_with(
            "DELETE https://acct.table.example.net/people(PartitionKey='pk',RowKey='rk') HTTP/1.1\r\n"
        ));
        assert!(message.contains("If-Match: *\r\n"));
        assert!(message.ends_with("\r\n\r\n"));
    }
}
