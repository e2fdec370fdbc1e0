//! End-to-end operation tests against an in-memory transport
//!
//! Each test drives `TableClient` through the full request-construction and
//! response-mapping path; the fake transport records the built contexts and
//! replays canned responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use tablestore_client::api::serialization::{
    AtomReaderWriter, EntitySerializer, MimeReaderWriter, MimeSerializer, XmlAclSerializer,
};
use tablestore_client::api::{
    BatchOperations, BatchOutcome, DeleteEntityOptions, Entity, Filter, Operation, Query,
    QueryEntitiesOptions, QueryTablesOptions, RequestContext, TableAcl, TableClient, TableError,
    TableServiceOptions, Transport, TransportResponse,
};

const ENDPOINT: &str = "https://acct.table.example.net";

/// Records contexts and replays canned responses, enforcing the expected
/// status set the way a real transport must.
#[derive(Default)]
struct FakeTransport {
    contexts: Mutex<Vec<RequestContext>>,
    responses: Mutex<Vec<TransportResponse>>,
}

impl FakeTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn queue(self: &Arc<Self>, response: TransportResponse) {
        self.responses.lock().unwrap().push(response);
    }

    fn recorded(&self) -> Vec<RequestContext> {
        self.contexts.lock().unwrap().clone()
    }

    fn client(self: &Arc<Self>) -> TableClient {
        TableClient::with_collaborators(
            ENDPOINT,
            self.clone(),
            Arc::new(AtomReaderWriter::new()),
            Arc::new(MimeReaderWriter::new()),
            Arc::new(XmlAclSerializer::new()),
        )
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_context(&self, context: &RequestContext) -> Result<TransportResponse> {
        self.contexts.lock().unwrap().push(context.clone());
        let response = self.responses.lock().unwrap().remove(0);
        if !context.expects_status(response.status) {
            return Err(TableError::Protocol {
                status: response.status,
                message: response.body_text(),
            }
            .into());
        }
        Ok(response)
    }
}

fn response(status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> TransportResponse {
    TransportResponse {
        status,
        headers: headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>(),
        body: body.into(),
    }
}

fn entity_body(entity: &Entity) -> Vec<u8> {
    AtomReaderWriter::new().serialize_entity(entity).unwrap()
}

fn param<'a>(context: &'a RequestContext, name: &str) -> Option<&'a str> {
    context
        .query_params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn header<'a>(context: &'a RequestContext, name: &str) -> Option<&'a str> {
    context
        .headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[tokio::test]
async fn insert_entity_builds_post_and_maps_result() -> Result<()> {
    let transport = FakeTransport::new();
    let mut entity = Entity::with_keys("p1", "r1");
    entity.insert("Age", 30i32);

    transport.queue(response(
        201,
        &[("ETag", "W/\"fresh\"")],
        entity_body(&entity),
    ));

    let result = transport
        .client()
        .insert_entity("people", &entity, TableServiceOptions::default())
        .await?;

    let contexts = transport.recorded();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].method, "POST");
    assert_eq!(contexts[0].path, "people");
    assert_eq!(header(&contexts[0], "Content-Type"), Some("application/atom+xml"));
    assert_eq!(contexts[0].status_codes, vec![201]);

    assert_eq!(result.entity.partition_key(), Some("p1"));
    assert_eq!(result.entity.etag(), Some("W/\"fresh\""));
    Ok(())
}

#[tokio::test]
async fn conditional_update_sends_etag_or_wildcard() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(204, &[("ETag", "W/\"2\"")], Vec::new()));
    transport.queue(response(204, &[("ETag", "W/\"3\"")], Vec::new()));

    let client = transport.client();

    let mut entity = Entity::with_keys("p", "r");
    entity.set_etag("W/abc");
    let result = client
        .update_entity("people", &entity, TableServiceOptions::default())
        .await?;
    assert_eq!(result.etag, "W/\"2\"");

    let bare = Entity::with_keys("p", "r");
    client
        .merge_entity("people", &bare, TableServiceOptions::default())
        .await?;

    let contexts = transport.recorded();
    assert_eq!(contexts[0].method, "PUT");
    assert_eq!(header(&contexts[0], "If-Match"), Some("W/abc"));
    assert_eq!(contexts[1].method, "MERGE");
    assert_eq!(header(&contexts[1], "If-Match"), Some("*"));
    assert_eq!(
        contexts[0].path,
        "people(PartitionKey='p',RowKey='r')"
    );
    Ok(())
}

#[tokio::test]
async fn entity_path_percent_encodes_keys() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(204, &[], Vec::new()));

    transport
        .client()
        .delete_entity("T", "A/B", "1", DeleteEntityOptions::default())
        .await?;

    let contexts = transport.recorded();
    assert_eq!(contexts[0].path, "T(PartitionKey='A%2FB',RowKey='1')");
    assert_eq!(header(&contexts[0], "If-Match"), Some("*"));
    Ok(())
}

#[tokio::test]
async fn query_tables_prefix_compiles_to_range_filter() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(200, &[], empty_feed()));

    transport.client().query_tables("prod").await?;

    let contexts = transport.recorded();
    assert_eq!(contexts[0].method, "GET");
    assert_eq!(contexts[0].path, "Tables");
    assert_eq!(
        param(&contexts[0], "$filter"),
        Some("((TableName ge 'prod') and (TableName le 'prod{'))")
    );
    Ok(())
}

#[tokio::test]
async fn continuation_only_query_injects_empty_filter() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(
        200,
        &[("x-ms-continuation-NextTableName", "tok-2")],
        empty_feed(),
    ));

    let options = QueryTablesOptions::new().with_next_table_name("tok-1");
    let result = transport.client().query_tables(options).await?;

    let contexts = transport.recorded();
    assert_eq!(param(&contexts[0], "NextTableName"), Some("tok-1"));
    assert_eq!(param(&contexts[0], "$filter"), Some(""));
    assert_eq!(result.next_table_name.as_deref(), Some("tok-2"));
    Ok(())
}

#[tokio::test]
async fn query_entities_projection_sets_data_service_version() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(
        200,
        &[
            ("x-ms-continuation-NextPartitionKey", "np"),
            ("x-ms-continuation-NextRowKey", "nr"),
        ],
        empty_feed(),
    ));

    let options = QueryEntitiesOptions::from(Query::new().with_select(&["Name"]).with_top(5));
    let result = transport.client().query_entities("people", options).await?;

    let contexts = transport.recorded();
    assert_eq!(param(&contexts[0], "$select"), Some("Name"));
    assert_eq!(param(&contexts[0], "$top"), Some("5"));
    assert_eq!(
        header(&contexts[0], "DataServiceVersion"),
        Some("3.0;NetFx")
    );
    assert_eq!(result.next_partition_key.as_deref(), Some("np"));
    assert_eq!(result.next_row_key.as_deref(), Some("nr"));
    assert!(result.has_more());
    Ok(())
}

#[tokio::test]
async fn query_entities_accepts_bare_filter() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(200, &[], empty_feed()));

    transport
        .client()
        .query_entities("people", Filter::eq("Age", 30i32))
        .await?;

    let contexts = transport.recorded();
    assert_eq!(param(&contexts[0], "$filter"), Some("(Age eq 30)"));
    // No projection, so the version header stays off.
    assert_eq!(header(&contexts[0], "DataServiceVersion"), None);
    Ok(())
}

#[tokio::test]
async fn batch_success_maps_outcomes_positionally() -> Result<()> {
    let transport = FakeTransport::new();

    let parts = vec![
        "Content-Type: application/http\r\nContent-Transfer-Encoding: binary\r\n\r\nHTTP/1.1 204 No Content\r\nContent-ID: 1\r\nETag: W/\"10\"\r\n\r\n".to_string(),
        "Content-Type: application/http\r\nContent-Transfer-Encoding: binary\r\n\r\nHTTP/1.1 204 No Content\r\nContent-ID: 2\r\n\r\n".to_string(),
    ];
    let encoded = MimeReaderWriter::new().encode_parts(&parts);
    transport.queue(response(202, &[], encoded.body.into_bytes()));

    let operations = BatchOperations::new()
        .update_entity("people", Entity::with_keys("p", "1"))
        .delete_entity("people", "p", "2", Some("W/9".to_string()));

    let result = transport
        .client()
        .batch(operations, TableServiceOptions::default())
        .await?;

    assert!(result.is_success());
    assert!(matches!(result.outcomes[0], BatchOutcome::Updated(_)));
    assert_eq!(result.outcomes[1], BatchOutcome::Deleted);

    let contexts = transport.recorded();
    assert_eq!(contexts[0].method, "POST");
    assert_eq!(contexts[0].path, "$batch");
    assert_eq!(contexts[0].status_codes, vec![202]);
    let content_type = header(&contexts[0], "Content-Type").unwrap();
    assert!(content_type.starts_with("multipart/mixed; boundary=batch_"));

    let body = String::from_utf8(contexts[0].body.clone()).unwrap();
    assert!(body.contains("Content-ID: 1"));
    assert!(body.contains("Content-ID: 2"));
    assert!(body.contains(&format!(
        "PUT {}/people(PartitionKey='p',RowKey='1') HTTP/1.1",
        ENDPOINT
    )));
    assert!(body.contains("If-Match: W/9"));
    Ok(())
}

#[tokio::test]
async fn batch_fault_reports_index_and_rolls_back_the_rest() -> Result<()> {
    let transport = FakeTransport::new();

    let fault = "Content-Type: application/http\r\nContent-Transfer-Encoding: binary\r\n\r\nHTTP/1.1 404 Not Found\r\nContent-ID: 2\r\n\r\n<error><code>ResourceNotFound</code><message>The specified resource does not exist.</message></error>".to_string();
    let encoded = MimeReaderWriter::new().encode_parts(&[fault]);
    transport.queue(response(202, &[], encoded.body.into_bytes()));

    let operations: Vec<Operation> = (0..3)
        .map(|i| Operation::delete("people", "p", i.to_string(), None))
        .collect();

    let result = transport
        .client()
        .batch(operations, TableServiceOptions::default())
        .await?;

    assert!(!result.is_success());
    assert_eq!(result.failed_index, Some(1));
    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(result.outcomes[0], BatchOutcome::NotCommitted);
    assert!(matches!(
        result.outcomes[1],
        BatchOutcome::Fault { status: 404, .. }
    ));
    assert_eq!(result.outcomes[2], BatchOutcome::NotCommitted);

    let error = result.error().unwrap();
    assert_eq!(error.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn single_element_batch_matches_standalone_context() -> Result<()> {
    use tablestore_client::api::context::insert_entity_context;
    use tablestore_client::api::operations::batch::build_contexts;

    let atom = AtomReaderWriter::new();
    let mut entity = Entity::with_keys("p", "r");
    entity.insert("Age", 1i32);

    let standalone = insert_entity_context(
        "people",
        &entity,
        &TableServiceOptions::default(),
        &atom,
    )?;
    let batch_derived = build_contexts(
        &[Operation::insert("people", entity.clone())],
        &atom,
    )?;

    assert_eq!(batch_derived[0].method, standalone.method);
    assert_eq!(batch_derived[0].path, standalone.path);
    assert_eq!(batch_derived[0].headers, standalone.headers);
    assert_eq!(batch_derived[0].query_params, standalone.query_params);
    assert_eq!(batch_derived[0].status_codes, standalone.status_codes);
    Ok(())
}

#[tokio::test]
async fn acl_round_trip_uses_comp_acl() -> Result<()> {
    let transport = FakeTransport::new();

    let mut acl = TableAcl::new();
    acl.add(
        "policy-1",
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        "raud",
    );
    let acl_xml = {
        use tablestore_client::api::AclSerializer;
        XmlAclSerializer::new().serialize(&acl)?
    };

    transport.queue(response(200, &[], acl_xml));
    transport.queue(response(204, &[], Vec::new()));

    let client = transport.client();
    let fetched = client
        .get_table_acl("people", TableServiceOptions::default())
        .await?;
    assert_eq!(fetched, acl);

    client
        .set_table_acl("people", &fetched, TableServiceOptions::default())
        .await?;

    let contexts = transport.recorded();
    assert_eq!(param(&contexts[0], "comp"), Some("acl"));
    assert_eq!(contexts[0].method, "GET");
    assert_eq!(param(&contexts[1], "comp"), Some("acl"));
    assert_eq!(contexts[1].method, "PUT");
    assert_eq!(contexts[1].status_codes, vec![204]);
    Ok(())
}

#[tokio::test]
async fn unexpected_status_surfaces_protocol_error() -> Result<()> {
    let transport = FakeTransport::new();
    transport.queue(response(404, &[], "<error><message>gone</message></error>"));

    let err = transport
        .client()
        .delete_entity("people", "p", "r", DeleteEntityOptions::default())
        .await
        .unwrap_err();

    match err.downcast_ref::<TableError>() {
        Some(TableError::Protocol { status, .. }) => assert_eq!(*status, 404),
        other => panic!("unexpected error {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_rejected_before_sending() -> Result<()> {
    let transport = FakeTransport::new();
    let err = transport
        .client()
        .batch(Vec::<Operation>::new(), TableServiceOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<TableError>(),
        Some(TableError::Validation(_))
    ));
    assert!(transport.recorded().is_empty());
    Ok(())
}

#[test]
fn blocking_client_drives_the_async_form() {
    let transport = FakeTransport::new();
    transport.queue(response(200, &[], empty_feed()));

    let client = tablestore_client::api::blocking::TableClient::from_async(transport.client())
        .unwrap();
    let result = client.query_tables(QueryTablesOptions::new()).unwrap();
    assert!(result.tables.is_empty());
    assert_eq!(transport.recorded().len(), 1);
}

fn empty_feed() -> Vec<u8> {
    concat!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
        "<feed xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\" ",
        "xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\" ",
        "xmlns=\"http://www.w3.org/2005/Atom\"></feed>"
    )
    .as_bytes()
    .to_vec()
}
