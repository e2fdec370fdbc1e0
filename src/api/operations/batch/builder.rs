//! Batch request building
//!
//! Each operation compiles to the same request context its stand-alone
//! equivalent would produce; the contexts are then serialized into one
//! multipart changeset body.

use crate::api::constants::{headers, methods};
use crate::api::context::{
    self, RequestContext, delete_entity_context, insert_entity_context,
    put_or_merge_entity_context,
};
use crate::api::models::{DeleteEntityOptions, TableServiceOptions};
use crate::api::operations::Operation;
use crate::api::serialization::{EncodedMime, EntitySerializer, MimeSerializer};

/// Build one request context per operation, reusing the stand-alone
/// constructors.
pub fn build_contexts(
    operations: &[Operation],
    atom: &dyn EntitySerializer,
) -> anyhow::Result<Vec<RequestContext>> {
    let options = TableServiceOptions::default();

    operations
        .iter()
        .map(|operation| match operation {
            Operation::Insert { table, entity } => {
                insert_entity_context(table, entity, &options, atom)
            }
            Operation::Update { table, entity } => {
                put_or_merge_entity_context(table, entity, methods::PUT, true, &options, atom)
            }
            Operation::Merge { table, entity } => {
                put_or_merge_entity_context(table, entity, methods::MERGE, true, &options, atom)
            }
            Operation::InsertOrReplace { table, entity } => {
                put_or_merge_entity_context(table, entity, methods::PUT, false, &options, atom)
            }
            Operation::InsertOrMerge { table, entity } => {
                put_or_merge_entity_context(table, entity, methods::MERGE, false, &options, atom)
            }
            Operation::Delete {
                table,
                partition_key,
                row_key,
                etag,
            } => {
                let mut delete_options = DeleteEntityOptions::new();
                delete_options.etag = etag.clone();
                delete_entity_context(table, partition_key, row_key, &delete_options)
            }
        })
        .collect()
}

/// Serialize paired operations/contexts into a changeset body.
///
/// Every part receives a sequential 1-based `Content-ID`. Write operations
/// additionally get `;type=entry` appended to their content type and an exact
/// `Content-Length` in bytes.
pub fn build_batch_body(
    operations: &[Operation],
    contexts: &[RequestContext],
    base_uri: &str,
    mime: &dyn MimeSerializer,
) -> anyhow::Result<EncodedMime> {
    anyhow::ensure!(
        operations.len() == contexts.len(),
        "operation and context counts differ ({} vs {})",
        operations.len(),
        contexts.len()
    );

    let mut parts = Vec::with_capacity(operations.len());

    for (index, (operation, original)) in operations.iter().zip(contexts).enumerate() {
        let mut ctx = original.clone();

        if operation.is_write_with_body() {
            if let Some(content_type) = ctx
                .headers
                .iter_mut()
                .find(|(name, _)| name == headers::CONTENT_TYPE)
            {
                content_type.1.push_str(";type=entry");
            }
            context::add_optional_header(
                &mut ctx.headers,
                headers::CONTENT_LENGTH,
                &ctx.body.len().to_string(),
            );
        }

        context::add_optional_header(
            &mut ctx.headers,
            headers::CONTENT_ID,
            &(index + 1).to_string(),
        );

        parts.push(ctx.to_http_message(base_uri));
    }

    Ok(mime.encode_parts(&parts))
}
