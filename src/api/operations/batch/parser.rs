//! Batch response parsing
//!
//! Decodes the multipart batch response into per-operation outcomes. The
//! service commits a changeset all-or-nothing, so a single failing part marks
//! the whole batch as failed; every position is still reported.

use std::collections::HashMap;

use crate::api::constants::headers;
use crate::api::error::TableError;
use crate::api::models::{InsertEntityResult, UpdateEntityResult, find_header};
use crate::api::operations::Operation;
use crate::api::serialization::{EntitySerializer, MimeSerializer};
use crate::api::transport::parse_service_error_message;

/// Outcome of one operation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Inserted(InsertEntityResult),
    Updated(UpdateEntityResult),
    Deleted,
    /// The part that failed; its status and service message.
    Fault { status: u16, message: String },
    /// Rolled back because another part faulted.
    NotCommitted,
}

/// Per-operation outcomes, positionally aligned with the submitted batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub outcomes: Vec<BatchOutcome>,
    pub failed_index: Option<usize>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failed_index.is_none()
    }

    /// The batch fault, when a part failed.
    pub fn error(&self) -> Option<TableError> {
        let index = self.failed_index?;
        match &self.outcomes[index] {
            BatchOutcome::Fault { status, message } => Some(TableError::BatchFault {
                index,
                status: *status,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ParsingState {
    MimeHeaders,
    StatusLine,
    Headers,
    Body,
}

/// One decoded `application/http` response part.
#[derive(Debug, Clone)]
struct ResponsePart {
    content_id: Option<u32>,
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl ResponsePart {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse one part: MIME headers, status line, response headers, body.
fn parse_http_response(part: &str) -> anyhow::Result<ResponsePart> {
    let mut content_id = None;
    let mut status = None;
    let mut headers = HashMap::new();
    let mut body_lines = Vec::new();
    let mut state = ParsingState::MimeHeaders;

    for line in part.lines() {
        let line = line.trim_end_matches('\r');
        match state {
            ParsingState::MimeHeaders => {
                if line.starts_with("HTTP/") {
                    status = line
                        .split_whitespace()
                        .nth(1)
                        .and_then(|code| code.parse().ok());
                    state = ParsingState::Headers;
                } else if line.trim().is_empty() {
                    state = ParsingState::StatusLine;
                } else if let Some(value) = line.strip_prefix("Content-ID:") {
                    content_id = value.trim().parse().ok();
                }
            }
            ParsingState::StatusLine => {
                if line.starts_with("HTTP/") {
                    status = line
                        .split_whitespace()
                        .nth(1)
                        .and_then(|code| code.parse().ok());
                    state = ParsingState::Headers;
                }
            }
            ParsingState::Headers => {
                if line.trim().is_empty() {
                    state = ParsingState::Body;
                } else if let Some(colon) = line.find(':') {
                    headers.insert(
                        line[..colon].trim().to_string(),
                        line[colon + 1..].trim().to_string(),
                    );
                }
            }
            ParsingState::Body => body_lines.push(line),
        }
    }

    let status = status.ok_or_else(|| {
        anyhow::anyhow!("batch response part is missing an HTTP status line")
    })?;

    if content_id.is_none() {
        content_id = find_header(&headers, headers::CONTENT_ID)
            .and_then(|value| value.parse().ok());
    }

    Ok(ResponsePart {
        content_id,
        status,
        headers,
        body: body_lines.join("\n").trim().to_string(),
    })
}

/// Decode a batch response and pair its parts with the submitted operations.
///
/// Parts pair positionally; a part's `Content-ID` refines the faulting index
/// when the service returns fewer parts than operations.
pub fn parse_batch_response(
    body: &str,
    operations: &[Operation],
    mime: &dyn MimeSerializer,
    atom: &dyn EntitySerializer,
) -> anyhow::Result<BatchResult> {
    if operations.is_empty() {
        return Ok(BatchResult {
            outcomes: Vec::new(),
            failed_index: None,
        });
    }

    let raw_parts = mime.decode_parts(body)?;
    let parts = raw_parts
        .iter()
        .map(|part| parse_http_response(part))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if let Some((position, faulted)) = parts.iter().enumerate().find(|(_, p)| !p.is_success()) {
        let index = faulted
            .content_id
            .map(|id| id.saturating_sub(1) as usize)
            .unwrap_or(position)
            .min(operations.len().saturating_sub(1));

        let message = parse_service_error_message(&faulted.body)
            .unwrap_or_else(|| format!("HTTP {}", faulted.status));

        let outcomes = (0..operations.len())
            .map(|i| {
                if i == index {
                    BatchOutcome::Fault {
                        status: faulted.status,
                        message: message.clone(),
                    }
                } else {
                    BatchOutcome::NotCommitted
                }
            })
            .collect();

        return Ok(BatchResult {
            outcomes,
            failed_index: Some(index),
        });
    }

    anyhow::ensure!(
        parts.len() == operations.len(),
        "batch response has {} parts for {} operations",
        parts.len(),
        operations.len()
    );

    let outcomes = operations
        .iter()
        .zip(&parts)
        .map(|(operation, part)| success_outcome(operation, part, atom))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(BatchResult {
        outcomes,
        failed_index: None,
    })
}

/// Map a 2xx part with the same logic as the stand-alone operation.
fn success_outcome(
    operation: &Operation,
    part: &ResponsePart,
    atom: &dyn EntitySerializer,
) -> anyhow::Result<BatchOutcome> {
    let outcome = match operation {
        Operation::Insert { .. } => {
            let mut entity = atom.parse_entity(part.body.as_bytes())?;
            if let Some(etag) = find_header(&part.headers, headers::ETAG) {
                entity.set_etag(etag);
            }
            BatchOutcome::Inserted(InsertEntityResult { entity })
        }
        Operation::Update { .. }
        | Operation::Merge { .. }
        | Operation::InsertOrReplace { .. }
        | Operation::InsertOrMerge { .. } => {
            BatchOutcome::Updated(UpdateEntityResult::create(&part.headers)?)
        }
        Operation::Delete { .. } => BatchOutcome::Deleted,
    };
    Ok(outcome)
}
