//! MIME multipart framing for batch changesets
//!
//! A batch request is `multipart/mixed` with a single nested changeset part
//! that carries one `application/http` part per operation. Responses come
//! back with the same nesting and service-chosen boundaries.

use uuid::Uuid;

use crate::api::serialization::MimeSerializer;

const CRLF: &str = "\r\n";

/// An encoded multipart body plus the Content-Type that carries its boundary.
#[derive(Debug, Clone)]
pub struct EncodedMime {
    pub body: String,
    pub content_type: String,
}

/// Default MIME serializer. Boundaries are freshly generated per encoding.
#[derive(Debug, Clone, Default)]
pub struct MimeReaderWriter;

impl MimeReaderWriter {
    pub fn new() -> Self {
        Self
    }

    /// The first boundary token in a multipart body.
    fn extract_boundary(text: &str) -> anyhow::Result<String> {
        for line in text.lines() {
            let line = line.trim();
            if let Some(token) = line.strip_prefix("--") {
                let token = token.trim_end_matches('-');
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
        anyhow::bail!("could not find a MIME boundary in multipart body")
    }

    fn split_parts<'a>(text: &'a str, boundary: &str) -> Vec<&'a str> {
        let delimiter = format!("--{}", boundary);
        text.split(&delimiter)
            .map(|part| part.trim_matches(|c| c == '\r' || c == '\n' || c == ' '))
            .filter(|part| !part.is_empty() && *part != "--")
            .collect()
    }
}

impl MimeSerializer for MimeReaderWriter {
    fn encode_parts(&self, parts: &[String]) -> EncodedMime {
        let batch_id = format!("batch_{}", Uuid::new_v4());
        let changeset_id = format!("changeset_{}", Uuid::new_v4());

        let mut body = String::new();
        body.push_str(&format!("--{}{}", batch_id, CRLF));
        body.push_str(&format!(
            "Content-Type: multipart/mixed; boundary={}{}",
            changeset_id, CRLF
        ));
        body.push_str(CRLF);

        for part in parts {
            body.push_str(&format!("--{}{}", changeset_id, CRLF));
            body.push_str(&format!("Content-Type: application/http{}", CRLF));
            body.push_str(&format!("Content-Transfer-Encoding: binary{}", CRLF));
            body.push_str(CRLF);
            body.push_str(part);
            body.push_str(CRLF);
        }

        body.push_str(&format!("--{}--{}", changeset_id, CRLF));
        body.push_str(CRLF);
        body.push_str(&format!("--{}--{}", batch_id, CRLF));

        EncodedMime {
            body,
            content_type: format!("multipart/mixed; boundary={}", batch_id),
        }
    }

    fn decode_parts(&self, body: &str) -> anyhow::Result<Vec<String>> {
        let batch_boundary = Self::extract_boundary(body)?;
        let mut parts = Vec::new();

        for outer in Self::split_parts(body, &batch_boundary) {
            if outer.contains("multipart/mixed") {
                let changeset_boundary = Self::extract_boundary(outer)?;
                for inner in Self::split_parts(outer, &changeset_boundary) {
                    if inner.contains("application/http") {
                        parts.push(inner.to_string());
                    }
                }
            } else if outer.contains("application/http") {
                parts.push(outer.to_string());
            }
        }

        Ok(parts)
    }
}
