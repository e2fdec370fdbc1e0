//! Transport seam
//!
//! The proxy core hands fully-built request contexts to a [`Transport`] and
//! maps whatever comes back. Retries, timeouts and endpoint failover live
//! behind this trait, not in the core.

pub mod http;
pub mod retry;

pub use http::ReqwestTransport;
pub use retry::{RetryConfig, RetryPolicy, RetryableError};

use std::collections::HashMap;

use async_trait::async_trait;
use roxmltree::Document;

use crate::api::context::RequestContext;

/// A raw service response: status, headers and body bytes.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends a request context and returns the raw response.
///
/// Implementations enforce the context's expected status set: a response
/// outside it must surface as [`crate::api::TableError::Protocol`], never as
/// a successful return.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_context(&self, context: &RequestContext) -> anyhow::Result<TransportResponse>;
}

/// Extract the human-readable message from a service XML error body.
///
/// Error documents look like `<error><code>...</code><message>...</message>
/// </error>`; namespaces vary between service versions, so matching is by
/// local name.
pub fn parse_service_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let doc = Document::parse(trimmed).ok()?;
    if doc.root_element().tag_name().name() != "error" {
        return None;
    }

    let find_text = |name: &str| {
        doc.descendants()
            .find(|node| node.tag_name().name() == name)
            .and_then(|node| node.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    };

    let message = find_text("message")?;
    match find_text("code") {
        Some(code) => Some(format!("{}: {}", code, message)),
        None => Some(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut response = TransportResponse::default();
        response
            .headers
            .insert("ETag".to_string(), "W/\"7\"".to_string());
        assert_eq!(response.header("etag"), Some("W/\"7\""));
        assert_eq!(response.header("ETAG"), Some("W/\"7\""));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_service_error_extraction() {
        let body = concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
            "<error xmlns=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\">",
            "<code>ResourceNotFound</code>",
            "<message xml:lang=\"en-US\">The specified resource does not exist.</message>",
            "</error>"
        );
        assert_eq!(
            parse_service_error_message(body).unwrap(),
            "ResourceNotFound: The specified resource does not exist."
        );
    }

    #[test]
    fn test_non_error_bodies_yield_nothing() {
        assert_eq!(parse_service_error_message(""), None);
        assert_eq!(parse_service_error_message("not xml"), None);
        assert_eq!(parse_service_error_message("<feed/>"), None);
    }
}
