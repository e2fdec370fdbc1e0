//! OData URI value encoding
//!
//! Keys embedded in entity paths and `$select` field lists must be escaped
//! with the service's literal rule before percent-encoding.

/// Encode a value for embedding in an OData URI.
///
/// Every single quote is doubled (the OData literal escape, not a double
/// quote), then the remaining reserved characters are percent-encoded.
pub fn encode_odata_uri_value(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    urlencoding::encode(&escaped).into_owned()
}

/// Encode a list of values element-wise, preserving order.
pub fn encode_odata_uri_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| encode_odata_uri_value(value))
        .collect()
}
