//! EDM property types and literal serialization
//!
//! Provides the typed value model for entity properties and the two literal
//! grammars the service understands: query literals (used in `$filter`
//! expressions) and Atom property text (used in entity bodies).

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Property type tags understood by the table service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdmType {
    Binary,
    Boolean,
    DateTime,
    Double,
    Guid,
    Int32,
    Int64,
    String,
}

impl EdmType {
    /// The wire name, as carried in `m:type` attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdmType::Binary => "Edm.Binary",
            EdmType::Boolean => "Edm.Boolean",
            EdmType::DateTime => "Edm.DateTime",
            EdmType::Double => "Edm.Double",
            EdmType::Guid => "Edm.Guid",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::String => "Edm.String",
        }
    }

    /// Parse an `m:type` attribute value. An absent attribute means string.
    pub fn parse(name: Option<&str>) -> anyhow::Result<Self> {
        match name {
            None | Some("") => Ok(EdmType::String),
            Some("Edm.Binary") => Ok(EdmType::Binary),
            Some("Edm.Boolean") => Ok(EdmType::Boolean),
            Some("Edm.DateTime") => Ok(EdmType::DateTime),
            Some("Edm.Double") => Ok(EdmType::Double),
            Some("Edm.Guid") => Ok(EdmType::Guid),
            Some("Edm.Int32") => Ok(EdmType::Int32),
            Some("Edm.Int64") => Ok(EdmType::Int64),
            Some("Edm.String") => Ok(EdmType::String),
            Some(other) => anyhow::bail!("unknown EDM type '{}'", other),
        }
    }
}

impl std::fmt::Display for EdmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, non-null property value.
#[derive(Debug, Clone, PartialEq)]
pub enum EdmValue {
    Binary(Vec<u8>),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Double(f64),
    Guid(Uuid),
    Int32(i32),
    Int64(i64),
    String(String),
}

impl EdmValue {
    pub fn edm_type(&self) -> EdmType {
        match self {
            EdmValue::Binary(_) => EdmType::Binary,
            EdmValue::Boolean(_) => EdmType::Boolean,
            EdmValue::DateTime(_) => EdmType::DateTime,
            EdmValue::Double(_) => EdmType::Double,
            EdmValue::Guid(_) => EdmType::Guid,
            EdmValue::Int32(_) => EdmType::Int32,
            EdmValue::Int64(_) => EdmType::Int64,
            EdmValue::String(_) => EdmType::String,
        }
    }

    /// Serialize for the `$filter` query grammar.
    ///
    /// Strings are quoted with embedded quotes doubled; the remaining types
    /// use the service's typed literal prefixes.
    pub fn serialize_query_value(&self) -> String {
        match self {
            EdmValue::Binary(bytes) => format!("X'{}'", hex_lower(bytes)),
            EdmValue::Boolean(b) => b.to_string(),
            EdmValue::DateTime(dt) => format!("datetime'{}'", edm_date_time(dt)),
            EdmValue::Double(d) => d.to_string(),
            EdmValue::Guid(g) => format!("guid'{}'", g),
            EdmValue::Int32(i) => i.to_string(),
            EdmValue::Int64(i) => format!("{}L", i),
            EdmValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    /// Serialize as Atom property text.
    pub fn serialize_atom_value(&self) -> String {
        match self {
            EdmValue::Binary(bytes) => BASE64.encode(bytes),
            EdmValue::Boolean(b) => b.to_string(),
            EdmValue::DateTime(dt) => edm_date_time(dt),
            EdmValue::Double(d) => d.to_string(),
            EdmValue::Guid(g) => g.to_string(),
            EdmValue::Int32(i) => i.to_string(),
            EdmValue::Int64(i) => i.to_string(),
            EdmValue::String(s) => s.clone(),
        }
    }

    /// Parse Atom property text according to the declared type.
    pub fn parse_atom_value(edm_type: EdmType, text: &str) -> anyhow::Result<Self> {
        let value = match edm_type {
            EdmType::Binary => EdmValue::Binary(
                BASE64
                    .decode(text.trim())
                    .context("invalid base64 in Edm.Binary property")?,
            ),
            EdmType::Boolean => EdmValue::Boolean(
                text.parse()
                    .with_context(|| format!("invalid Edm.Boolean value '{}'", text))?,
            ),
            EdmType::DateTime => EdmValue::DateTime(
                DateTime::parse_from_rfc3339(text)
                    .with_context(|| format!("invalid Edm.DateTime value '{}'", text))?
                    .with_timezone(&Utc),
            ),
            EdmType::Double => EdmValue::Double(
                text.parse()
                    .with_context(|| format!("invalid Edm.Double value '{}'", text))?,
            ),
            EdmType::Guid => EdmValue::Guid(
                text.parse()
                    .with_context(|| format!("invalid Edm.Guid value '{}'", text))?,
            ),
            EdmType::Int32 => EdmValue::Int32(
                text.parse()
                    .with_context(|| format!("invalid Edm.Int32 value '{}'", text))?,
            ),
            EdmType::Int64 => EdmValue::Int64(
                text.parse()
                    .with_context(|| format!("invalid Edm.Int64 value '{}'", text))?,
            ),
            EdmType::String => EdmValue::String(text.to_string()),
        };
        Ok(value)
    }
}

/// UTC ISO-8601 with fractional seconds, the service's EDM date form.
fn edm_date_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl From<String> for EdmValue {
    fn from(value: String) -> Self {
        EdmValue::String(value)
    }
}

impl From<&str> for EdmValue {
    fn from(value: &str) -> Self {
        EdmValue::String(value.to_string())
    }
}

impl From<i32> for EdmValue {
    fn from(value: i32) -> Self {
        EdmValue::Int32(value)
    }
}

impl From<i64> for EdmValue {
    fn from(value: i64) -> Self {
        EdmValue::Int64(value)
    }
}

impl From<f64> for EdmValue {
    fn from(value: f64) -> Self {
        EdmValue::Double(value)
    }
}

impl From<bool> for EdmValue {
    fn from(value: bool) -> Self {
        EdmValue::Boolean(value)
    }
}

impl From<Vec<u8>> for EdmValue {
    fn from(value: Vec<u8>) -> Self {
        EdmValue::Binary(value)
    }
}

impl From<Uuid> for EdmValue {
    fn from(value: Uuid) -> Self {
        EdmValue::Guid(value)
    }
}

impl From<DateTime<Utc>> for EdmValue {
    fn from(value: DateTime<Utc>) -> Self {
        EdmValue::DateTime(value)
    }
}
