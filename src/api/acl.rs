//! Table access control lists
//!
//! Maps to the service's `SignedIdentifiers` XML document, read and written
//! via the `comp=acl` resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored access policy window and permission set.
///
/// Permissions use the service's single-letter grammar, e.g. `"raud"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,
    #[serde(rename = "Expiry")]
    pub expiry: DateTime<Utc>,
    #[serde(rename = "Permission")]
    pub permission: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedIdentifier {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "AccessPolicy")]
    pub access_policy: AccessPolicy,
}

/// The ACL of a single table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "SignedIdentifiers")]
pub struct TableAcl {
    #[serde(rename = "SignedIdentifier", default)]
    pub signed_identifiers: Vec<SignedIdentifier>,
}

impl TableAcl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        id: impl Into<String>,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
        permission: impl Into<String>,
    ) -> &mut Self {
        self.signed_identifiers.push(SignedIdentifier {
            id: id.into(),
            access_policy: AccessPolicy {
                start,
                expiry,
                permission: permission.into(),
            },
        });
        self
    }
}
