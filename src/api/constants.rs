//! Wire constants for the table storage REST protocol

/// Resource path for the table collection
pub const TABLES_PATH: &str = "Tables";

/// Resource path for batch requests
pub const BATCH_PATH: &str = "$batch";

/// Content type for entity and table bodies
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// Content type family for batch requests
pub const MULTIPART_MIXED: &str = "multipart/mixed";

/// Value of `DataServiceVersion` required when `$select` projections are used
pub const MAX_DATA_SERVICE_VERSION: &str = "3.0;NetFx";

/// Wildcard ETag, matches any stored version
pub const ASTERISK: &str = "*";

/// Standard headers used by the table service
pub mod headers {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_ID: &str = "Content-ID";
    pub const IF_MATCH: &str = "If-Match";
    pub const ETAG: &str = "ETag";
    pub const DATA_SERVICE_VERSION: &str = "DataServiceVersion";

    /// Continuation headers returned by listing operations
    pub const CONTINUATION_NEXT_TABLE_NAME: &str = "x-ms-continuation-NextTableName";
    pub const CONTINUATION_NEXT_PARTITION_KEY: &str = "x-ms-continuation-NextPartitionKey";
    pub const CONTINUATION_NEXT_ROW_KEY: &str = "x-ms-continuation-NextRowKey";
}

/// Query parameter names
pub mod query_params {
    pub const FILTER: &str = "$filter";
    pub const SELECT: &str = "$select";
    pub const TOP: &str = "$top";
    pub const NEXT_TABLE_NAME: &str = "NextTableName";
    pub const NEXT_PARTITION_KEY: &str = "NextPartitionKey";
    pub const NEXT_ROW_KEY: &str = "NextRowKey";
    pub const COMP: &str = "comp";
    pub const TIMEOUT: &str = "timeout";
}

/// HTTP methods for operations (MERGE is a service extension verb)
pub mod methods {
    pub const GET: &str = "GET";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
    pub const MERGE: &str = "MERGE";
    pub const DELETE: &str = "DELETE";
}

/// Expected success status codes, exact per operation
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const ACCEPTED: u16 = 202;
    pub const NO_CONTENT: u16 = 204;
}

/// Build the path addressing a single table resource
pub fn table_path(table: &str) -> String {
    format!("{}('{}')", TABLES_PATH, table)
}
