//! Options for the listing operations
//!
//! Both option types convert from bare strings and bare filters, mirroring
//! the polymorphic parameters of the original proxy surface: a string means a
//! table-name prefix for `query_tables` but a raw filter expression for
//! `query_entities`.

use super::filters::Filter;
use super::query::Query;
use crate::api::models::TableServiceOptions;

/// Options for `query_tables`.
#[derive(Debug, Clone, Default)]
pub struct QueryTablesOptions {
    pub query: Query,
    pub prefix: Option<String>,
    pub next_table_name: Option<String>,
    pub service_options: TableServiceOptions,
}

impl QueryTablesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn with_next_table_name(mut self, token: impl Into<String>) -> Self {
        self.next_table_name = Some(token.into());
        self
    }

    /// The query with any name prefix folded into the filter.
    ///
    /// A prefix P becomes the range filter `TableName ge 'P' and TableName
    /// le 'P{'`; `{` is the character after `z`, giving an exclusive upper
    /// bound. A caller-supplied filter is AND-combined with it.
    pub fn effective_query(&self) -> Query {
        let mut query = self.query.clone();

        if let Some(prefix) = self.prefix.as_ref().filter(|p| !p.is_empty()) {
            let prefix_filter = Filter::and(
                Filter::binary(
                    "ge",
                    Filter::prop("TableName"),
                    Filter::constant(prefix.as_str()),
                ),
                Filter::binary(
                    "le",
                    Filter::prop("TableName"),
                    Filter::constant(format!("{}{{", prefix)),
                ),
            );

            query.filter = match query.filter.take() {
                None => Some(prefix_filter),
                Some(existing) => Some(Filter::and(existing, prefix_filter)),
            };
        }

        query
    }
}

impl From<&str> for QueryTablesOptions {
    fn from(prefix: &str) -> Self {
        Self::new().with_prefix(prefix)
    }
}

impl From<String> for QueryTablesOptions {
    fn from(prefix: String) -> Self {
        Self::new().with_prefix(prefix)
    }
}

impl From<Filter> for QueryTablesOptions {
    fn from(filter: Filter) -> Self {
        Self::new().with_filter(filter)
    }
}

impl From<Query> for QueryTablesOptions {
    fn from(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

/// Options for `query_entities`.
#[derive(Debug, Clone, Default)]
pub struct QueryEntitiesOptions {
    pub query: Query,
    pub next_partition_key: Option<String>,
    pub next_row_key: Option<String>,
    pub service_options: TableServiceOptions,
}

impl QueryEntitiesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn with_continuation(
        mut self,
        next_partition_key: impl Into<String>,
        next_row_key: impl Into<String>,
    ) -> Self {
        self.next_partition_key = Some(next_partition_key.into());
        self.next_row_key = Some(next_row_key.into());
        self
    }
}

impl From<&str> for QueryEntitiesOptions {
    fn from(query_string: &str) -> Self {
        Self::new().with_filter(Filter::query_string(query_string))
    }
}

impl From<String> for QueryEntitiesOptions {
    fn from(query_string: String) -> Self {
        Self::new().with_filter(Filter::query_string(query_string))
    }
}

impl From<Filter> for QueryEntitiesOptions {
    fn from(filter: Filter) -> Self {
        Self::new().with_filter(filter)
    }
}

impl From<Query> for QueryEntitiesOptions {
    fn from(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_becomes_range_filter() {
        let options = QueryTablesOptions::from("prod");
        let query = options.effective_query();
        assert_eq!(
            query.filter.unwrap().to_odata_string(),
            "((TableName ge 'prod') and (TableName le 'prod{'))"
        );
    }

    #[test]
    fn test_prefix_is_conjoined_with_existing_filter() {
        let options = QueryTablesOptions::new()
            .with_filter(Filter::eq("TableName", "exact"))
            .with_prefix("p");
        let compiled = options.effective_query().filter.unwrap().to_odata_string();
        assert_eq!(
            compiled,
            "((TableName eq 'exact') and ((TableName ge 'p') and (TableName le 'p{')))"
        );
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let options = QueryTablesOptions::new().with_prefix("");
        assert!(options.effective_query().filter.is_none());
    }

    #[test]
    fn test_entity_options_from_raw_query_string() {
        let options = QueryEntitiesOptions::from("Age gt 30");
        assert_eq!(
            options.query.filter.unwrap().to_odata_string(),
            "Age gt 30"
        );
    }
}
