//! Query model
//!
//! A query carries an optional filter tree, an optional projection and an
//! optional result cap, and knows how to emit itself as OData query
//! parameters.

use super::filters::Filter;
use crate::api::constants::query_params;
use crate::api::encoding::encode_odata_uri_values;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub select: Option<Vec<String>>,
    pub top: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn has_select(&self) -> bool {
        self.select.as_ref().is_some_and(|fields| !fields.is_empty())
    }

    /// Append `$select`, `$top` and `$filter` parameters.
    ///
    /// An absent filter emits no `$filter` parameter at all.
    pub fn append_query_params(&self, params: &mut Vec<(String, String)>) {
        if let Some(select) = &self.select {
            if !select.is_empty() {
                params.push((
                    query_params::SELECT.to_string(),
                    encode_odata_uri_values(select).join(","),
                ));
            }
        }

        if let Some(top) = self.top {
            params.push((query_params::TOP.to_string(), top.to_string()));
        }

        if let Some(filter) = &self.filter {
            let compiled = filter.to_odata_string();
            if !compiled.is_empty() {
                params.push((query_params::FILTER.to_string(), compiled));
            }
        }
    }
}
