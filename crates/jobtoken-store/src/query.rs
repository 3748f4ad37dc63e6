//! PostgREST query builder.
//!
//! Builds the query-string dialect PostgREST understands: `select=` with
//! embedded resources, `column=op.value` filters, `order=` and `limit=`.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// A table query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order_desc: Option<String>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns and embedded resources to return. Whitespace is stripped so
    /// multi-line embeds can be written readably.
    pub fn select(mut self, columns: &str) -> Self {
        let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.select = Some(compact);
        self
    }

    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    /// `column >= timestamp`, encoded as RFC 3339 with millisecond precision.
    pub fn since(self, column: &str, timestamp: DateTime<Utc>) -> Self {
        self.gte(column, timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Case-insensitive substring match. PostgREST wildcards in the needle
    /// are dropped so user input cannot widen the pattern.
    pub fn ilike_contains(mut self, column: &str, needle: &str) -> Self {
        let needle: String = needle
            .chars()
            .filter(|c| !matches!(c, '*' | '%'))
            .collect();
        self.filters
            .push((column.to_string(), format!("ilike.*{}*", needle)));
        self
    }

    /// Sort by `column`, largest first.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_desc = Some(column.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Query-string pairs, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.clone()));
        }
        params.extend(self.filters.iter().cloned());
        if let Some(column) = &self.order_desc {
            params.push(("order".to_string(), format!("{}.desc", column)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}
