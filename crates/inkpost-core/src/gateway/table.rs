//! Table API contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Renders the filter value the way it appears in a query string.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(text) => text.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether a row satisfies this filter.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Single-column sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Parameters of a `select` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }
}

/// Row-oriented table operations of the hosted backend.
///
/// Rows travel as JSON objects. Every failure is reported as
/// `InkpostError::Gateway` carrying the backend's message verbatim.
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// Selects all rows matching the query.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Inserts rows and returns them as stored (with server-assigned
    /// `id` and `created_at`).
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Applies `patch` to every row matching `filter` and returns the
    /// updated rows. An empty result means nothing matched.
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>>;

    /// Deletes every row matching `filter`. Matching nothing is not an error.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<()>;
}
