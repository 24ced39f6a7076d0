//! Clients for the hosted record store.
//!
//! Commands only ever talk to the `RecordStore` and `ObjectStore` traits.
//! `HttpStore` speaks the backend's REST API; `MemoryStore` keeps tables and
//! objects in process with the same filter semantics.

mod filter;
mod http;
mod memory;

pub use filter::{parse_eq_arg, same_value, Filter};
pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// A single row as returned by the store
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Store responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Refusing unfiltered {0} on table {1}")]
    Unfiltered(&'static str, String),

    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Column projection, filters and row limit for a select
#[derive(Debug, Clone)]
pub struct Query {
    /// `*` or a comma-separated column list
    pub columns: String,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(columns: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new("*")
    }
}

/// Table access on the record store.
///
/// `update` and `delete` are single bulk statements; they return the rows
/// they touched and refuse to run without at least one filter.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError>;

    async fn update(&self, table: &str, fields: &Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;
}

/// Object (file) storage on the record store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError>;
}
