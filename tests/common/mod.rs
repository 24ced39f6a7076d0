#![allow(dead_code)]

use serde_json::Value;
use std::sync::Arc;
use store_maint::{Dispatcher, MemoryStore, RawConfig, Row, StoreConfig};
use tempfile::TempDir;

/// Create a temporary directory for config files
pub fn create_test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A validated config pointing at a local endpoint that is never contacted
pub fn test_config() -> StoreConfig {
    StoreConfig::resolve(RawConfig {
        store_endpoint: Some("http://localhost:54321".to_string()),
        access_key: Some("test-access-key".to_string()),
        photo_bucket: None,
    })
    .expect("Test config should resolve")
}

/// Convert JSON object literals into rows
pub fn rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .map(|v| v.as_object().cloned().expect("Row literal should be an object"))
        .collect()
}

/// Dispatcher wired to an in-memory store; the store is returned for assertions
pub fn memory_dispatcher(store: MemoryStore) -> (Dispatcher, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let dispatcher = Dispatcher::new(test_config(), store.clone(), store.clone());
    (dispatcher, store)
}
