use super::{Filter, ObjectStore, Query, RecordStore, Row, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// In-process record store.
///
/// Tables are plain row vectors in insertion order; objects are keyed by
/// `(bucket, path)`. Filters follow the same null semantics as the REST API.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows, replacing any existing contents
    pub fn with_table(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.get_mut().insert(table.to_string(), rows);
        self
    }

    /// Snapshot of a table's rows
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().await.get(table).cloned().unwrap_or_default()
    }

    /// Paths of all objects currently held in a bucket
    pub async fn object_paths(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

fn missing_table(table: &str) -> StoreError {
    StoreError::Status {
        status: 404,
        body: format!("relation \"{table}\" does not exist"),
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

fn project(row: &Row, columns: &str) -> Row {
    if columns.trim() == "*" {
        return row.clone();
    }
    columns
        .split(',')
        .map(str::trim)
        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
        .collect()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.lock().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        let selected = rows
            .iter()
            .filter(|row| matches_all(row, &query.filters))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| project(row, &query.columns))
            .collect();
        Ok(selected)
    }

    async fn update(&self, table: &str, fields: &Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unfiltered("update", table.to_string()));
        }
        let mut tables = self.tables.lock().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            for (key, value) in fields {
                row.insert(key.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unfiltered("delete", table.to_string()));
        }
        let mut tables = self.tables.lock().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;

        let (deleted, kept): (Vec<Row>, Vec<Row>) =
            rows.drain(..).partition(|row| matches_all(row, filters));
        *rows = kept;
        Ok(deleted)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().await;
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("object {bucket}/{path} already exists"),
            });
        }
        objects.insert(key, bytes);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{path}")))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().await;
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}
