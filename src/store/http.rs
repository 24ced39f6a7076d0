use super::{Filter, ObjectStore, Query, RecordStore, Row, StoreError};
use crate::config::StoreConfig;
use crate::utils::{REST_PATH, STORAGE_PATH};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::json;
use tracing::debug;

/// REST client for the hosted backend.
///
/// Tables live under `{endpoint}/rest/v1/{table}` and objects under
/// `{endpoint}/storage/v1/object/{bucket}/{path}`. Every request carries the
/// access key both as `apikey` and as a bearer token.
pub struct HttpStore {
    http: Client,
    endpoint: Url,
    access_key: String,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.store_endpoint.clone(),
            access_key: config.access_key.clone(),
        }
    }

    /// URL for a table request with filters and optional select/limit parameters
    pub fn table_url(
        &self,
        table: &str,
        filters: &[Filter],
        query: Option<&Query>,
    ) -> Result<Url, StoreError> {
        let mut url = self.url_with_segments(REST_PATH.split('/').chain([table]))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(query) = query {
                pairs.append_pair("select", &query.columns.replace(' ', ""));
            }
            for filter in filters {
                pairs.append_pair(filter.column(), &filter.to_param());
            }
            if let Some(limit) = query.and_then(|q| q.limit) {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// URL for a single object, or for the bucket itself when `path` is `None`
    pub fn object_url(&self, bucket: &str, path: Option<&str>) -> Result<Url, StoreError> {
        let object_segments = path
            .map(|p| p.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();
        self.url_with_segments(
            STORAGE_PATH
                .split('/')
                .chain([bucket])
                .chain(object_segments),
        )
    }

    fn url_with_segments<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_rows(response: Response) -> Result<Vec<Row>, StoreError> {
    let response = check_status(response).await?;
    let rows = response.json::<Vec<Row>>().await?;
    Ok(rows)
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let url = self.table_url(table, &query.filters, Some(query))?;
        debug!(%url, "select");
        let response = self.authorized(self.http.get(url)).send().await?;
        read_rows(response).await
    }

    async fn update(&self, table: &str, fields: &Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unfiltered("update", table.to_string()));
        }
        let url = self.table_url(table, filters, None)?;
        debug!(%url, "update");
        let response = self
            .authorized(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;
        read_rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unfiltered("delete", table.to_string()));
        }
        let url = self.table_url(table, filters, None)?;
        debug!(%url, "delete");
        let response = self
            .authorized(self.http.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        read_rows(response).await
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = self.object_url(bucket, Some(path))?;
        debug!(%url, size = bytes.len(), "upload");
        let response = self
            .authorized(self.http.post(url))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(bucket, Some(path))?;
        debug!(%url, "download");
        let response = self.authorized(self.http.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{bucket}/{path}")));
        }
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError> {
        let url = self.object_url(bucket, None)?;
        debug!(%url, count = paths.len(), "remove");
        let response = self
            .authorized(self.http.delete(url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
