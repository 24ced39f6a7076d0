use crate::utils::DEFAULT_PHOTO_BUCKET;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("Invalid store endpoint {0}: {1}")]
    InvalidEndpoint(String, String),
}

/// Unvalidated configuration as read from a config file or the command line.
///
/// Every field is optional here; `StoreConfig::resolve` decides what is
/// required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_bucket: Option<String>,
}

impl RawConfig {
    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            store_endpoint: other.store_endpoint.or(self.store_endpoint),
            access_key: other.access_key.or(self.access_key),
            photo_bucket: other.photo_bucket.or(self.photo_bucket),
        }
    }
}

/// Validated connection settings for the record store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the hosted backend, always ending in `/`
    pub store_endpoint: Url,
    pub access_key: String,
    /// Bucket the upload verifier writes probes into
    pub photo_bucket: String,
}

impl StoreConfig {
    /// Validate a raw configuration.
    ///
    /// Blank values count as missing. The endpoint must be an absolute
    /// http(s) URL.
    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let endpoint = non_blank(raw.store_endpoint).ok_or(ConfigError::MissingField("storeEndpoint"))?;
        let access_key = non_blank(raw.access_key).ok_or(ConfigError::MissingField("accessKey"))?;
        let photo_bucket =
            non_blank(raw.photo_bucket).unwrap_or_else(|| DEFAULT_PHOTO_BUCKET.to_string());

        let store_endpoint = parse_endpoint(&endpoint)?;

        Ok(Self {
            store_endpoint,
            access_key,
            photo_bucket,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    // A trailing slash keeps Url::join from dropping the last path segment
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEndpoint(raw.to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint(
            raw.to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Read a JSON configuration file
pub async fn read_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).await?;
    let config: RawConfig = serde_json::from_str(&content)?;
    Ok(config)
}
