mod hash;
mod ident;

pub use hash::compute_hash;
pub use ident::{is_valid_column_list, is_valid_identifier};

/// Bucket used for maintenance photo uploads
pub const DEFAULT_PHOTO_BUCKET: &str = "maintenance-photos";

/// Object prefix under which upload probes are written
pub const DEFAULT_PROBE_PREFIX: &str = "verification";

/// Path of the table REST API, relative to the store endpoint
pub const REST_PATH: &str = "rest/v1";

/// Path of the object storage API, relative to the store endpoint
pub const STORAGE_PATH: &str = "storage/v1/object";

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Render a JSON scalar the way it appears in console output and query strings.
///
/// Strings are printed bare; everything else uses its JSON form.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format a count with its noun, e.g. `1 row` or `3 rows`
pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
