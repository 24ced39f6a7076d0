use super::{CommandContext, CommandError, MaintenanceCommand, Report};
use crate::store::{ObjectStore, StoreError};
use crate::utils::{compute_hash, now_iso, DEFAULT_PROBE_PREFIX};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

const PROBE_CONTENT_TYPE: &str = "text/plain";

/// Writes a probe object to the photo bucket, reads it back and compares
/// digests.
#[derive(Debug, Clone)]
pub struct VerifyUpload {
    /// Bucket to probe; the configured photo bucket when `None`
    pub bucket: Option<String>,
    pub prefix: String,
    /// Leave the probe object in place after verification
    pub keep: bool,
}

impl Default for VerifyUpload {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: DEFAULT_PROBE_PREFIX.to_string(),
            keep: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub bucket: String,
    pub path: String,
    pub size: usize,
    pub uploaded_digest: String,
    pub downloaded_digest: String,
    pub verified: bool,
    pub removed: bool,
}

/// Check if an object prefix is made of plain path segments
fn is_valid_prefix(prefix: &str) -> bool {
    prefix.split('/').all(|segment| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    })
}

fn storage_error(operation: &'static str, bucket: &str, path: &str, source: StoreError) -> CommandError {
    CommandError::Storage {
        operation,
        bucket: bucket.to_string(),
        path: path.to_string(),
        source,
    }
}

#[async_trait]
impl MaintenanceCommand for VerifyUpload {
    fn name(&self) -> &str {
        "verify-upload"
    }

    fn description(&self) -> &str {
        "Upload a probe file to the photo bucket and check it reads back intact"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError> {
        let prefix = self.prefix.trim_matches('/');
        if !is_valid_prefix(prefix) {
            return Err(CommandError::InvalidArgument(format!(
                "invalid object prefix: '{}'",
                self.prefix
            )));
        }
        let bucket = self
            .bucket
            .clone()
            .unwrap_or_else(|| ctx.config.photo_bucket.clone());

        let probe_id = Uuid::new_v4();
        let path = format!("{prefix}/{probe_id}.txt");
        let payload = format!("upload probe {probe_id}\ncreated_at={}\n", now_iso()).into_bytes();
        let uploaded_digest = compute_hash(&payload);
        let size = payload.len();

        ctx.objects
            .upload(&bucket, &path, payload, PROBE_CONTENT_TYPE)
            .await
            .map_err(|e| storage_error("upload", &bucket, &path, e))?;
        info!(bucket = %bucket, path = %path, size, "Uploaded probe");

        let downloaded = match ctx.objects.download(&bucket, &path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if !self.keep {
                    remove_probe(ctx.objects.as_ref(), &bucket, &path).await;
                }
                return Err(storage_error("download", &bucket, &path, e));
            }
        };
        let downloaded_digest = compute_hash(&downloaded);
        let verified = downloaded_digest == uploaded_digest;
        if !verified {
            warn!(bucket = %bucket, path = %path, "Probe content does not match upload");
        }

        // A failed removal still leaves a complete verification to report
        let removed = !self.keep && remove_probe(ctx.objects.as_ref(), &bucket, &path).await;

        Ok(Report::Upload(UploadReport {
            bucket,
            path,
            size,
            uploaded_digest,
            downloaded_digest,
            verified,
            removed,
        }))
    }
}

/// Best-effort probe removal; returns whether the object was removed
async fn remove_probe(objects: &dyn ObjectStore, bucket: &str, path: &str) -> bool {
    match objects.remove(bucket, &[path.to_string()]).await {
        Ok(()) => true,
        Err(e) => {
            warn!(bucket = %bucket, path = %path, error = %e, "Failed to remove probe");
            false
        }
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uploaded {}/{} ({} bytes)", self.bucket, self.path, self.size)?;
        writeln!(f, "  sha256: {}", self.uploaded_digest)?;
        if self.verified {
            writeln!(f, "  read back intact")?;
        } else {
            writeln!(f, "  MISMATCH: read back {}", self.downloaded_digest)?;
        }
        if self.removed {
            writeln!(f, "  probe removed")
        } else {
            writeln!(f, "  probe kept")
        }
    }
}
