//! Export publication.
//!
//! Published artifacts live under a key derived from the requester and
//! job IDs, so re-publishing the same job overwrites the previous object
//! instead of accumulating duplicates.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use reverie_models::JobId;

use crate::client::S3Client;
use crate::error::StorageResult;

/// Deterministic storage key for a job's published output.
pub fn export_key(requester_id: &str, job_id: &JobId) -> String {
    format!("user-exports/{}/{}.mp4", requester_id, job_id)
}

/// A published artifact with its time-limited access URL.
#[derive(Debug, Clone)]
pub struct PublishedExport {
    /// Storage key of the object.
    pub key: String,
    /// Presigned read URL.
    pub url: String,
    /// When the URL stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// Publication seam for the coordinator.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload `local` as the job's output and mint an access URL.
    ///
    /// Does not delete the local file; workspace teardown owns that.
    async fn publish(
        &self,
        local: &Path,
        requester_id: &str,
        job_id: &JobId,
    ) -> StorageResult<PublishedExport>;
}

/// Publisher backed by S3-compatible object storage.
#[derive(Clone)]
pub struct S3Publisher {
    client: S3Client,
    url_ttl: Duration,
}

impl S3Publisher {
    /// Create a publisher minting URLs valid for `url_ttl`.
    pub fn new(client: S3Client, url_ttl: Duration) -> Self {
        Self { client, url_ttl }
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    async fn publish(
        &self,
        local: &Path,
        requester_id: &str,
        job_id: &JobId,
    ) -> StorageResult<PublishedExport> {
        let key = export_key(requester_id, job_id);

        self.client.upload_file(local, &key, "video/mp4").await?;
        let url = self.client.presign_get(&key, self.url_ttl).await?;
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.url_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(7));

        info!(
            requester_id = %requester_id,
            job_id = %job_id,
            key = %key,
            "Published export"
        );

        Ok(PublishedExport {
            key,
            url,
            expires_at,
        })
    }
}
