//! REST document-store client.
//!
//! Talks to the journaling backend's document API: one JSON document per
//! job under `/jobs/{id}`. Transitions are applied through the model's
//! state machine and written back as full documents, so an invalid
//! transition is rejected locally before any write goes out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use reverie_models::{ExportJob, JobId};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Job store backed by a REST document API.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestStore {
    /// Create a store client for the given API base URL.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::config_error(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create from environment variables (`JOB_STORE_URL`, `JOB_STORE_TOKEN`).
    pub fn from_env() -> StoreResult<Self> {
        let base_url = std::env::var("JOB_STORE_URL")
            .map_err(|_| StoreError::config_error("JOB_STORE_URL not set"))?;
        let token = std::env::var("JOB_STORE_TOKEN").ok();
        Self::new(base_url, token)
    }

    fn job_url(&self, id: &JobId) -> String {
        format!("{}/jobs/{}", self.base_url, id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn put(&self, job: &ExportJob) -> StoreResult<()> {
        let response = self
            .authorize(self.client.put(self.job_url(&job.id)).json(job))
            .send()
            .await
            .map_err(|e| StoreError::request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        debug!(job_id = %job.id, status = %job.status, "Persisted job transition");
        Ok(())
    }

    async fn transition<F>(&self, id: &JobId, f: F) -> StoreResult<ExportJob>
    where
        F: FnOnce(ExportJob) -> StoreResult<ExportJob>,
    {
        let job = self.get(id).await?;
        let updated = f(job)?;
        self.put(&updated).await?;
        Ok(updated)
    }
}

#[async_trait]
impl JobStore for RestStore {
    async fn get(&self, id: &JobId) -> StoreResult<ExportJob> {
        let response = self
            .authorize(self.client.get(self.job_url(id)))
            .send()
            .await
            .map_err(|e| StoreError::request_failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::not_found(id.as_str())),
            status if !status.is_success() => Err(StoreError::BadStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
            _ => response
                .json::<ExportJob>()
                .await
                .map_err(|e| StoreError::request_failed(e.to_string())),
        }
    }

    async fn next_queued(&self) -> StoreResult<Option<ExportJob>> {
        let url = format!("{}/jobs?status=queued&limit=1", self.base_url);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let mut jobs: Vec<ExportJob> = response
            .json()
            .await
            .map_err(|e| StoreError::request_failed(e.to_string()))?;
        Ok(if jobs.is_empty() {
            None
        } else {
            Some(jobs.remove(0))
        })
    }

    async fn mark_processing(&self, id: &JobId) -> StoreResult<ExportJob> {
        self.transition(id, |job| Ok(job.start()?)).await
    }

    async fn mark_done(&self, id: &JobId, result_url: &str) -> StoreResult<ExportJob> {
        self.transition(id, |job| Ok(job.complete(result_url)?))
            .await
    }

    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<ExportJob> {
        self.transition(id, |job| Ok(job.fail(error)?)).await
    }
}
