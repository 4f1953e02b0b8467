//! Bulk export jobs
//!
//! Long-running backend jobs that write complete search results to cloud
//! storage. Unlike the interactive search cursor, results are not paged
//! back to the client; the terminal status carries a URL to the finished
//! artifact.

use crate::error::ApiError;
use crate::query::SearchQuery;
use crate::transport::{ApiExecutor, ApiRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Compression applied to the result artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Zip,
    None,
}

impl Compression {
    /// Wire name of the compression mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Zip => "zip",
            Compression::None => "none",
        }
    }
}

/// Options for starting an export job
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Artifact compression (zip by default)
    pub compression: Compression,
    /// Free-form metadata stored with the job
    pub metadata: Option<serde_json::Value>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Zip,
            metadata: None,
        }
    }
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the artifact compression
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Attach metadata to the job
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Lifecycle state of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Queued,
    Running,
    Merging,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadState {
    /// True once the job can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Failed | DownloadState::Cancelled
        )
    }
}

/// Estimated price of an export, as quoted at initiation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadPrice {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Work estimate returned when a job is accepted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedStats {
    #[serde(default)]
    pub events_scanned: u64,
    #[serde(default)]
    pub events_matched: u64,
    #[serde(default)]
    pub estimated_price: Option<DownloadPrice>,
}

/// A freshly accepted export job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadJob {
    pub job_id: String,
    #[serde(default)]
    pub estimated_stats: Option<EstimatedStats>,
    /// When the credentials the job runs under stop working
    #[serde(default)]
    pub token_expiry: Option<String>,
}

/// Progress counters for a running job
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    #[serde(default)]
    pub events_processed: u64,
    #[serde(default)]
    pub pages_processed: u64,
    #[serde(default)]
    pub bytes_processed: u64,
    #[serde(default)]
    pub runtime_seconds: f64,
    #[serde(default)]
    pub events_per_second: f64,
    #[serde(default)]
    pub date_range_percent: f64,
}

/// Status snapshot of an export job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatus {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: DownloadState,
    #[serde(default)]
    pub progress: Option<DownloadProgress>,
    #[serde(default)]
    pub error: Option<String>,
    /// Where to fetch the finished artifact, for completed jobs
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub result_expiry: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct DownloadList {
    #[serde(default)]
    jobs: Vec<DownloadStatus>,
}

/// How long and how often to wait for a job
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Wait between status checks
    pub poll_interval: Duration,
    /// Give up after this long; unlimited when unset
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: None,
        }
    }
}

/// Client for the export job API of one organization
#[derive(Clone)]
pub struct DownloadClient {
    executor: Arc<dyn ApiExecutor>,
    oid: String,
}

impl DownloadClient {
    /// Create a client from an executor and organization id
    pub fn new(executor: Arc<dyn ApiExecutor>, oid: impl Into<String>) -> Self {
        Self {
            executor,
            oid: oid.into(),
        }
    }

    /// Start an export job for the query's full result set.
    ///
    /// The service rejects jobs whose credentials would expire before the
    /// job can finish; that surfaces as [`ApiError::Status`] with the
    /// backend's explanation.
    pub async fn initiate(
        &self,
        query: &SearchQuery,
        options: &DownloadOptions,
    ) -> Result<DownloadJob, ApiError> {
        let mut body = serde_json::json!({
            "oid": self.oid,
            "query": query.text,
            "startTime": query.start.to_string(),
            "endTime": query.end.to_string(),
            "compression": options.compression.as_str(),
        });
        if let Some(stream) = query.stream {
            body["stream"] = serde_json::Value::String(stream.as_str().to_string());
        }
        if let Some(metadata) = &options.metadata {
            body["metadata"] = metadata.clone();
        }

        let request = ApiRequest::post("search/download").json(body);
        let value = self.executor.call(request).await?;
        let job: DownloadJob = serde_json::from_value(value)
            .map_err(|e| ApiError::Protocol(format!("malformed download response: {}", e)))?;

        info!(job_id = %job.job_id, query = %query.text, "download job started");
        Ok(job)
    }

    /// Fetch the current status of a job
    pub async fn status(&self, job_id: &str) -> Result<DownloadStatus, ApiError> {
        let request = ApiRequest::get(format!("search/download/{}", job_id));
        let value = self.executor.call(request).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Protocol(format!("malformed download status: {}", e)))
    }

    /// List the organization's export jobs, newest first
    pub async fn list(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<DownloadStatus>, ApiError> {
        let mut request = ApiRequest::get("search/download");
        if let Some(limit) = limit {
            request = request.query("limit", limit.to_string());
        }
        if let Some(offset) = offset {
            request = request.query("offset", offset.to_string());
        }

        let value = self.executor.call(request).await?;
        let list: DownloadList = serde_json::from_value(value)
            .map_err(|e| ApiError::Protocol(format!("malformed download list: {}", e)))?;
        Ok(list.jobs)
    }

    /// Cancel a job that has not yet finished.
    ///
    /// Cancelling an already-terminal job is a conflict the backend rejects;
    /// that propagates as [`ApiError::Status`] with code 409.
    pub async fn cancel(&self, job_id: &str) -> Result<bool, ApiError> {
        info!(job_id = %job_id, "cancelling download job");
        let request = ApiRequest::delete(format!("search/download/{}", job_id));
        self.executor.call(request).await?;
        Ok(true)
    }

    /// Poll a job until it reaches a terminal state.
    ///
    /// Completed and cancelled jobs are returned for the caller to inspect;
    /// a failed job raises [`ApiError::QueryFailed`] carrying the backend's
    /// error text. The optional callback observes every non-terminal status
    /// before the wait between checks.
    pub async fn wait(
        &self,
        job_id: &str,
        options: &WaitOptions,
        on_progress: Option<&(dyn Fn(&DownloadStatus) + Send + Sync)>,
    ) -> Result<DownloadStatus, ApiError> {
        let started = Instant::now();

        loop {
            let status = self.status(job_id).await?;

            match status.status {
                DownloadState::Completed | DownloadState::Cancelled => {
                    info!(job_id = %job_id, status = ?status.status, "download job finished");
                    return Ok(status);
                }
                DownloadState::Failed => {
                    let detail = status.error.as_deref().unwrap_or("no error detail");
                    return Err(ApiError::QueryFailed(format!(
                        "download job failed: {}",
                        detail
                    )));
                }
                DownloadState::Queued | DownloadState::Running | DownloadState::Merging => {
                    debug!(job_id = %job_id, status = ?status.status, "download job in progress");
                    if let Some(callback) = on_progress {
                        callback(&status);
                    }
                    if let Some(timeout) = options.timeout {
                        if started.elapsed() >= timeout {
                            return Err(ApiError::WaitTimeout {
                                seconds: timeout.as_secs(),
                            });
                        }
                    }
                    tokio::time::sleep(options.poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_states() {
        assert!(!DownloadState::Queued.is_terminal());
        assert!(!DownloadState::Running.is_terminal());
        assert!(!DownloadState::Merging.is_terminal());
        assert!(DownloadState::Completed.is_terminal());
        assert!(DownloadState::Failed.is_terminal());
        assert!(DownloadState::Cancelled.is_terminal());
    }

    #[test]
    fn test_download_job_deserialization() {
        let job: DownloadJob = serde_json::from_value(json!({
            "jobId": "job-123",
            "estimatedStats": {
                "eventsScanned": 50000,
                "eventsMatched": 1000,
                "estimatedPrice": {"price": 0.25, "currency": "USD"}
            },
            "tokenExpiry": "2025-01-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(job.job_id, "job-123");
        let stats = job.estimated_stats.unwrap();
        assert_eq!(stats.events_matched, 1000);
        assert_eq!(stats.estimated_price.unwrap().price, 0.25);
    }

    #[test]
    fn test_status_deserialization() {
        let status: DownloadStatus = serde_json::from_value(json!({
            "jobId": "job-123",
            "status": "running",
            "progress": {
                "eventsProcessed": 5000,
                "pagesProcessed": 10,
                "bytesProcessed": 1024000
            }
        }))
        .unwrap();

        assert_eq!(status.status, DownloadState::Running);
        assert_eq!(status.progress.unwrap().events_processed, 5000);

        let status: DownloadStatus = serde_json::from_value(json!({
            "status": "completed",
            "resultUrl": "https://storage.example.com/result.zip"
        }))
        .unwrap();
        assert!(status.status.is_terminal());
        assert_eq!(
            status.result_url.as_deref(),
            Some("https://storage.example.com/result.zip")
        );
    }

    #[test]
    fn test_wait_options_defaults() {
        let options = WaitOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(10));
        assert!(options.timeout.is_none());
    }
}
