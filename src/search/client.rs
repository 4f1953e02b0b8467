//! Search service operations
//!
//! [`SearchClient`] owns the thin request builders for the search API:
//! validate, initiate, poll and cancel. Pagination across pages lives in
//! [`SearchCursor`](super::SearchCursor), which composes these operations.

use super::hooks::CancelToken;
use crate::error::ApiError;
use crate::query::SearchQuery;
use crate::results::{PollResponse, ValidationResult};
use crate::transport::{ApiExecutor, ApiRequest};
use crate::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry budget for one poll loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of status requests before giving up
    pub max_attempts: u32,
    /// Client-side floor for the wait between attempts
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Client for the asynchronous search API of one organization
#[derive(Clone)]
pub struct SearchClient {
    executor: Arc<dyn ApiExecutor>,
    oid: String,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("oid", &self.oid)
            .finish_non_exhaustive()
    }
}

impl SearchClient {
    /// Create a client from an executor and organization id
    pub fn new(executor: Arc<dyn ApiExecutor>, oid: impl Into<String>) -> Self {
        Self {
            executor,
            oid: oid.into(),
        }
    }

    /// Organization id requests are scoped to
    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub(crate) fn executor(&self) -> Arc<dyn ApiExecutor> {
        Arc::clone(&self.executor)
    }

    /// Check a candidate query for syntax problems and estimated cost.
    ///
    /// One request, no retries. A bad query is not an `Err`: the service
    /// reports it in [`ValidationResult::error`], and callers must check
    /// that field (or [`ValidationResult::is_valid`]). Only transport and
    /// auth failures raise.
    pub async fn validate(&self, query: &SearchQuery) -> Result<ValidationResult, ApiError> {
        debug!(query = %query.text, "validating query");
        let request = ApiRequest::post("search/validate").json(self.search_body(query));
        let value = self.executor.call(request).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Protocol(format!("malformed validate response: {}", e)))
    }

    /// Submit a new search job and return its identifier.
    ///
    /// A response without a job identifier is a protocol violation, not a
    /// retryable condition.
    pub async fn initiate(&self, query: &SearchQuery, paginated: bool) -> Result<String, ApiError> {
        let mut body = self.search_body(query);
        body["paginated"] = serde_json::Value::Bool(paginated);

        let request = ApiRequest::post("search").json(body);
        let value = self.executor.call(request).await?;

        let job_id = value
            .get("queryId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::missing_field("queryId"))?
            .to_string();

        info!(job_id = %job_id, query = %query.text, "search initiated");
        Ok(job_id)
    }

    /// Run one bounded poll loop until the backend reports a page or fails.
    ///
    /// Issues up to `config.max_attempts` status requests. A response with a
    /// non-empty `error` is returned immediately for the caller to surface
    /// (the backend failed the query; retrying cannot help). A completed
    /// response is returned with its results. Anything else waits
    /// `max(server hint, config.poll_interval)` and tries again; when the
    /// budget runs out this returns [`ApiError::RetryExhausted`].
    ///
    /// The cancel token is consulted before every status request, including
    /// right after each inter-attempt wait, so a token tripped mid-loop
    /// stops the next attempt with [`ApiError::Cancelled`]. The optional
    /// callback observes each unfinished attempt before its wait.
    pub async fn poll(
        &self,
        job_id: &str,
        token: Option<&str>,
        config: &PollConfig,
        cancel: Option<&CancelToken>,
        on_attempt: Option<&(dyn Fn(u32) + Send + Sync)>,
    ) -> Result<PollResponse, ApiError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());

        for attempt in 1..=config.max_attempts {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                info!(job_id = %job_id, attempt, "polling cancelled");
                return Err(ApiError::Cancelled);
            }

            let mut request = ApiRequest::get(format!("search/{}", job_id));
            if let Some(token) = token {
                request = request.query("token", token);
            }

            let value = self.executor.call(request).await?;
            let poll: PollResponse = serde_json::from_value(value)
                .map_err(|e| ApiError::Protocol(format!("malformed poll response: {}", e)))?;

            if let Some(error) = poll.terminal_error() {
                debug!(job_id = %job_id, error = %error, "backend reported query failure");
                return Ok(poll);
            }

            if poll.completed {
                debug!(
                    job_id = %job_id,
                    attempt,
                    records = poll.results.len(),
                    "page ready"
                );
                return Ok(poll);
            }

            if attempt < config.max_attempts {
                if let Some(callback) = on_attempt {
                    callback(attempt);
                }
                let wait = poll
                    .next_poll_in_ms
                    .map(Duration::from_millis)
                    .unwrap_or(Duration::ZERO)
                    .max(config.poll_interval);
                debug!(job_id = %job_id, attempt, wait_ms = wait.as_millis() as u64, "not ready");
                tokio::time::sleep(wait).await;
            }
        }

        Err(ApiError::RetryExhausted {
            attempts: config.max_attempts,
        })
    }

    /// Ask the backend to terminate a job.
    ///
    /// The acknowledgement body is opaque; only transport-level success is
    /// meaningful. Use [`cancel_best_effort`](Self::cancel_best_effort) from
    /// cleanup paths that must never raise.
    pub async fn cancel(&self, job_id: &str) -> Result<serde_json::Value, ApiError> {
        info!(job_id = %job_id, "cancelling search");
        let request = ApiRequest::delete(format!("search/{}", job_id));
        self.executor.call(request).await
    }

    /// Cancel without propagating failure.
    ///
    /// A job that already finished (or was never known) makes the DELETE
    /// fail; from a signal handler or other cleanup path that failure must
    /// not mask the interruption being handled. Returns whether the backend
    /// acknowledged.
    pub async fn cancel_best_effort(&self, job_id: &str) -> bool {
        match self.cancel(job_id).await {
            Ok(_) => true,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "cancel failed (ignored)");
                false
            }
        }
    }

    /// Request body shared by validate and initiate; times go on the wire
    /// as decimal strings.
    fn search_body(&self, query: &SearchQuery) -> serde_json::Value {
        let mut body = serde_json::json!({
            "oid": self.oid,
            "query": query.text,
            "startTime": query.start.to_string(),
            "endTime": query.end.to_string(),
        });
        if let Some(stream) = query.stream {
            body["stream"] = serde_json::Value::String(stream.as_str().to_string());
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Stream;

    #[test]
    fn test_search_body_times_are_strings() {
        let executor = crate::transport::HttpExecutor::new("http://localhost", "key").unwrap();
        let client = SearchClient::new(Arc::new(executor), "oid-123");

        let query = SearchQuery::new("event_type = NEW_PROCESS", 1234567890, 1234567900);
        let body = client.search_body(&query);

        assert_eq!(body["oid"], "oid-123");
        assert_eq!(body["startTime"], "1234567890");
        assert_eq!(body["endTime"], "1234567900");
        assert!(body.get("stream").is_none());

        let query = query.with_stream(Stream::Detection);
        let body = client.search_body(&query);
        assert_eq!(body["stream"], "detect");
    }

    #[test]
    fn test_poll_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.max_attempts, 300);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }
}
