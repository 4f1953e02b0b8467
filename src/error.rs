//! Error types shared across the SDK

use thiserror::Error;

/// Errors surfaced by search, download and transport operations.
///
/// Query syntax problems are not errors: the validate endpoint reports them
/// in-band through [`ValidationResult::error`](crate::results::ValidationResult),
/// and callers are expected to check that field.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected by the service (401/403).
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The request never produced a usable HTTP response.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response decoded, but its shape violates the wire contract.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The backend reported a terminal failure for a running query.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Polling gave up without the backend reporting completion.
    #[error("max polling attempts exceeded after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// The caller requested cancellation through a [`CancelToken`](crate::search::CancelToken).
    #[error("search cancelled by caller")]
    Cancelled,

    /// A bounded wait (e.g. for a download job) ran out of time.
    #[error("timed out after {seconds} seconds")]
    WaitTimeout { seconds: u64 },

    /// Settings file or environment configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A time expression could not be parsed.
    #[error("invalid time expression: {0}")]
    Time(String),
}

impl ApiError {
    /// Protocol violation from a missing field in an otherwise valid response.
    pub fn missing_field(field: &str) -> Self {
        ApiError::Protocol(format!("response missing required field `{}`", field))
    }

    /// True for errors worth retrying at a layer above this SDK.
    ///
    /// The SDK itself never retries transport failures; the poll loop only
    /// retries "not completed yet" responses.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}
