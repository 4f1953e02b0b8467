//! Goshawk Search: an async Rust client for the Goshawk telemetry search service
//!
//! Searches run as server-side jobs: the client submits a query, polls the
//! job until a page of results is ready, and follows continuation tokens
//! until the result set is exhausted. [`SearchClient`] wraps the individual
//! API calls; [`SearchCursor`] drives a whole search as a lazy, resumable
//! record stream.

pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod query;
pub mod results;
pub mod search;
pub mod time;
pub mod transport;

pub use config::Settings;
pub use download::{DownloadClient, DownloadJob, DownloadState, DownloadStatus};
pub use error::ApiError;
pub use query::{SearchQuery, Stream};
pub use results::{BillingStats, RecordKind, SearchRecord};
pub use search::{CancelToken, PollConfig, SearchClient, SearchCursor, SearchHooks};
pub use transport::{ApiExecutor, ApiRequest, HttpExecutor};

use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of status requests per search job
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 300;

/// Floor for the wait between status requests
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
