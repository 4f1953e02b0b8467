//! Query value types
//!
//! A search is described by an immutable [`SearchQuery`]: the query text,
//! an epoch-seconds time window, and optionally which telemetry stream to
//! search. Values are built once by the caller and never mutated by the SDK.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Telemetry stream a search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Raw sensor events (the default when unset)
    Event,
    /// Detections produced by detection rules; the service calls this
    /// stream `detect`
    #[serde(rename = "detect")]
    Detection,
    /// Platform audit records
    Audit,
}

impl Stream {
    /// Wire name of the stream
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Event => "event",
            Stream::Detection => "detect",
            Stream::Audit => "audit",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable search request: query text plus a closed time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text in the service's pipe syntax, e.g. `* | NEW_PROCESS | *`
    pub text: String,
    /// Window start, epoch seconds
    pub start: i64,
    /// Window end, epoch seconds
    pub end: i64,
    /// Stream selector; server default applies when unset
    pub stream: Option<Stream>,
}

impl SearchQuery {
    /// Create a query over `[start, end]`
    pub fn new(text: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            stream: None,
        }
    }

    /// Select a specific stream
    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = Some(stream);
        self
    }
}
