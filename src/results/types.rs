//! Wire and record types for search results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a result record
///
/// The three kinds are multiplexed onto one pagination stream by the
/// backend; presentation order within a page is fixed to timeline, then
/// facets, then events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Timeline,
    Facets,
    Events,
}

impl RecordKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Timeline => "timeline",
            RecordKind::Facets => "facets",
            RecordKind::Events => "events",
        }
    }

    /// Presentation priority within a page (lower sorts first)
    pub fn priority(&self) -> u8 {
        match self {
            RecordKind::Timeline => 0,
            RecordKind::Facets => 1,
            RecordKind::Events => 2,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw record as returned by a poll call, before assembly
///
/// Per backend convention the continuation token for the next page rides on
/// the last record of the page's result list, not at the top level of the
/// poll response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawRecord {
    Events {
        #[serde(default)]
        rows: Vec<serde_json::Value>,
        #[serde(rename = "nextToken", default, skip_serializing_if = "Option::is_none")]
        next_token: Option<String>,
    },
    Facets {
        #[serde(default)]
        facets: Vec<serde_json::Value>,
        #[serde(rename = "nextToken", default, skip_serializing_if = "Option::is_none")]
        next_token: Option<String>,
    },
    Timeline {
        #[serde(default)]
        timeseries: Vec<serde_json::Value>,
        #[serde(rename = "nextToken", default, skip_serializing_if = "Option::is_none")]
        next_token: Option<String>,
    },
}

impl RawRecord {
    /// Kind of this record
    pub fn kind(&self) -> RecordKind {
        match self {
            RawRecord::Events { .. } => RecordKind::Events,
            RawRecord::Facets { .. } => RecordKind::Facets,
            RawRecord::Timeline { .. } => RecordKind::Timeline,
        }
    }

    /// The record's payload items (rows, facet counts or time buckets)
    pub fn items(&self) -> &[serde_json::Value] {
        match self {
            RawRecord::Events { rows, .. } => rows,
            RawRecord::Facets { facets, .. } => facets,
            RawRecord::Timeline { timeseries, .. } => timeseries,
        }
    }

    /// Continuation token, with blank treated as absent
    pub fn next_token(&self) -> Option<&str> {
        let token = match self {
            RawRecord::Events { next_token, .. } => next_token,
            RawRecord::Facets { next_token, .. } => next_token,
            RawRecord::Timeline { next_token, .. } => next_token,
        };
        token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Estimated query price, either a detailed object or a bare number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimatedPrice {
    Detailed {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
    },
    Flat(f64),
}

impl EstimatedPrice {
    /// Numeric price regardless of wire shape
    pub fn value(&self) -> f64 {
        match self {
            EstimatedPrice::Detailed { value, .. } => *value,
            EstimatedPrice::Flat(value) => *value,
        }
    }
}

/// Aggregate metering information for one page of results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStats {
    #[serde(default)]
    pub bytes_scanned: u64,
    #[serde(default)]
    pub events_scanned: u64,
    #[serde(default)]
    pub events_matched: u64,
    #[serde(default)]
    pub events_processed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<EstimatedPrice>,
}

/// Response to one poll status request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    /// Whether the backend finished computing this page
    #[serde(default)]
    pub completed: bool,
    /// Terminal failure reported by the backend
    #[serde(default)]
    pub error: Option<String>,
    /// Server hint for how long to wait before the next status request
    #[serde(default)]
    pub next_poll_in_ms: Option<u64>,
    /// Metering for the work behind this page
    #[serde(default)]
    pub stats: Option<BillingStats>,
    /// Raw records of the page, in backend order
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

impl PollResponse {
    /// Terminal error, with blank treated as absent
    pub fn terminal_error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// Result of a synchronous query validation
///
/// A syntax problem is reported through [`error`](Self::error), not as an
/// `Err`; transport and auth failures are the only raised conditions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Echo of the validated query text
    #[serde(default)]
    pub query: Option<String>,
    /// Echo of the window start
    #[serde(default)]
    pub start_time: Option<String>,
    /// Echo of the window end
    #[serde(default)]
    pub end_time: Option<String>,
    /// Syntax or semantic problem with the query, if any
    #[serde(default)]
    pub error: Option<String>,
    /// Projected cost of running the query
    #[serde(default)]
    pub estimated_price: Option<EstimatedPrice>,
}

impl ValidationResult {
    /// True when the service found no problem with the query
    pub fn is_valid(&self) -> bool {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .is_none()
    }
}

/// An assembled record: raw payload plus page annotations
///
/// Annotations are never present on the wire; they are stamped during page
/// assembly for downstream consumers (section breaks, resume bookkeeping,
/// cost display).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The raw record payload
    #[serde(flatten)]
    pub record: RawRecord,
    /// 1-based page this record belongs to
    #[serde(rename = "_page_number")]
    pub page_number: u32,
    /// True for the first record of its kind within the page
    #[serde(rename = "_first_of_kind_in_page")]
    pub first_of_kind_in_page: bool,
    /// Page metering, attached to the first record of the page only
    #[serde(
        rename = "_billing_stats",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub billing_stats: Option<BillingStats>,
}

impl SearchRecord {
    /// Kind of the underlying record
    pub fn kind(&self) -> RecordKind {
        self.record.kind()
    }

    /// Payload items of the underlying record
    pub fn items(&self) -> &[serde_json::Value] {
        self.record.items()
    }
}
