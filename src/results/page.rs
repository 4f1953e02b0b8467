//! Page assembly
//!
//! Turns one completed poll response into the ordered, annotated record
//! sequence the cursor yields, plus the continuation token for the next
//! page.

use super::types::{PollResponse, RecordKind, SearchRecord};
use std::collections::HashSet;

/// One assembled page: presentation-ordered records plus continuation token
#[derive(Debug, Clone, Default)]
pub struct AssembledPage {
    /// Records in presentation order (timeline, facets, events)
    pub records: Vec<SearchRecord>,
    /// Token for the next page, if more pages exist
    pub next_token: Option<String>,
}

impl AssembledPage {
    /// True when the page carried no records at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Assemble one poll response into an ordered, annotated page.
///
/// The continuation token is read from the last raw record in backend
/// order, before any reordering; tokens on earlier records are ignored and
/// blank tokens count as absent. Records are then stable-sorted into
/// timeline, facets, events order, the first record of each kind present is
/// flagged, billing stats (when the poll carried them) land on the first
/// record in presentation order, and every record is stamped with the
/// 1-based page number.
///
/// An empty result list assembles to an empty page with no token; callers
/// treat that as end of pagination regardless of the completed flag.
pub fn assemble_page(poll: PollResponse, page_number: u32) -> AssembledPage {
    if poll.results.is_empty() {
        return AssembledPage::default();
    }

    let next_token = poll
        .results
        .last()
        .and_then(|record| record.next_token())
        .map(str::to_string);

    let mut raw = poll.results;
    raw.sort_by_key(|record| record.kind().priority());

    let mut seen_kinds: HashSet<RecordKind> = HashSet::new();
    let mut stats = poll.stats;
    let records = raw
        .into_iter()
        .map(|record| {
            let first_of_kind = seen_kinds.insert(record.kind());
            SearchRecord {
                record,
                page_number,
                first_of_kind_in_page: first_of_kind,
                billing_stats: stats.take(),
            }
        })
        .collect();

    AssembledPage {
        records,
        next_token,
    }
}
