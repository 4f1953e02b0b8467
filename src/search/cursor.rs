//! Lazy, resumable search cursor
//!
//! [`SearchCursor`] drives one search job to completion: initiate (unless
//! resuming), poll, assemble a page, hand records to the consumer one pull
//! at a time, then follow the continuation token to the next page. No
//! network work happens beyond the page the consumer is currently
//! draining, so a caller that stops pulling also stops the polling.

use super::client::{PollConfig, SearchClient};
use super::hooks::{CancelToken, SearchHooks};
use crate::error::ApiError;
use crate::query::SearchQuery;
use crate::results::{assemble_page, SearchRecord};
use futures::Stream;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Where the cursor is between pulls
enum CursorPhase {
    /// Nothing has happened yet; the first pull initiates or adopts the
    /// resume job id
    Start,
    /// A poll for the next page is due
    Polling {
        job_id: String,
        token: Option<String>,
    },
    /// The buffered page is being drained; once empty, fire the page hook
    /// and decide whether another page exists
    PageEnd {
        job_id: String,
        next_token: Option<String>,
    },
    /// Finished, failed or cancelled; every further pull returns `None`
    Done,
}

/// One in-flight search producing records page by page.
///
/// The cursor is single-shot: it drives one job until the backend reports
/// no further pages, the consumer stops pulling, or a fatal error ends the
/// sequence. After the end it stays fused and keeps returning `Ok(None)`.
pub struct SearchCursor {
    client: SearchClient,
    query: SearchQuery,
    poll_config: PollConfig,
    hooks: SearchHooks,
    cancel: CancelToken,
    resume_job_id: Option<String>,
    resume_token: Option<String>,
    phase: CursorPhase,
    page_number: u32,
    buffered: VecDeque<SearchRecord>,
}

impl SearchCursor {
    /// Create a cursor for a fresh search
    pub fn new(client: SearchClient, query: SearchQuery) -> Self {
        Self {
            client,
            query,
            poll_config: PollConfig::default(),
            hooks: SearchHooks::default(),
            cancel: CancelToken::default(),
            resume_job_id: None,
            resume_token: None,
            phase: CursorPhase::Start,
            page_number: 0,
            buffered: VecDeque::new(),
        }
    }

    /// Set the retry budget for each page's poll loop
    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    /// Attach observability hooks
    pub fn with_hooks(mut self, hooks: SearchHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Attach a cancellation token checked before every poll attempt
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Resume a previously initiated job instead of submitting a new one.
    ///
    /// The first pull skips initiation entirely and polls `job_id` with
    /// `token` (pass `None` to replay from the job's first page).
    pub fn resume_from(mut self, job_id: impl Into<String>, token: Option<String>) -> Self {
        self.resume_job_id = Some(job_id.into());
        self.resume_token = token;
        self
    }

    /// Seed the page counter so resumed pages continue numbering.
    ///
    /// The next drained page is reported as `first_page`; by default pages
    /// count from 1 within each cursor.
    pub fn starting_at_page(mut self, first_page: u32) -> Self {
        self.page_number = first_page.saturating_sub(1);
        self
    }

    /// Job identifier, once known (after the first pull, until the end)
    pub fn job_id(&self) -> Option<&str> {
        match &self.phase {
            CursorPhase::Polling { job_id, .. } | CursorPhase::PageEnd { job_id, .. } => {
                Some(job_id)
            }
            _ => None,
        }
    }

    /// Pull the next record, or `Ok(None)` at the end of the sequence.
    ///
    /// Fatal conditions (backend query failure, retry exhaustion,
    /// transport/auth failures, cancellation) surface here as `Err` at the
    /// pull following the failure; no partial page from a failed poll is
    /// ever yielded.
    pub async fn try_next(&mut self) -> Result<Option<SearchRecord>, ApiError> {
        loop {
            if let Some(record) = self.buffered.pop_front() {
                return Ok(Some(record));
            }

            // Any early return below leaves the cursor fused
            match std::mem::replace(&mut self.phase, CursorPhase::Done) {
                CursorPhase::Start => {
                    if self.cancel.is_cancelled() {
                        info!("search cancelled before initiation");
                        return Err(ApiError::Cancelled);
                    }

                    let job_id = match self.resume_job_id.take() {
                        Some(job_id) => {
                            debug!(job_id = %job_id, "resuming existing job");
                            job_id
                        }
                        None => {
                            let job_id = self.client.initiate(&self.query, true).await?;
                            if let Some(hook) = &self.hooks.on_query_initiated {
                                hook(&job_id);
                            }
                            job_id
                        }
                    };

                    let token = self.resume_token.take();
                    self.phase = CursorPhase::Polling { job_id, token };
                }

                CursorPhase::Polling { job_id, token } => {
                    if self.cancel.is_cancelled() {
                        info!(job_id = %job_id, "search cancelled");
                        return Err(ApiError::Cancelled);
                    }

                    let poll = self
                        .client
                        .poll(
                            &job_id,
                            token.as_deref(),
                            &self.poll_config,
                            Some(&self.cancel),
                            self.hooks.on_progress.as_deref(),
                        )
                        .await?;

                    if let Some(error) = poll.terminal_error() {
                        return Err(ApiError::QueryFailed(error.to_string()));
                    }

                    let page = assemble_page(poll, self.page_number + 1);
                    if page.is_empty() {
                        debug!(job_id = %job_id, "empty page, search drained");
                        return Ok(None);
                    }

                    self.page_number += 1;
                    self.buffered = page.records.into();
                    self.phase = CursorPhase::PageEnd {
                        job_id,
                        next_token: page.next_token,
                    };
                }

                CursorPhase::PageEnd { job_id, next_token } => {
                    if let Some(hook) = &self.hooks.on_page_completed {
                        hook(self.page_number, next_token.as_deref());
                    }
                    info!(
                        job_id = %job_id,
                        page = self.page_number,
                        has_more = next_token.is_some(),
                        "page completed"
                    );

                    match next_token {
                        Some(token) => {
                            self.phase = CursorPhase::Polling {
                                job_id,
                                token: Some(token),
                            };
                        }
                        None => return Ok(None),
                    }
                }

                CursorPhase::Done => return Ok(None),
            }
        }
    }

    /// Adapt the cursor into a [`futures::Stream`] of records
    pub fn into_stream(self) -> impl Stream<Item = Result<SearchRecord, ApiError>> {
        futures::stream::try_unfold(self, |mut cursor| async move {
            let record = cursor.try_next().await?;
            Ok(record.map(|record| (record, cursor)))
        })
    }
}

impl SearchClient {
    /// Start a paginated search and return the cursor over its records.
    ///
    /// Configuration, hooks, resumption and cancellation are applied with
    /// the cursor's builder methods before the first pull.
    pub fn execute_search(&self, query: SearchQuery) -> SearchCursor {
        SearchCursor::new(self.clone(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpExecutor;
    use std::sync::Arc;

    fn test_client() -> SearchClient {
        let executor = HttpExecutor::new("http://localhost:9", "key").unwrap();
        SearchClient::new(Arc::new(executor), "oid-1")
    }

    #[test]
    fn test_job_id_unknown_before_first_pull() {
        let cursor = test_client().execute_search(SearchQuery::new("*", 0, 1));
        assert_eq!(cursor.job_id(), None);
    }

    #[test]
    fn test_starting_page_seed() {
        let cursor = test_client()
            .execute_search(SearchQuery::new("*", 0, 1))
            .starting_at_page(4);
        assert_eq!(cursor.page_number, 3);

        // Page 0 and 1 both mean "start from the first page"
        let cursor = test_client()
            .execute_search(SearchQuery::new("*", 0, 1))
            .starting_at_page(0);
        assert_eq!(cursor.page_number, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut cursor = test_client()
            .execute_search(SearchQuery::new("*", 0, 1))
            .with_cancel_token(cancel);

        match cursor.try_next().await {
            Err(ApiError::Cancelled) => {}
            other => panic!("expected Cancelled, got {:?}", other.map(|_| ())),
        }
        // Fused afterwards
        assert!(matches!(cursor.try_next().await, Ok(None)));
    }
}
