//! Observability hooks and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Optional callbacks observing the life of one search.
///
/// All hooks default to no-ops. They are invoked synchronously from the
/// cursor's task: `on_query_initiated` once when the job identifier becomes
/// known (never in resume mode), `on_progress` before each inter-attempt
/// wait of the poll loop, and `on_page_completed` once per page after the
/// consumer has drained all of that page's records, so that persisting the
/// `(page, token)` pair from the hook is safe for later resume.
#[derive(Default)]
pub struct SearchHooks {
    pub(crate) on_query_initiated: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub(crate) on_page_completed: Option<Box<dyn Fn(u32, Option<&str>) + Send + Sync>>,
    pub(crate) on_progress: Option<Box<dyn Fn(u32) + Send + Sync>>,
}

impl SearchHooks {
    /// Hooks that do nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the job identifier of a newly initiated search
    pub fn on_query_initiated(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_query_initiated = Some(Box::new(hook));
        self
    }

    /// Observe each fully drained page and its continuation token
    pub fn on_page_completed(
        mut self,
        hook: impl Fn(u32, Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.on_page_completed = Some(Box::new(hook));
        self
    }

    /// Observe each unfinished poll attempt (receives the 1-based attempt)
    pub fn on_progress(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for SearchHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHooks")
            .field("on_query_initiated", &self.on_query_initiated.is_some())
            .field("on_page_completed", &self.on_page_completed.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Shared flag for cooperative cancellation.
///
/// Clone the token, hand one copy to the cursor and keep the other wherever
/// cancellation originates (signal handler, UI). The poll loop checks it
/// before each status request, so a token tripped while a page is still
/// pending stops the loop with
/// [`ApiError::Cancelled`](crate::ApiError::Cancelled) instead of spending
/// the rest of the retry budget; an in-flight request or wait is never
/// interrupted, and records already buffered still drain.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, untripped token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
