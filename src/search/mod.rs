//! Search execution module
//!
//! Client operations for the asynchronous search API and the cursor that
//! composes them into a resumable, cancellable, lazily produced record
//! sequence.

mod client;
mod cursor;
mod hooks;

pub use client::{PollConfig, SearchClient};
pub use cursor::SearchCursor;
pub use hooks::{CancelToken, SearchHooks};
