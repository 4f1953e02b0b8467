//! Authenticated transport module
//!
//! Defines the request executor capability the search and download clients
//! are built on, plus the reqwest-backed production implementation.

mod executor;

pub use executor::{ApiExecutor, ApiRequest, HttpExecutor, HttpMethod};
