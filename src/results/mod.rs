//! Result types and page assembly
//!
//! This module defines the record structures yielded by a search and the
//! assembly step that orders and annotates one page of raw results.

mod page;
mod types;

pub use page::{assemble_page, AssembledPage};
pub use types::*;
