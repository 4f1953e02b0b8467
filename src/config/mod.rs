//! Client configuration
//!
//! Loads settings from YAML files and `GOSHAWK_*` environment variables.

mod settings;

pub use settings::*;
