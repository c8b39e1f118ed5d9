//! Utility functions and helpers for the claude2oai gateway.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with API key redaction.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
