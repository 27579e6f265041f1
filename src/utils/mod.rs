//! Utility modules for common functionality
//!
//! - `logging`: tracing subscriber setup for the binary

pub mod logging;
