//! Lyric continuation engine: given a line of a song, answer with the next one.

pub mod config;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::config::Config;
pub use crate::core::{LyricEngine, MatchResult, Provenance};
pub use crate::error::{LyricChainError, Result};
