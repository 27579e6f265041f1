//! Core functionality modules
//!
//! - `matcher`: fuzzy line similarity and continuation scan
//! - `lrc`: LRC text to clean lyric lines
//! - `gate`: admission filter for chat messages
//! - `infrastructure`: lyric store and its JSON snapshot
//! - `services`: catalog client and the continuation resolver
//! - `engine`: lifecycle wrapper that owns all of the above

pub mod engine;
pub mod gate;
pub mod infrastructure;
pub mod lrc;
pub mod matcher;
pub mod services;

pub use engine::{EngineStats, LyricEngine};
pub use gate::{GateDecision, Invocation, Sampler, TriggerGate};
pub use services::{MatchResult, Provenance};
