//! Infrastructure and cross-cutting concerns
//!
//! This module contains infrastructure components:
//! - Bounded lyric store with FIFO eviction
//! - Snapshot persistence with atomic replacement

pub mod cache;

// Re-export main types
pub use cache::{CacheStats, LineSequence, LyricStore, SnapshotFile};
