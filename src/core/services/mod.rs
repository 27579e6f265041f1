//! External services integration
//!
//! This module contains integrations with external APIs and services:
//! - Catalog client trait and the HTTP implementation for lyric retrieval
//! - Continuation resolver that puts the store in front of the catalog

pub mod catalog;
pub mod netease;
pub mod resolver;

// Re-export main types
pub use catalog::{CatalogClient, SongRef};
pub use netease::NeteaseClient;
pub use resolver::{ContinuationResolver, MatchResult, Provenance};
