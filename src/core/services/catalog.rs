use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A song the catalog returned for a keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    pub id: String,
    pub name: String,
    pub artist: String,
}

/// Remote lyric catalog
///
/// Implementations swallow transport failures: a failed search is an empty
/// list and a failed fetch is an empty line list. Callers never see errors.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Up to `limit` songs matching `keyword`, best first
    async fn search_candidates(&self, keyword: &str, limit: usize) -> Vec<SongRef>;

    /// Clean lyric lines of a song, empty when unavailable
    async fn fetch_lyrics(&self, song_id: &str) -> Vec<String>;

    /// First search hit, if any
    async fn search(&self, keyword: &str) -> Option<SongRef> {
        self.search_candidates(keyword, 1).await.into_iter().next()
    }
}
