//! Cache-first continuation lookup
//!
//! A query is first scanned against every cached song in insertion order. On
//! a miss the catalog is searched, the fetched lyrics are cached under the
//! song id, and the fresh lines are scanned. Concurrent misses for the same
//! query share one remote lookup.

use futures::future::{BoxFuture, FutureExt, WeakShared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::infrastructure::cache::{LyricStore, SnapshotFile};
use crate::core::matcher::LineMatcher;
use crate::core::services::catalog::{CatalogClient, SongRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    Remote,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Cache => "CACHE",
            Provenance::Remote => "REMOTE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// The stored line the query matched
    pub source_line: String,
    /// The line sung right after it
    pub next_line: String,
    /// Index of `source_line` within the song
    pub line_index: usize,
    /// Store key of the song (the catalog song id)
    pub song_key: String,
    pub song_name: Option<String>,
    pub artist: Option<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default)]
pub struct ResolverStats {
    pub cache_hits: u64,
    pub remote_hits: u64,
    pub misses: u64,
    pub coalesced: u64,
}

type Lookup = BoxFuture<'static, Option<MatchResult>>;
type InFlightMap = Arc<Mutex<HashMap<String, InFlightEntry>>>;

/// Weak handle so an abandoned lookup is dropped once no caller awaits it
struct InFlightEntry {
    id: u64,
    lookup: WeakShared<Lookup>,
}

struct ResolverInner {
    store: Arc<RwLock<LyricStore>>,
    client: Arc<dyn CatalogClient>,
    matcher: LineMatcher,
    search_limit: usize,
    snapshot: Option<SnapshotFile>,
    // mutation counter and the last counter value written to disk
    mutations: AtomicU64,
    persisted: tokio::sync::Mutex<u64>,
    cache_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

/// Resolves lyric fragments; pass `snapshot` to persist the store after every insert
pub struct ContinuationResolver {
    inner: Arc<ResolverInner>,
    in_flight: InFlightMap,
    next_lookup_id: AtomicU64,
}

impl ContinuationResolver {
    pub fn new(
        store: Arc<RwLock<LyricStore>>,
        client: Arc<dyn CatalogClient>,
        matcher: LineMatcher,
        search_limit: usize,
        snapshot: Option<SnapshotFile>,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                store,
                client,
                matcher,
                search_limit: search_limit.max(1),
                snapshot,
                mutations: AtomicU64::new(0),
                persisted: tokio::sync::Mutex::new(0),
                cache_hits: AtomicU64::new(0),
                remote_hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
            }),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_lookup_id: AtomicU64::new(0),
        }
    }

    /// Find the line following `text`, from the store or the catalog
    pub async fn resolve(&self, text: &str) -> Option<MatchResult> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(hit) = self.inner.scan_cache(text).await {
            return Some(hit);
        }

        let key = self.inner.matcher.prepare(text);
        let lookup = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&key).and_then(|entry| entry.lookup.upgrade()) {
                Some(existing) => {
                    self.inner.coalesced.fetch_add(1, Ordering::Relaxed);
                    debug!("Joining in-flight lookup for: {}", text);
                    existing
                }
                None => {
                    // the entry lives exactly as long as the lookup future itself
                    let id = self.next_lookup_id.fetch_add(1, Ordering::Relaxed);
                    let guard = InFlightGuard { map: self.in_flight.clone(), key: key.clone(), id };
                    let inner = self.inner.clone();
                    let text = text.to_string();
                    let lookup = async move {
                        let _guard = guard;
                        inner.remote_lookup(text).await
                    }
                    .boxed()
                    .shared();

                    if let Some(weak) = lookup.downgrade() {
                        in_flight.insert(key, InFlightEntry { id, lookup: weak });
                    }
                    lookup
                }
            }
        };

        lookup.await
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn get_stats(&self) -> ResolverStats {
        ResolverStats {
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            remote_hits: self.inner.remote_hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
        }
    }
}

impl ResolverInner {
    async fn scan_cache(&self, text: &str) -> Option<MatchResult> {
        let store = self.store.read().await;
        for (key, lines) in store.scan_all() {
            if let Some((index, next_line)) = self.matcher.scan(text, lines.lines()) {
                debug!("Cache hit in {} at line {} for: {}", key, index, text);
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Some(MatchResult {
                    source_line: lines.lines()[index].clone(),
                    next_line: next_line.to_string(),
                    line_index: index,
                    song_key: key.to_string(),
                    song_name: None,
                    artist: None,
                    provenance: Provenance::Cache,
                });
            }
        }
        debug!("Cache miss for: {}", text);
        None
    }

    async fn remote_lookup(self: Arc<Self>, text: String) -> Option<MatchResult> {
        // another lookup may have filled the store since our own scan
        if let Some(hit) = self.scan_cache(&text).await {
            return Some(hit);
        }

        let candidates = self.client.search_candidates(&text, self.search_limit).await;
        if candidates.is_empty() {
            debug!("Catalog has no candidates for: {}", text);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        for song in candidates {
            let lines = self.client.fetch_lyrics(&song.id).await;
            if lines.is_empty() {
                debug!("No usable lyrics for {} ({})", song.name, song.id);
                continue;
            }

            let hit = self
                .matcher
                .scan(&text, &lines)
                .map(|(index, next_line)| remote_match(&song, &lines, index, next_line));
            self.remember(&song.id, lines).await;

            if let Some(hit) = hit {
                info!("Matched \"{}\" in {} - {}", text, song.artist, song.name);
                self.remote_hits.fetch_add(1, Ordering::Relaxed);
                return Some(hit);
            }
            debug!("{} ({}) has no line close to: {}", song.name, song.id, text);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn remember(&self, key: &str, lines: Vec<String>) {
        let (seq, encoded) = {
            let mut store = self.store.write().await;
            if !store.put(key, lines) || self.snapshot.is_none() {
                return;
            }
            let seq = self.mutations.fetch_add(1, Ordering::Relaxed) + 1;
            (seq, store.dump_snapshot())
        };

        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode lyric cache: {}", e);
                return;
            }
        };

        let mut persisted = self.persisted.lock().await;
        if *persisted > seq {
            debug!("Skipping stale cache snapshot #{}", seq);
            return;
        }
        match tokio::task::spawn_blocking(move || snapshot.write(&bytes)).await {
            Ok(Ok(())) => *persisted = seq,
            Ok(Err(e)) => warn!("Failed to persist lyric cache: {}", e),
            Err(e) => warn!("Lyric cache write task failed: {}", e),
        }
    }
}

fn remote_match(song: &SongRef, lines: &[String], index: usize, next_line: &str) -> MatchResult {
    MatchResult {
        source_line: lines[index].clone(),
        next_line: next_line.to_string(),
        line_index: index,
        song_key: song.id.clone(),
        song_name: Some(song.name.clone()).filter(|name| !name.is_empty()),
        artist: Some(song.artist.clone()).filter(|artist| !artist.is_empty()),
        provenance: Provenance::Remote,
    }
}

/// Owned by the lookup future: drops its in-flight entry when the lookup
/// completes or when the last waiting caller gives up on it
struct InFlightGuard {
    map: InFlightMap,
    key: String,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        // a newer lookup may already own the key
        if map.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            map.remove(&self.key);
        }
    }
}
