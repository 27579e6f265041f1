use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CacheError, PersistenceError};

/// One song's lyric lines, timing and credits already stripped. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSequence(Arc<[String]>);

impl LineSequence {
    pub fn new(lines: Vec<String>) -> Result<Self, CacheError> {
        if lines.is_empty() {
            return Err(CacheError::EmptyLineSequence);
        }
        Ok(Self(lines.into()))
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for LineSequence {
    type Error = CacheError;

    fn try_from(lines: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(lines)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    lines: LineSequence,
    insertion_order: u64,
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    pub total_lines: usize,
}

/// Bounded key → lyric lines store with FIFO eviction
///
/// Iteration always follows insertion order. Overwriting a key keeps its
/// original position, so the entry is still evicted as the oldest.
#[derive(Debug, Clone)]
pub struct LyricStore {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    next_order: u64,
    max_entries: usize,
}

impl LyricStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_order: 0,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LineSequence> {
        self.entries.get(key).map(|entry| &entry.lines)
    }

    /// Entries in insertion order
    pub fn scan_all(&self) -> impl Iterator<Item = (&str, &LineSequence)> + '_ {
        self.order.iter().filter_map(|key| {
            self.entries
                .get(key)
                .map(|entry| (key.as_str(), &entry.lines))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Insert or overwrite `key`. Returns false when `lines` is empty and nothing was stored.
    pub fn put(&mut self, key: impl Into<String>, lines: Vec<String>) -> bool {
        let key = key.into();
        let lines = match LineSequence::new(lines) {
            Ok(lines) => lines,
            Err(e) => {
                debug!("Ignoring put for {}: {}", key, e);
                return false;
            }
        };

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.lines = lines;
            debug!("Updated cached lyrics for key {}", key);
            return true;
        }

        while self.entries.len() >= self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                debug!(
                    "Evicted cached lyrics for key {} (inserted #{})",
                    oldest, evicted.insertion_order
                );
            }
        }

        let insertion_order = self.next_order;
        self.next_order += 1;
        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { lines, insertion_order });
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            max_entries: self.max_entries,
            total_lines: self.entries.values().map(|entry| entry.lines.len()).sum(),
        }
    }

    /// Decode a snapshot; entries beyond `max_entries` evict the earliest ones
    pub fn load_snapshot(bytes: &[u8], max_entries: usize) -> Result<Self, PersistenceError> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        let mut store = Self::new(max_entries);
        for (key, lines) in snapshot.0 {
            if !store.put(key.clone(), lines) {
                warn!("Skipping empty snapshot entry {}", key);
            }
        }
        Ok(store)
    }

    /// Encode as a JSON object of key → lines, in insertion order
    pub fn dump_snapshot(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec_pretty(&SnapshotRef(self))?)
    }
}

/// Owned snapshot contents, order preserved
struct Snapshot(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = Snapshot;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of cache keys to lists of lyric lines")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, lines)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((key, lines));
                }
                Ok(Snapshot(entries))
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

struct SnapshotRef<'a>(&'a LyricStore);

impl Serialize for SnapshotRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, lines) in self.0.scan_all() {
            map.serialize_entry(key, lines.lines())?;
        }
        map.end()
    }
}

/// On-disk home of the store snapshot
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self, max_entries: usize) -> Result<LyricStore, PersistenceError> {
        if !self.path.exists() {
            return Err(PersistenceError::NotFound { path: self.path.clone() });
        }
        let bytes = fs::read(&self.path)?;
        LyricStore::load_snapshot(&bytes, max_entries)
    }

    /// Hydrate a store; any failure yields an empty store
    pub fn load(&self, max_entries: usize) -> LyricStore {
        match self.read(max_entries) {
            Ok(store) => {
                info!("Loaded {} cached songs from {}", store.len(), self.path.display());
                store
            }
            Err(PersistenceError::NotFound { .. }) => {
                debug!("No cache snapshot at {}, starting empty", self.path.display());
                LyricStore::new(max_entries)
            }
            Err(e) => {
                warn!("Ignoring unreadable cache snapshot {}: {}", self.path.display(), e);
                LyricStore::new(max_entries)
            }
        }
    }

    pub fn save(&self, store: &LyricStore) -> Result<(), PersistenceError> {
        self.write(&store.dump_snapshot()?)?;
        debug!("Saved {} cached songs to {}", store.len(), self.path.display());
        Ok(())
    }

    /// Replace the snapshot with already encoded bytes
    pub fn write(&self, content: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write atomically: write to temp then rename
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
