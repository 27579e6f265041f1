//! Engine context: owns the store, catalog client, resolver and trigger gate
//!
//! `start` hydrates the store from its snapshot and builds the HTTP client;
//! `stop` flushes the store back to disk. Everything in between goes through
//! `handle_message` (ambient chat), `handle_command` (explicit request) or
//! `resolve` (no gate at all).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::gate::{GateDecision, Invocation, Sampler, ThreadRngSampler, TriggerGate};
use crate::core::infrastructure::cache::{LyricStore, SnapshotFile};
use crate::core::matcher::LineMatcher;
use crate::core::services::catalog::CatalogClient;
use crate::core::services::netease::NeteaseClient;
use crate::core::services::resolver::{ContinuationResolver, MatchResult, ResolverStats};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct EngineStats {
    pub entry_count: usize,
    pub config: Config,
    pub resolver: ResolverStats,
    pub in_flight: usize,
}

pub struct LyricEngine {
    config: Arc<Config>,
    store: Arc<RwLock<LyricStore>>,
    snapshot: SnapshotFile,
    resolver: ContinuationResolver,
    gate: TriggerGate,
    stopped: AtomicBool,
}

impl LyricEngine {
    /// Start with the HTTP catalog client and a thread-local RNG for the gate
    pub fn start(config: Config) -> Result<Self> {
        config.validate()?;
        let client = NeteaseClient::new(&config)?;
        Self::start_with(config, Arc::new(client), Box::new(ThreadRngSampler))
    }

    /// Start with an explicit catalog client and sampler
    pub fn start_with(
        config: Config,
        client: Arc<dyn CatalogClient>,
        sampler: Box<dyn Sampler>,
    ) -> Result<Self> {
        config.validate()?;

        let snapshot = SnapshotFile::new(&config.cache_path);
        let store = Arc::new(RwLock::new(snapshot.load(config.max_cache_size)));
        let eager = config.persist_after_mutation.then(|| snapshot.clone());

        let resolver = ContinuationResolver::new(
            store.clone(),
            client,
            LineMatcher::new(config.similarity_threshold, config.normalize_text),
            config.search_limit,
            eager,
        );
        let gate = TriggerGate::with_sampler(&config, sampler);

        info!(
            "Lyric engine started (catalog: {}, threshold: {}, cache: {})",
            config.api_base_url,
            config.similarity_threshold,
            config.cache_path.display()
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            snapshot,
            resolver,
            gate,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Look up a continuation without any gating
    pub async fn resolve(&self, text: &str) -> Option<MatchResult> {
        self.resolver.resolve(text).await
    }

    /// Ambient chat message: gated by length, command prefix and probability
    pub async fn handle_message(&self, text: &str) -> Option<MatchResult> {
        self.gated(text, Invocation::Ambient).await
    }

    /// Explicit request: gated by length and command prefix, never sampled
    pub async fn handle_command(&self, text: &str) -> Option<MatchResult> {
        self.gated(text, Invocation::Command).await
    }

    pub fn evaluate_gate(&self, text: &str, invocation: Invocation) -> GateDecision {
        self.gate.evaluate(text, invocation)
    }

    async fn gated(&self, text: &str, invocation: Invocation) -> Option<MatchResult> {
        let decision = self.gate.evaluate(text, invocation);
        if !decision.is_admitted() {
            debug!("Skipping message ({:?}): {}", decision, text);
            return None;
        }
        self.resolver.resolve(text).await
    }

    /// Drop every cached song and the snapshot on disk
    pub async fn clear_cache(&self) -> Result<()> {
        let mut store = self.store.write().await;
        store.clear();
        self.snapshot.remove()?;
        info!("Lyric cache cleared");
        Ok(())
    }

    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            entry_count: self.store.read().await.len(),
            config: (*self.config).clone(),
            resolver: self.resolver.get_stats(),
            in_flight: self.resolver.in_flight_count(),
        }
    }

    /// Flush the store to its snapshot; later calls are no-ops
    pub async fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let store = self.store.read().await;
        self.snapshot.save(&store)?;
        info!("Lyric engine stopped, {} songs saved", store.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::core::services::resolver::tests::StubCatalog;
    use crate::core::services::resolver::Provenance;
    use std::fs;
    use std::path::Path;

    struct FixedSampler(u8);

    impl Sampler for FixedSampler {
        fn sample(&self) -> u8 {
            self.0
        }
    }

    fn config_in(dir: &Path) -> ConfigBuilder {
        ConfigBuilder::new()
            .cache_path(dir.join("cache.json"))
            .unwrap()
            .similarity_threshold(0.8)
            .unwrap()
    }

    fn engine(config: Config, stub: Arc<StubCatalog>) -> LyricEngine {
        LyricEngine::start_with(config, stub, Box::new(FixedSampler(1))).unwrap()
    }

    #[tokio::test]
    async fn test_preloaded_store_answers_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cache.json"), r#"{"s1": ["alpha", "beta", "gamma"]}"#).unwrap();
        let stub = Arc::new(StubCatalog::default());
        let engine = engine(config_in(dir.path()).build().unwrap(), stub.clone());

        let hit = engine.resolve("alpha").await.unwrap();
        assert_eq!(hit.next_line, "beta");
        assert_eq!(hit.provenance, Provenance::Cache);
        assert_eq!(stub.searches(), 0);
    }

    #[tokio::test]
    async fn test_short_message_never_reaches_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubCatalog::with_song("s1", "Song", &["abc", "def"]));
        let config = config_in(dir.path()).min_trigger_length(5).unwrap().build().unwrap();
        let engine = engine(config, stub.clone());

        assert!(engine.handle_message("abc").await.is_none());
        assert!(engine.handle_command("abc").await.is_none());
        assert_eq!(stub.searches(), 0);
        assert_eq!(engine.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_no_search_result_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubCatalog::default());
        let engine = engine(config_in(dir.path()).build().unwrap(), stub.clone());

        assert!(engine.handle_message("xyz lyric").await.is_none());
        assert_eq!(stub.searches(), 1);
        assert_eq!(engine.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_command_prefix_is_not_a_lyric() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubCatalog::with_song("s1", "Song", &["/alpha", "beta"]));
        let engine = engine(config_in(dir.path()).build().unwrap(), stub.clone());

        assert!(engine.handle_message("/alpha").await.is_none());
        assert!(engine.handle_command("/alpha").await.is_none());
        assert_eq!(stub.searches(), 0);
        assert_eq!(engine.resolve("/alpha").await.unwrap().next_line, "beta");
    }

    #[tokio::test]
    async fn test_stop_flushes_and_restart_hydrates() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubCatalog::with_song("42", "Song", &["alpha", "beta", "gamma"]));
        let engine = engine(config_in(dir.path()).build().unwrap(), stub);

        assert_eq!(engine.resolve("alpha").await.unwrap().provenance, Provenance::Remote);
        assert!(!dir.path().join("cache.json").exists());
        engine.stop().await.unwrap();
        engine.stop().await.unwrap();

        let empty_catalog = Arc::new(StubCatalog::default());
        let restarted = super::LyricEngine::start_with(
            config_in(dir.path()).build().unwrap(),
            empty_catalog.clone(),
            Box::new(FixedSampler(1)),
        )
        .unwrap();
        assert_eq!(restarted.resolve("beta").await.unwrap().next_line, "gamma");
        assert_eq!(empty_catalog.searches(), 0);
    }

    #[tokio::test]
    async fn test_clear_cache_removes_entries_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"s1": ["alpha", "beta"]}"#).unwrap();
        let engine = engine(config_in(dir.path()).build().unwrap(), Arc::new(StubCatalog::default()));

        assert_eq!(engine.stats().await.entry_count, 1);
        engine.clear_cache().await.unwrap();
        assert_eq!(engine.stats().await.entry_count, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_eviction_respects_max_cache_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubCatalog::default();
        stub.add_song("1", "One", &["first song line", "one"]);
        stub.add_song("2", "Two", &["second song line", "two"]);
        stub.add_song("3", "Three", &["third song line", "three"]);
        let config = config_in(dir.path())
            .max_cache_size(2)
            .unwrap()
            .search_limit(3)
            .unwrap()
            .build()
            .unwrap();
        let engine = engine(config, Arc::new(stub));

        assert!(engine.resolve("no such words at all").await.is_none());
        let stats = engine.stats().await;
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.config.max_cache_size, 2);
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let mut config = Config::default();
        config.similarity_threshold = 2.0;
        let result = LyricEngine::start_with(config, Arc::new(StubCatalog::default()), Box::new(FixedSampler(1)));
        assert!(result.is_err());
    }
}
