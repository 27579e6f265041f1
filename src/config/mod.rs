pub mod builder;
pub mod env;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

pub use builder::ConfigBuilder;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MIN_TRIGGER_LENGTH: usize = 2;
pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;
pub const DEFAULT_TRIGGER_PROBABILITY: u8 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 1;

const CACHE_FILE_NAME: &str = "lyrics_cache.json";

pub fn default_command_prefixes() -> Vec<String> {
    ["/", "!", ".", "。", "#"].iter().map(|p| p.to_string()).collect()
}

pub fn default_metadata_labels() -> Vec<String> {
    [
        "作词", "作曲", "编曲", "制作人", "监制", "混音", "和声", "吉他", "贝斯", "鼓",
        "录音", "母带", "出品", "词", "曲",
        "Lyricist", "Lyrics by", "Composer", "Composed by", "Arranger", "Arranged by",
        "Producer", "Produced by", "Mixing", "Mastering",
    ]
    .iter()
    .map(|l| l.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote lyric catalog
    pub api_base_url: String,

    /// Minimum similarity score for a line to count as matched
    pub similarity_threshold: f64,

    /// Messages shorter than this (in characters) are ignored
    pub min_trigger_length: usize,

    /// Maximum number of songs kept in the lyric store
    pub max_cache_size: usize,

    /// Chance (percent) that an ambient message is considered at all
    pub trigger_probability: u8,

    /// Per-request timeout for catalog calls
    pub request_timeout_secs: u64,

    /// Attempts per catalog call, including the first
    pub max_attempts: u32,

    /// Search candidates probed before giving up
    pub search_limit: usize,

    /// Case-fold and drop whitespace before comparing lines
    pub normalize_text: bool,

    /// Messages starting with one of these are commands, not lyrics
    pub command_prefixes: Vec<String>,

    /// Lyric lines starting with one of these labels are credits
    pub metadata_labels: Vec<String>,

    /// Where the lyric store snapshot lives
    pub cache_path: PathBuf,

    /// Write the snapshot after every store mutation instead of only on shutdown
    pub persist_after_mutation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_trigger_length: DEFAULT_MIN_TRIGGER_LENGTH,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            trigger_probability: DEFAULT_TRIGGER_PROBABILITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            normalize_text: true,
            command_prefixes: default_command_prefixes(),
            metadata_labels: default_metadata_labels(),
            cache_path: default_data_path().join(CACHE_FILE_NAME),
            persist_after_mutation: false,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// Later layers win: file values replace defaults, `LYRICCHAIN_*` variables
    /// replace file values. The result is validated before it is returned.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let (config_file, explicit) = match config_path {
            Some(path) => (PathBuf::from(path), true),
            None => (Self::config_path()?, false),
        };

        let base = if config_file.exists() {
            debug!("Loading config from {}", config_file.display());
            let content = fs::read_to_string(&config_file)?;
            toml::from_str::<Config>(&content)?
        } else if explicit {
            return Err(ConfigError::FileNotFound { path: config_file }.into());
        } else {
            Config::default()
        };

        ConfigBuilder::from_config(base).load_from_env()?.build()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LyricChainError::Internal(e.into()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = project_dirs().ok_or(ConfigError::NoProjectDirs)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "lyricchain", "lyricchain")
}

fn default_data_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            warn!("ProjectDirs unavailable; falling back to current directory for data path");
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.trigger_probability, 100);
        assert!(config.command_prefixes.contains(&"。".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("similarity_threshold = 0.6\nmax_cache_size = 5\n").unwrap();
        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.max_cache_size, 5);
        assert_eq!(config.min_trigger_length, DEFAULT_MIN_TRIGGER_LENGTH);
        assert!(config.normalize_text);
    }

    #[test]
    fn test_save_then_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.max_cache_size = 7;
        config.cache_path = dir.path().join("cache.json");
        config.save(&path).unwrap();

        let loaded = Config::load(path.to_str()).unwrap();
        assert_eq!(loaded.max_cache_size, 7);
        assert_eq!(loaded.cache_path, dir.path().join("cache.json"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let result = Config::load(Some("/definitely/not/here/config.toml"));
        assert!(matches!(
            result,
            Err(crate::error::LyricChainError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
