use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::config::validation::ConfigValidator;
use crate::config::env::{EnvVars, EnvParser};
use crate::config::Config;

/// Configuration builder with validation and type safety
///
/// Every setter validates its own value; `build` validates the whole
/// configuration again so values that came straight from a file are checked too.
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new configuration builder starting from defaults
    pub fn new() -> Self {
        Self { config: Config::default() }
    }

    /// Start from an already loaded configuration (e.g. parsed from TOML)
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set catalog API base URL with validation
    pub fn api_base_url<S: Into<String>>(mut self, url: S) -> Result<Self> {
        let url = url.into();
        ConfigValidator::validate_url(&url, "catalog API")?;
        self.config.api_base_url = url;
        Ok(self)
    }

    /// Set similarity threshold with validation
    pub fn similarity_threshold(mut self, threshold: f64) -> Result<Self> {
        ConfigValidator::validate_ratio(threshold, "similarity threshold")?;
        self.config.similarity_threshold = threshold;
        Ok(self)
    }

    /// Set minimum trigger length with validation
    pub fn min_trigger_length(mut self, length: usize) -> Result<Self> {
        ConfigValidator::validate_range(length, 1, 1000, "minimum trigger length")?;
        self.config.min_trigger_length = length;
        Ok(self)
    }

    /// Set maximum cache size with validation
    pub fn max_cache_size(mut self, size: usize) -> Result<Self> {
        ConfigValidator::validate_range(size, 1, 100_000, "maximum cache size")?;
        self.config.max_cache_size = size;
        Ok(self)
    }

    /// Set trigger probability with validation
    pub fn trigger_probability(mut self, percent: u8) -> Result<Self> {
        ConfigValidator::validate_range(percent, 0, 100, "trigger probability")?;
        self.config.trigger_probability = percent;
        Ok(self)
    }

    /// Set request timeout with validation
    pub fn request_timeout_secs(mut self, seconds: u64) -> Result<Self> {
        ConfigValidator::validate_range(seconds, 1, 120, "request timeout seconds")?;
        self.config.request_timeout_secs = seconds;
        Ok(self)
    }

    /// Set attempts per catalog call with validation
    pub fn max_attempts(mut self, attempts: u32) -> Result<Self> {
        ConfigValidator::validate_range(attempts, 1, 5, "max attempts")?;
        self.config.max_attempts = attempts;
        Ok(self)
    }

    /// Set number of search candidates probed with validation
    pub fn search_limit(mut self, limit: usize) -> Result<Self> {
        ConfigValidator::validate_range(limit, 1, 10, "search limit")?;
        self.config.search_limit = limit;
        Ok(self)
    }

    pub fn normalize_text(mut self, normalize: bool) -> Self {
        self.config.normalize_text = normalize;
        self
    }

    /// Replace the command prefix list
    pub fn command_prefixes(mut self, prefixes: Vec<String>) -> Result<Self> {
        ConfigValidator::validate_non_empty_entries(&prefixes, "command prefixes")?;
        self.config.command_prefixes = prefixes;
        Ok(self)
    }

    /// Replace the metadata label list used by the LRC parser
    pub fn metadata_labels(mut self, labels: Vec<String>) -> Result<Self> {
        ConfigValidator::validate_non_empty_entries(&labels, "metadata labels")?;
        self.config.metadata_labels = labels;
        Ok(self)
    }

    /// Set snapshot path with validation
    pub fn cache_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        ConfigValidator::validate_snapshot_path(&path)?;
        self.config.cache_path = path;
        Ok(self)
    }

    pub fn persist_after_mutation(mut self, eager: bool) -> Self {
        self.config.persist_after_mutation = eager;
        self
    }

    /// Load values from environment variables with validation
    pub fn load_from_env(mut self) -> Result<Self> {
        if let Some(url) = EnvParser::parse_string(EnvVars::API_BASE_URL, None)? {
            self = self.api_base_url(url)?;
        }

        if let Some(threshold) = EnvParser::parse_number::<f64>(EnvVars::SIMILARITY_THRESHOLD)? {
            self = self.similarity_threshold(threshold)?;
        }

        if let Some(length) = EnvParser::parse_number::<usize>(EnvVars::MIN_TRIGGER_LENGTH)? {
            self = self.min_trigger_length(length)?;
        }

        if let Some(size) = EnvParser::parse_number::<usize>(EnvVars::MAX_CACHE_SIZE)? {
            self = self.max_cache_size(size)?;
        }

        if let Some(percent) = EnvParser::parse_number::<u8>(EnvVars::TRIGGER_PROBABILITY)? {
            self = self.trigger_probability(percent)?;
        }

        if let Some(seconds) = EnvParser::parse_number::<u64>(EnvVars::REQUEST_TIMEOUT_SECS)? {
            self = self.request_timeout_secs(seconds)?;
        }

        if let Some(attempts) = EnvParser::parse_number::<u32>(EnvVars::MAX_ATTEMPTS)? {
            self = self.max_attempts(attempts)?;
        }

        if let Some(limit) = EnvParser::parse_number::<usize>(EnvVars::SEARCH_LIMIT)? {
            self = self.search_limit(limit)?;
        }

        if let Some(normalize) = EnvParser::parse_bool(EnvVars::NORMALIZE_TEXT)? {
            self = self.normalize_text(normalize);
        }

        if let Some(prefixes) = EnvParser::parse_list(EnvVars::COMMAND_PREFIXES)? {
            self = self.command_prefixes(prefixes)?;
        }

        if let Some(labels) = EnvParser::parse_list(EnvVars::METADATA_LABELS)? {
            self = self.metadata_labels(labels)?;
        }

        if let Some(path) = EnvParser::parse_path(EnvVars::CACHE_PATH)? {
            self = self.cache_path(path)?;
        }

        if let Some(eager) = EnvParser::parse_bool(EnvVars::PERSIST_AFTER_MUTATION)? {
            self = self.persist_after_mutation(eager);
        }

        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Config {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.api_base_url, "catalog API")?;
        ConfigValidator::validate_ratio(self.similarity_threshold, "similarity threshold")?;
        ConfigValidator::validate_range(self.min_trigger_length, 1, 1000, "minimum trigger length")?;
        ConfigValidator::validate_range(self.max_cache_size, 1, 100_000, "maximum cache size")?;
        ConfigValidator::validate_range(self.trigger_probability, 0, 100, "trigger probability")?;
        ConfigValidator::validate_range(self.request_timeout_secs, 1, 120, "request timeout seconds")?;
        ConfigValidator::validate_range(self.max_attempts, 1, 5, "max attempts")?;
        ConfigValidator::validate_range(self.search_limit, 1, 10, "search limit")?;
        ConfigValidator::validate_non_empty_entries(&self.command_prefixes, "command prefixes")?;
        ConfigValidator::validate_non_empty_entries(&self.metadata_labels, "metadata labels")?;
        ConfigValidator::validate_snapshot_path(&self.cache_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LyricChainError;
    use std::env;

    #[test]
    fn test_config_builder_basic() {
        let config = ConfigBuilder::new()
            .api_base_url("https://test.example.com")
            .unwrap()
            .similarity_threshold(0.65)
            .unwrap()
            .normalize_text(false)
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "https://test.example.com");
        assert_eq!(config.similarity_threshold, 0.65);
        assert!(!config.normalize_text);
    }

    #[test]
    fn test_config_builder_validation() {
        let result = ConfigBuilder::new().api_base_url("not-a-url").err().unwrap();
        assert!(matches!(result, LyricChainError::Validation(_)));

        assert!(ConfigBuilder::new().similarity_threshold(1.5).is_err());
        assert!(ConfigBuilder::new().max_cache_size(0).is_err());
        assert!(ConfigBuilder::new().min_trigger_length(0).is_err());
        assert!(ConfigBuilder::new().trigger_probability(101).is_err());
        assert!(ConfigBuilder::new().cache_path("cache.txt").is_err());
    }

    #[test]
    fn test_build_rejects_invalid_file_values() {
        let mut config = Config::default();
        config.max_cache_size = 0;
        assert!(ConfigBuilder::from_config(config).build().is_err());

        let mut config = Config::default();
        config.similarity_threshold = -0.2;
        assert!(ConfigBuilder::from_config(config).build().is_err());
    }

    #[test]
    fn test_config_builder_from_env() {
        env::set_var("LYRICCHAIN_API_BASE_URL", "https://env.example.com");
        env::set_var("LYRICCHAIN_TRIGGER_PROBABILITY", "40");

        let config = ConfigBuilder::new()
            .load_from_env()
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "https://env.example.com");
        assert_eq!(config.trigger_probability, 40);

        env::remove_var("LYRICCHAIN_API_BASE_URL");
        env::remove_var("LYRICCHAIN_TRIGGER_PROBABILITY");
    }
}
