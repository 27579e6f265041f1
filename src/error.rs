//! Error handling for the lyricchain engine
//!
//! Errors are grouped by the boundary they cross. Network errors never leave
//! the catalog client, persistence errors are recovered by falling back to an
//! empty store, and configuration errors are fatal at construction time.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricChainError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rate limit exceeded")]
    RateLimit,

    #[error("Unexpected status: {status}")]
    Status { status: reqwest::StatusCode },

    #[error("API response invalid: {reason}")]
    InvalidResponse { reason: String },

    #[error("Timeout exceeded")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Snapshot not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Could not determine platform directories")]
    NoProjectDirs,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Refusing to store an empty line sequence")]
    EmptyLineSequence,
}

pub type Result<T> = std::result::Result<T, LyricChainError>;

impl From<std::io::Error> for LyricChainError {
    fn from(err: std::io::Error) -> Self {
        LyricChainError::Persistence(PersistenceError::Io(err))
    }
}

impl From<serde_json::Error> for LyricChainError {
    fn from(err: serde_json::Error) -> Self {
        LyricChainError::Persistence(PersistenceError::Malformed(err))
    }
}

impl From<toml::de::Error> for LyricChainError {
    fn from(err: toml::de::Error) -> Self {
        LyricChainError::Config(ConfigError::InvalidFormat(err))
    }
}

impl NetworkError {
    /// Split timeouts out of the generic reqwest error so logs say what happened
    pub fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else {
            NetworkError::Http(err)
        }
    }

    /// Whether another attempt might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::RateLimit | NetworkError::Timeout => true,
            NetworkError::Status { status } => status.is_server_error(),
            NetworkError::Http(err) => err.is_connect() || err.is_request(),
            NetworkError::InvalidResponse { .. } => false,
        }
    }
}
