use std::path::Path;
use url::Url;
use crate::error::{Result, LyricChainError};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an http(s) URL string
    pub fn validate_url(url: &str, field_name: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| {
            LyricChainError::Validation(format!("Invalid {} URL '{}': {}", field_name, url, e))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(LyricChainError::Validation(format!(
                "{} URL must use http or https, got: {}",
                field_name, url
            )));
        }
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(LyricChainError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate a ratio in [0, 1]; NaN and infinities are rejected
    pub fn validate_ratio(value: f64, field_name: &str) -> Result<()> {
        if !value.is_finite() {
            return Err(LyricChainError::Validation(format!(
                "{} must be a finite number, got {}",
                field_name, value
            )));
        }
        Self::validate_range(value, 0.0, 1.0, field_name)
    }

    /// Validate a list of matching prefixes/labels
    pub fn validate_non_empty_entries(values: &[String], field_name: &str) -> Result<()> {
        if let Some(pos) = values.iter().position(|v| v.trim().is_empty()) {
            return Err(LyricChainError::Validation(format!(
                "{} entry {} is empty",
                field_name, pos
            )));
        }
        Ok(())
    }

    /// Validate snapshot file extension
    pub fn validate_snapshot_path(path: &Path) -> Result<()> {
        match path.extension() {
            Some(ext) if ext == "json" => Ok(()),
            _ => Err(LyricChainError::Validation(format!(
                "Cache snapshot should have a .json extension, got: {}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_url() {
        assert!(ConfigValidator::validate_url("http://localhost:3000", "API").is_ok());
        assert!(ConfigValidator::validate_url("https://music.example.com/api", "API").is_ok());
        assert!(ConfigValidator::validate_url("not-a-url", "API").is_err());
        assert!(ConfigValidator::validate_url("ftp://localhost", "API").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(ConfigValidator::validate_range(5u64, 1u64, 10u64, "test").is_ok());
        assert!(ConfigValidator::validate_range(15u64, 1u64, 10u64, "test").is_err());
        assert!(ConfigValidator::validate_range(0u64, 1u64, 10u64, "test").is_err());
    }

    #[test]
    fn test_validate_ratio() {
        assert!(ConfigValidator::validate_ratio(0.0, "threshold").is_ok());
        assert!(ConfigValidator::validate_ratio(1.0, "threshold").is_ok());
        assert!(ConfigValidator::validate_ratio(1.01, "threshold").is_err());
        assert!(ConfigValidator::validate_ratio(-0.1, "threshold").is_err());
        assert!(ConfigValidator::validate_ratio(f64::NAN, "threshold").is_err());
    }

    #[test]
    fn test_validate_non_empty_entries() {
        let ok = vec!["/".to_string(), "#".to_string()];
        let bad = vec!["/".to_string(), "  ".to_string()];
        assert!(ConfigValidator::validate_non_empty_entries(&ok, "prefixes").is_ok());
        assert!(ConfigValidator::validate_non_empty_entries(&bad, "prefixes").is_err());
    }

    #[test]
    fn test_validate_snapshot_path() {
        assert!(ConfigValidator::validate_snapshot_path(&PathBuf::from("cache.json")).is_ok());
        assert!(ConfigValidator::validate_snapshot_path(&PathBuf::from("cache.db")).is_err());
        assert!(ConfigValidator::validate_snapshot_path(&PathBuf::from("cache")).is_err());
    }
}
