use std::env;
use std::path::PathBuf;
use crate::error::{Result, LyricChainError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const API_BASE_URL: &'static str = "LYRICCHAIN_API_BASE_URL";
    pub const SIMILARITY_THRESHOLD: &'static str = "LYRICCHAIN_SIMILARITY_THRESHOLD";
    pub const MIN_TRIGGER_LENGTH: &'static str = "LYRICCHAIN_MIN_TRIGGER_LENGTH";
    pub const MAX_CACHE_SIZE: &'static str = "LYRICCHAIN_MAX_CACHE_SIZE";
    pub const TRIGGER_PROBABILITY: &'static str = "LYRICCHAIN_TRIGGER_PROBABILITY";
    pub const REQUEST_TIMEOUT_SECS: &'static str = "LYRICCHAIN_REQUEST_TIMEOUT_SECS";
    pub const MAX_ATTEMPTS: &'static str = "LYRICCHAIN_MAX_ATTEMPTS";
    pub const SEARCH_LIMIT: &'static str = "LYRICCHAIN_SEARCH_LIMIT";
    pub const NORMALIZE_TEXT: &'static str = "LYRICCHAIN_NORMALIZE_TEXT";
    pub const COMMAND_PREFIXES: &'static str = "LYRICCHAIN_COMMAND_PREFIXES";
    pub const METADATA_LABELS: &'static str = "LYRICCHAIN_METADATA_LABELS";
    pub const CACHE_PATH: &'static str = "LYRICCHAIN_CACHE_PATH";
    pub const PERSIST_AFTER_MUTATION: &'static str = "LYRICCHAIN_PERSIST_AFTER_MUTATION";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(LyricChainError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Parse environment variable as PathBuf
    pub fn parse_path(var_name: &str) -> Result<Option<PathBuf>> {
        Ok(Self::parse_string(var_name, None)?.map(PathBuf::from))
    }

    /// Parse environment variable as boolean with validation
    pub fn parse_bool(var_name: &str) -> Result<Option<bool>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            match value_str.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(LyricChainError::Validation(format!(
                    "Invalid boolean value in {}: '{}'. Use: true/false, 1/0, yes/no, on/off",
                    var_name, value_str
                )))
            }
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as any number type; range checks happen in the builder
    pub fn parse_number<T>(var_name: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
    {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<T>().map_err(|_| {
                LyricChainError::Validation(format!(
                    "Invalid number in {}: '{}'",
                    var_name, value_str
                ))
            })?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Parse a comma separated list, dropping blank items
    pub fn parse_list(var_name: &str) -> Result<Option<Vec<String>>> {
        Ok(Self::parse_string(var_name, None)?.map(|value| {
            value
                .split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        }))
    }

    /// Get all LYRICCHAIN environment variables for debugging
    pub fn get_all_lyricchain_vars() -> Vec<(String, String)> {
        env::vars()
            .filter(|(key, _)| key.starts_with("LYRICCHAIN_"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_parse_bool() {
        env::set_var("TEST_LC_BOOL_TRUE", "yes");
        env::set_var("TEST_LC_BOOL_FALSE", "0");
        env::set_var("TEST_LC_BOOL_INVALID", "maybe");

        assert_eq!(EnvParser::parse_bool("TEST_LC_BOOL_TRUE").unwrap(), Some(true));
        assert_eq!(EnvParser::parse_bool("TEST_LC_BOOL_FALSE").unwrap(), Some(false));
        assert!(EnvParser::parse_bool("TEST_LC_BOOL_INVALID").is_err());
        assert_eq!(EnvParser::parse_bool("TEST_LC_BOOL_NOT_SET").unwrap(), None);

        env::remove_var("TEST_LC_BOOL_TRUE");
        env::remove_var("TEST_LC_BOOL_FALSE");
        env::remove_var("TEST_LC_BOOL_INVALID");
    }

    #[test]
    fn test_parse_number() {
        env::set_var("TEST_LC_F64", "0.75");
        env::set_var("TEST_LC_U8_INVALID", "300");

        assert_eq!(EnvParser::parse_number::<f64>("TEST_LC_F64").unwrap(), Some(0.75));
        assert!(EnvParser::parse_number::<u8>("TEST_LC_U8_INVALID").is_err());
        assert_eq!(EnvParser::parse_number::<usize>("TEST_LC_NUM_NOT_SET").unwrap(), None);

        env::remove_var("TEST_LC_F64");
        env::remove_var("TEST_LC_U8_INVALID");
    }

    #[test]
    fn test_parse_list() {
        env::set_var("TEST_LC_LIST", " / , !, ,# ");
        assert_eq!(
            EnvParser::parse_list("TEST_LC_LIST").unwrap(),
            Some(vec!["/".to_string(), "!".to_string(), "#".to_string()])
        );
        env::remove_var("TEST_LC_LIST");
    }
}
