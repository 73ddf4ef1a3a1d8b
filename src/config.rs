//! Process configuration
//!
//! Read once at startup, from a JSON file or from the environment, then
//! passed by value into the type registry, entities and request parser.
//! Nothing reads the environment at validate or compile time.
//!
//! Environment variables (password policy):
//! - `PWD_MIN_LENGTH_POLICY` (default 9)
//! - `PWD_MAX_LENGTH_POLICY` (default 20)
//! - `PWD_NUMBERS_POLICY`, `PWD_UPPERCASE_POLICY`, `PWD_LOWERCASE_POLICY`,
//!   `PWD_SYMBOLS_POLICY`: any non-empty value turns the rule on

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::filter::BoolOperator;
use crate::observability::Event;
use crate::pipeline::SanitizeLimits;
use crate::query::{RequestParser, MAX_ROWS};
use crate::types::{PasswordPolicy, TypeRegistry};

pub const ENV_MIN_LENGTH: &str = "PWD_MIN_LENGTH_POLICY";
pub const ENV_MAX_LENGTH: &str = "PWD_MAX_LENGTH_POLICY";
pub const ENV_NUMBERS: &str = "PWD_NUMBERS_POLICY";
pub const ENV_UPPERCASE: &str = "PWD_UPPERCASE_POLICY";
pub const ENV_LOWERCASE: &str = "PWD_LOWERCASE_POLICY";
pub const ENV_SYMBOLS: &str = "PWD_SYMBOLS_POLICY";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read(_) => "ANTITY_CONFIG_READ",
            ConfigError::Parse(_) => "ANTITY_CONFIG_PARSE",
            ConfigError::Invalid(_) => "ANTITY_CONFIG_INVALID",
        }
    }
}

/// Filter and paging defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefaults {
    /// Largest page a request may ask for
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Page size when a request names none; unlimited when absent
    #[serde(default)]
    pub default_rows: Option<usize>,

    /// Connective between fields
    #[serde(default)]
    pub operator: BoolOperator,
}

fn default_max_rows() -> usize {
    MAX_ROWS
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            default_rows: None,
            operator: BoolOperator::And,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AntityConfig {
    #[serde(default)]
    pub password: PasswordPolicy,

    #[serde(default)]
    pub sanitize: SanitizeLimits,

    #[serde(default)]
    pub filter: FilterDefaults,
}

impl AntityConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config: AntityConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        tracing::info!(
            event = %Event::ConfigLoaded,
            source = %path.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Defaults with the password policy taken from the environment.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        tracing::info!(event = %Event::ConfigLoaded, source = "env", "configuration loaded");
        Ok(config)
    }

    /// Defaults with the password policy read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PasswordPolicy::default();
        let flag = |name: &str| lookup(name).map_or(false, |v| !v.is_empty());
        let length = |name: &str, default: usize| -> ConfigResult<usize> {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("{} must be a length, got {:?}", name, v))),
                None => Ok(default),
            }
        };

        let config = Self {
            password: PasswordPolicy {
                min_length: length(ENV_MIN_LENGTH, defaults.min_length)?,
                max_length: length(ENV_MAX_LENGTH, defaults.max_length)?,
                require_number: flag(ENV_NUMBERS),
                require_uppercase: flag(ENV_UPPERCASE),
                require_lowercase: flag(ENV_LOWERCASE),
                require_special: flag(ENV_SYMBOLS),
            },
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.password.min_length > self.password.max_length {
            return Err(ConfigError::Invalid(format!(
                "password min_length {} is greater than max_length {}",
                self.password.min_length, self.password.max_length
            )));
        }
        if self.sanitize.max_depth == 0 {
            return Err(ConfigError::Invalid("sanitize max_depth must be > 0".into()));
        }
        if self.filter.max_rows == 0 {
            return Err(ConfigError::Invalid("filter max_rows must be > 0".into()));
        }
        if let Some(rows) = self.filter.default_rows {
            if rows > self.filter.max_rows {
                return Err(ConfigError::Invalid(format!(
                    "filter default_rows {} exceeds max_rows {}",
                    rows, self.filter.max_rows
                )));
            }
        }
        Ok(())
    }

    /// Built-in types under this configuration's password policy.
    pub fn type_registry(&self) -> TypeRegistry {
        TypeRegistry::with_policy(self.password.clone())
    }

    pub fn request_parser(&self) -> RequestParser {
        RequestParser::new(&self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = AntityConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.password, PasswordPolicy::default());
        assert_eq!(config.password.min_length, 9);
        assert_eq!(config.password.max_length, 20);
    }

    #[test]
    fn test_env_policy() {
        let config = AntityConfig::from_lookup(lookup(&[
            (ENV_MIN_LENGTH, "12"),
            (ENV_NUMBERS, "1"),
            (ENV_SYMBOLS, "yes"),
            (ENV_UPPERCASE, ""),
        ]))
        .unwrap();
        assert_eq!(config.password.min_length, 12);
        assert!(config.password.require_number);
        assert!(config.password.require_special);
        assert!(!config.password.require_uppercase);
    }

    #[test]
    fn test_env_rejects_bad_lengths() {
        let err = AntityConfig::from_lookup(lookup(&[(ENV_MAX_LENGTH, "lots")])).unwrap_err();
        assert_eq!(err.code(), "ANTITY_CONFIG_INVALID");

        let err = AntityConfig::from_lookup(lookup(&[(ENV_MIN_LENGTH, "30")])).unwrap_err();
        assert!(err.to_string().contains("greater than max_length"));
    }

    #[test]
    fn test_load_file_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("antity.json");
        fs::write(
            &path,
            json!({"password": {"min_length": 4}, "filter": {"default_rows": 25}}).to_string(),
        )
        .unwrap();

        let config = AntityConfig::load(&path).unwrap();
        assert_eq!(config.password.min_length, 4);
        assert_eq!(config.password.max_length, 20);
        assert_eq!(config.sanitize.max_depth, 8);
        assert_eq!(config.filter.max_rows, MAX_ROWS);
        assert_eq!(config.filter.default_rows, Some(25));
    }

    #[test]
    fn test_load_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("antity.json");
        fs::write(&path, json!({"sanitize": {"max_depth": 0}}).to_string()).unwrap();
        assert_eq!(
            AntityConfig::load(&path).unwrap_err().code(),
            "ANTITY_CONFIG_INVALID"
        );

        assert_eq!(
            AntityConfig::load(&temp_dir.path().join("absent.json"))
                .unwrap_err()
                .code(),
            "ANTITY_CONFIG_READ"
        );
    }
}
