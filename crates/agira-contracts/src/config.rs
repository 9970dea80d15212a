//! Process configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty document is a valid
//! configuration. Redis connection values can be overridden from the
//! environment after loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AgiraError, AgiraResult};

/// Top-level configuration document.
///
/// Example:
/// ```toml
/// [cache]
/// host = "redis.internal"
/// port = 6380
///
/// [reports]
/// storage_dir = "/var/lib/agira/reports"
///
/// [pipeline]
/// order = ["security_headers", "embed_frame"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgiraConfig {
    pub cache: CacheSettings,
    pub reports: ReportSettings,
    pub pipeline: PipelineSettings,
}

/// Connection settings for the agent cache backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When false the cache service starts disabled without connecting.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub socket_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            socket_timeout_secs: 5,
            connect_timeout_secs: 5,
        }
    }
}

impl CacheSettings {
    /// Build a `redis://` connection URL from the settings.
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) if !password.is_empty() => {
                format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.db)
            }
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Where rendered report files and their index rows are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub storage_dir: PathBuf,
    pub index_file: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("media/reports"),
            index_file: PathBuf::from("media/reports/index.jsonl"),
        }
    }
}

/// Explicit ordering of request/response middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub order: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            order: vec!["security_headers".to_string(), "embed_frame".to_string()],
        }
    }
}

impl AgiraConfig {
    /// Parse `s` as TOML configuration.
    ///
    /// Returns `AgiraError::ConfigError` if the TOML is malformed or a field
    /// has the wrong type.
    pub fn from_toml_str(s: &str) -> AgiraResult<Self> {
        toml::from_str(s).map_err(|e| AgiraError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> AgiraResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AgiraError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `AGIRA_REDIS_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> AgiraResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> AgiraResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("AGIRA_REDIS_HOST") {
            self.cache.host = host;
        }
        if let Some(port) = lookup("AGIRA_REDIS_PORT") {
            self.cache.port = port.parse().map_err(|e| AgiraError::ConfigError {
                reason: format!("AGIRA_REDIS_PORT '{}' is not a valid port: {}", port, e),
            })?;
        }
        if let Some(db) = lookup("AGIRA_REDIS_DB") {
            self.cache.db = db.parse().map_err(|e| AgiraError::ConfigError {
                reason: format!("AGIRA_REDIS_DB '{}' is not a valid database index: {}", db, e),
            })?;
        }
        if let Some(password) = lookup("AGIRA_REDIS_PASSWORD") {
            self.cache.password = Some(password);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AgiraConfig::from_toml_str("").unwrap();
        assert_eq!(config, AgiraConfig::default());
        assert_eq!(config.cache.port, 6379);
        assert_eq!(config.pipeline.order, vec!["security_headers", "embed_frame"]);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = AgiraConfig::from_toml_str(
            r#"
            [cache]
            host = "redis.internal"
            password = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.host, "redis.internal");
        assert_eq!(config.cache.port, 6379);
        assert_eq!(config.cache.redis_url(), "redis://:s3cret@redis.internal:6379/0");
    }

    #[test]
    fn wrong_type_is_config_error() {
        let result = AgiraConfig::from_toml_str("[cache]\nport = \"not-a-port\"\n");
        match result {
            Err(AgiraError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse config TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn env_overrides_replace_redis_values() {
        let env: HashMap<&str, &str> = [
            ("AGIRA_REDIS_HOST", "cache-1"),
            ("AGIRA_REDIS_PORT", "6390"),
            ("AGIRA_REDIS_DB", "2"),
        ]
        .into_iter()
        .collect();

        let mut config = AgiraConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.cache.host, "cache-1");
        assert_eq!(config.cache.port, 6390);
        assert_eq!(config.cache.db, 2);
        assert_eq!(config.cache.redis_url(), "redis://cache-1:6390/2");
    }

    #[test]
    fn invalid_port_override_is_rejected() {
        let mut config = AgiraConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "AGIRA_REDIS_PORT").then(|| "seventy".to_string())
        });
        assert!(matches!(result, Err(AgiraError::ConfigError { .. })));
    }
}
