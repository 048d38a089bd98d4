use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::CacheConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database URL cannot be empty")]
    EmptyDatabaseUrl,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid TTL for {0}: {1}. Must be at least 1 second")]
    InvalidTtl(&'static str, i64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .feedcache/config.yaml (project config)
    /// 3. Environment variables (FEEDCACHE_* prefix, highest priority)
    pub fn load() -> Result<CacheConfig> {
        let config: CacheConfig = Figment::new()
            .merge(Serialized::defaults(CacheConfig::default()))
            .merge(Yaml::file(".feedcache/config.yaml"))
            .merge(Env::prefixed("FEEDCACHE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<CacheConfig> {
        let config: CacheConfig = Figment::new()
            .merge(Serialized::defaults(CacheConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &CacheConfig) -> Result<(), ConfigError> {
        if config.database.url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let ttls = [
            ("topic_ranked_secs", config.ttl.topic_ranked_secs),
            ("topic_latest_secs", config.ttl.topic_latest_secs),
            ("profile_secs", config.ttl.profile_secs),
            ("replies_secs", config.ttl.replies_secs),
            ("default_secs", config.ttl.default_secs),
        ];
        for (name, value) in ttls {
            if value < 1 {
                return Err(ConfigError::InvalidTtl(name, value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = CacheConfig::default();
        ConfigLoader::validate(&config).unwrap();
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let mut config = CacheConfig::default();
        config.database.url = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabaseUrl)
        ));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let mut config = CacheConfig::default();
        config.ttl.profile_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTtl("profile_secs", 0))
        ));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  url: \"sqlite:custom.db\"\nttl:\n  profile_secs: 60"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "sqlite:custom.db");
        assert_eq!(config.ttl.profile_secs, 60);
        // Untouched values keep their defaults.
        assert_eq!(config.ttl.replies_secs, 1_800);
    }
}
