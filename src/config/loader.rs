//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Root config file
    /// 3. Built-in defaults
    ///
    /// Command-line flags are applied on top by the caller.
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::root_config_path())
    }

    /// Same as [`ConfigLoader::load`] with an explicit root file
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut config = Self::load_defaults();

        if path.exists() {
            config = Self::merge_config(config, Self::load_file(path)?);
        }

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the root config file and the merged result
    ///
    /// Fails on invalid YAML, invalid value types and zero limits.
    pub fn validate() -> Result<()> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            let config = Self::load_file(&root_path)?;
            Self::check(&config)
                .with_context(|| format!("Invalid config file: {}", root_path.display()))?;
        }

        let merged = Self::load().context("Failed to load merged configuration")?;
        Self::check(&merged).context("Invalid merged configuration")?;

        Ok(())
    }

    /// Check value ranges
    pub fn check(config: &Config) -> Result<()> {
        if config.graph.max_nodes == 0 {
            return Err(anyhow::anyhow!("graph.maxNodes must be at least 1"));
        }
        if config.graph.concurrency == 0 {
            return Err(anyhow::anyhow!("graph.concurrency must be at least 1"));
        }
        if config.graph.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("graph.requestTimeoutSecs must be at least 1"));
        }
        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Merge two configurations, with `other` taking precedence
    ///
    /// Missing keys in a file already deserialize to their defaults, so the
    /// file layer replaces the base wholesale.
    fn merge_config(_base: Config, other: Config) -> Config {
        Config {
            default_namespace: other.default_namespace,
            output: other.output,
            graph: other.graph,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        if let Ok(namespace) = std::env::var("KUBEGRAPH_DEFAULT_NAMESPACE") {
            config.default_namespace = namespace;
        }

        if let Ok(output) = std::env::var("KUBEGRAPH_OUTPUT") {
            match output.parse() {
                Ok(mode) => config.output = mode,
                Err(e) => tracing::warn!("Ignoring KUBEGRAPH_OUTPUT: {}", e),
            }
        }

        if let Some(max_nodes) = env_number("KUBEGRAPH_MAX_NODES") {
            config.graph.max_nodes = max_nodes;
        }

        if let Some(concurrency) = env_number("KUBEGRAPH_CONCURRENCY") {
            config.graph.concurrency = concurrency;
        }

        if let Some(timeout) = env_number("KUBEGRAPH_REQUEST_TIMEOUT_SECS") {
            config.graph.request_timeout_secs = timeout;
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}: '{}' is not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OutputMode;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.graph.max_nodes, 500);
        assert_eq!(config.output, OutputMode::Tree);
    }

    #[test]
    fn test_merge_config() {
        let base = Config::default();
        let other = Config {
            default_namespace: "test-ns".to_string(),
            output: OutputMode::Dot,
            ..Default::default()
        };

        let merged = ConfigLoader::merge_config(base, other);
        assert_eq!(merged.default_namespace, "test-ns");
        assert_eq!(merged.output, OutputMode::Dot);
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
        // These variables are only read by this test.
        unsafe {
            std::env::set_var("KUBEGRAPH_OUTPUT", "dot");
            std::env::set_var("KUBEGRAPH_MAX_NODES", "25");
            std::env::set_var("KUBEGRAPH_CONCURRENCY", "not-a-number");
        }

        let config = ConfigLoader::apply_env_overrides(Config::default());

        assert_eq!(config.output, OutputMode::Dot);
        assert_eq!(config.graph.max_nodes, 25);
        assert_eq!(config.graph.concurrency, 8);

        // SAFETY: see above
        unsafe {
            std::env::remove_var("KUBEGRAPH_OUTPUT");
            std::env::remove_var("KUBEGRAPH_MAX_NODES");
            std::env::remove_var("KUBEGRAPH_CONCURRENCY");
        }
    }

    #[test]
    fn test_check_rejects_zero_limits() {
        let mut config = Config::default();
        assert!(ConfigLoader::check(&config).is_ok());

        config.graph.concurrency = 0;
        let err = ConfigLoader::check(&config).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config {
            default_namespace: "prod".to_string(),
            ..Default::default()
        };
        ConfigLoader::save(&config, &path).unwrap();

        let loaded = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
