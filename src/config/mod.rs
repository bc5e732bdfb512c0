//! Configuration system for kubegraph
//!
//! Layers built-in defaults, an optional YAML file and environment overrides.
//! Command-line flags are applied last by the binary.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, GraphConfig};

use anyhow::Context;

/// Keys accepted by `config get` / `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "defaultNamespace",
    "output",
    "graph.maxNodes",
    "graph.concurrency",
    "graph.requestTimeoutSecs",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &Config, key: &str) -> anyhow::Result<String> {
    match key {
        "defaultNamespace" => Ok(config.default_namespace.clone()),
        "output" => Ok(config.output.to_string()),
        "graph.maxNodes" => Ok(config.graph.max_nodes.to_string()),
        "graph.concurrency" => Ok(config.graph.concurrency.to_string()),
        "graph.requestTimeoutSecs" => Ok(config.graph.request_timeout_secs.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "defaultNamespace" => {
            config.default_namespace = value.to_string();
        }
        "output" => {
            config.output = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        }
        "graph.maxNodes" => {
            config.graph.max_nodes = value
                .parse()
                .context("graph.maxNodes must be a number")?;
        }
        "graph.concurrency" => {
            config.graph.concurrency = value
                .parse()
                .context("graph.concurrency must be a number")?;
        }
        "graph.requestTimeoutSecs" => {
            config.graph.request_timeout_secs = value
                .parse()
                .context("graph.requestTimeoutSecs must be a number of seconds")?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    ConfigLoader::check(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OutputMode;

    #[test]
    fn test_get_set_roundtrip_keys() {
        let mut config = Config::default();
        set_config_value(&mut config, "output", "dot").unwrap();
        set_config_value(&mut config, "graph.maxNodes", "42").unwrap();

        assert_eq!(config.output, OutputMode::Dot);
        assert_eq!(get_config_value(&config, "graph.maxNodes").unwrap(), "42");
        for key in CONFIG_KEYS {
            assert!(get_config_value(&config, key).is_ok(), "{}", key);
        }
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(set_config_value(&mut config, "graph.concurrency", "many").is_err());
        assert!(set_config_value(&mut config, "graph.concurrency", "0").is_err());
        assert!(set_config_value(&mut config, "output", "json").is_err());
        assert!(set_config_value(&mut config, "ui.skin", "dark").is_err());
    }
}
