//! Configuration system for swctl
//!
//! Layers a YAML config file and environment overrides over built-in defaults.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, ReadinessConfig};

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "manifestsDir" => Ok(config.manifests_dir.display().to_string()),
        "namespace" => Ok(config.namespace.clone()),
        "output" => Ok(config.output.to_string()),
        "readiness.timeoutSeconds" => Ok(config.readiness.timeout_seconds.to_string()),
        "readiness.pollIntervalMillis" => Ok(config.readiness.poll_interval_millis.to_string()),
        "readiness.maxPollIntervalMillis" => {
            Ok(config.readiness.max_poll_interval_millis.to_string())
        }
        "readiness.backoffMultiplier" => Ok(config.readiness.backoff_multiplier.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "manifestsDir" => {
            config.manifests_dir = value.into();
        }
        "namespace" => {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("namespace must not be empty"));
            }
            config.namespace = value.to_string();
        }
        "output" => {
            config.output = value.parse()?;
        }
        "readiness.timeoutSeconds" => {
            config.readiness.timeout_seconds = value
                .parse()
                .context("readiness.timeoutSeconds must be a number")?;
        }
        "readiness.pollIntervalMillis" => {
            config.readiness.poll_interval_millis = value
                .parse()
                .context("readiness.pollIntervalMillis must be a number")?;
        }
        "readiness.maxPollIntervalMillis" => {
            config.readiness.max_poll_interval_millis = value
                .parse()
                .context("readiness.maxPollIntervalMillis must be a number")?;
        }
        "readiness.backoffMultiplier" => {
            config.readiness.backoff_multiplier = value
                .parse()
                .context("readiness.backoffMultiplier must be a number")?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    ConfigLoader::check(config)
}
