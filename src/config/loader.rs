//! Configuration loading
//!
//! Handles loading configuration from the config file and environment
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
    /// Command line flags are applied on top by the caller.
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::root_config_path())
    }

    /// Load configuration using `path` as the config file
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load_from(path: &Path) -> Result<Config> {
        let config = if path.exists() {
            Self::load_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::load_defaults()
        };

        let config = Self::apply_overrides(config, |key| std::env::var(key).ok());
        Self::check(&config)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the config file at `path`
    ///
    /// Fails on invalid YAML, invalid value types and out-of-range settings.
    pub fn validate(path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let config = Self::load_file(path)?;
        Self::check(&config)
    }

    /// Range checks shared by loading, validation and `config set`
    pub fn check(config: &Config) -> Result<()> {
        if config.namespace.trim().is_empty() {
            return Err(anyhow::anyhow!("namespace must not be empty"));
        }
        if config.readiness.poll_interval_millis == 0 {
            return Err(anyhow::anyhow!(
                "readiness.pollIntervalMillis must be greater than 0"
            ));
        }
        if config.readiness.backoff_multiplier < 1.0 {
            return Err(anyhow::anyhow!(
                "readiness.backoffMultiplier must be at least 1.0, got {}",
                config.readiness.backoff_multiplier
            ));
        }

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides read through `lookup`
    fn apply_overrides<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        // SWCTL_MANIFESTS_DIR override
        if let Some(dir) = lookup("SWCTL_MANIFESTS_DIR") {
            config.manifests_dir = PathBuf::from(dir);
        }

        // SWCTL_NAMESPACE override
        if let Some(namespace) = lookup("SWCTL_NAMESPACE") {
            config.namespace = namespace;
        }

        // SWCTL_READINESS_TIMEOUT override (seconds)
        if let Some(timeout) = lookup("SWCTL_READINESS_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => config.readiness.timeout_seconds = secs,
                Err(_) => tracing::warn!("Ignoring invalid SWCTL_READINESS_TIMEOUT: {}", timeout),
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}
