//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::install::PollPolicy;
use crate::output::OutputFormat;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root of the manifest tree (crds/, templates/, operator/, infrastructure/)
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,

    /// Namespace for namespaced resources that do not declare one
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Default output format for command results
    #[serde(default)]
    pub output: OutputFormat,

    /// Readiness wait configuration
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

/// Readiness wait configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessConfig {
    /// Deadline for each phase's readiness wait
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Delay before the second poll
    #[serde(default = "default_poll_interval_millis")]
    pub poll_interval_millis: u64,

    /// Upper bound for the poll delay
    #[serde(default = "default_max_poll_interval_millis")]
    pub max_poll_interval_millis: u64,

    /// Growth factor applied to the delay after each poll round
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_millis),
            max_interval: Duration::from_millis(
                self.max_poll_interval_millis.max(self.poll_interval_millis),
            ),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

// Default value functions
fn default_manifests_dir() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_namespace() -> String {
    "sitewhere-system".to_string()
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_poll_interval_millis() -> u64 {
    2000
}

fn default_max_poll_interval_millis() -> u64 {
    15000
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifests_dir: default_manifests_dir(),
            namespace: default_namespace(),
            output: OutputFormat::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            poll_interval_millis: default_poll_interval_millis(),
            max_poll_interval_millis: default_max_poll_interval_millis(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}
