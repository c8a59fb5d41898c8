//! Kubernetes client module
//!
//! Handles connection to the Kubernetes API server and provides the
//! [`KubeCluster`] implementation of the installer's cluster seam.

mod cluster;
mod readiness;
mod retry;

pub use cluster::{FIELD_MANAGER, KubeCluster};
pub use readiness::evaluate_readiness;

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

/// Initialize and return a Kubernetes client
///
/// Uses the default kubeconfig loading strategy:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client() -> Result<Client> {
    let config = Config::infer()
        .await
        .context("Failed to infer Kubernetes configuration")?;
    tracing::debug!(cluster_url = %config.cluster_url, "Using inferred kubeconfig");
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Create a client for a named kubeconfig context
pub async fn create_client_for_context(context: &str) -> Result<Client> {
    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };
    let config = Config::from_kubeconfig(&options)
        .await
        .with_context(|| format!("Failed to load kubeconfig context '{}'", context))?;
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Get the current Kubernetes context name
///
/// Falls back to "in-cluster" when no kubeconfig is available.
pub fn get_context() -> String {
    Kubeconfig::read()
        .ok()
        .and_then(|kubeconfig| kubeconfig.current_context)
        .unwrap_or_else(|| "in-cluster".to_string())
}
