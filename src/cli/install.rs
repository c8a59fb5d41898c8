//! Install and check command handlers

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigLoader};
use crate::install::{ClusterClient, Orchestrator, OrchestratorConfig};
use crate::kube::{self as kube_client, KubeCluster};
use crate::manifests::DirectoryManifestSource;
use crate::output::{InstallReport, OutputFormat, write_report};

/// Flags for `swctl install`
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Wait for each phase to become ready before starting the next
    #[arg(long, short = 'w')]
    pub wait: bool,

    /// Skip custom resource definitions
    #[arg(long)]
    pub skip_crd: bool,

    /// Skip templates
    #[arg(long)]
    pub skip_templates: bool,

    /// Skip the operator
    #[arg(long)]
    pub skip_operator: bool,

    /// Skip infrastructure components
    #[arg(long)]
    pub skip_infra: bool,

    /// Output format
    #[arg(long, short = 'o', value_enum)]
    pub output: Option<OutputFormat>,

    /// Directory holding the manifest tree
    #[arg(long, value_name = "DIR")]
    pub manifests: Option<PathBuf>,

    /// Readiness timeout per phase in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Namespace for namespaced resources that do not name one
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long)]
    pub context: Option<String>,
}

impl InstallArgs {
    /// Apply command line flags over the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(dir) = &self.manifests {
            config.manifests_dir = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.readiness.timeout_seconds = timeout;
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
    }

    /// Build the orchestrator options from flags and configuration
    pub fn orchestrator_config(&self, config: &Config) -> OrchestratorConfig {
        OrchestratorConfig {
            skip_resource_definitions: self.skip_crd,
            skip_templates: self.skip_templates,
            skip_operator: self.skip_operator,
            skip_infrastructure: self.skip_infra,
            wait_for_ready: self.wait,
            readiness_timeout: config.readiness.timeout(),
            poll: config.readiness.poll_policy(),
        }
    }
}

async fn connect(context: Option<&str>, namespace: &str) -> Result<KubeCluster> {
    let client = match context {
        Some(context) => kube_client::create_client_for_context(context).await?,
        None => kube_client::create_client().await?,
    };
    Ok(KubeCluster::new(client, namespace))
}

/// Run `swctl install`
///
/// The report is always written, including the partial result of a failed
/// run. A failed run then returns its error so the process exits non-zero.
pub async fn handle_install_command(args: InstallArgs, cancel: CancellationToken) -> Result<()> {
    let mut config = ConfigLoader::load().context("Failed to load configuration")?;
    args.apply_to(&mut config);

    if !config.manifests_dir.is_dir() {
        anyhow::bail!(
            "Manifest directory not found: {}",
            config.manifests_dir.display()
        );
    }

    let context_name = args
        .context
        .clone()
        .unwrap_or_else(kube_client::get_context);
    tracing::info!(context = %context_name, namespace = %config.namespace, "Installing");

    let cluster = connect(args.context.as_deref(), &config.namespace).await?;
    let manifests = DirectoryManifestSource::new(&config.manifests_dir);

    let orchestrator = Orchestrator::new(
        args.orchestrator_config(&config),
        Arc::new(cluster),
        Arc::new(manifests),
    )
    .with_cancellation(cancel);

    let (report, error) = match orchestrator.run().await {
        Ok(result) => (InstallReport::success(result), None),
        Err(failure) => {
            let (result, error) = failure.into_parts();
            (InstallReport::failure(result, &error), Some(error))
        }
    };

    let mut stdout = std::io::stdout().lock();
    let color = config.output == OutputFormat::Table && std::io::stdout().is_terminal();
    write_report(&mut stdout, config.output, &report, color)
        .context("Failed to write installation report")?;

    match error {
        Some(error) => Err(anyhow::Error::new(error).context("Installation failed")),
        None => Ok(()),
    }
}

/// Run `swctl check`: verify the cluster answers
pub async fn handle_check_command(context: Option<String>) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let cluster = connect(context.as_deref(), &config.namespace).await?;
    let context_name = context.unwrap_or_else(kube_client::get_context);

    cluster
        .is_reachable()
        .await
        .with_context(|| format!("Cluster for context '{}' is not reachable", context_name))?;

    println!("Cluster for context '{}' is reachable", context_name);
    Ok(())
}
