//! Installation orchestrator
//!
//! Runs the preflight check, then every phase in fixed order, applying and
//! optionally waiting on each one. The first error stops the run; everything
//! recorded up to that point is returned with it.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::applier::{PhaseApplier, PhaseSpec};
use super::cluster::ClusterClient;
use super::error::{InstallError, InstallFailure};
use super::readiness::{PollPolicy, ReadinessWaiter};
use super::result::InstallationResult;
use super::status::Phase;
use crate::manifests::ManifestSource;

/// Options for one installation run
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub skip_resource_definitions: bool,
    pub skip_templates: bool,
    pub skip_operator: bool,
    pub skip_infrastructure: bool,
    /// Block after each phase until its resources report ready
    pub wait_for_ready: bool,
    /// Deadline for each phase's readiness wait
    pub readiness_timeout: Duration,
    pub poll: PollPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            skip_resource_definitions: false,
            skip_templates: false,
            skip_operator: false,
            skip_infrastructure: false,
            wait_for_ready: false,
            readiness_timeout: Duration::from_secs(300),
            poll: PollPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn skips(&self, phase: Phase) -> bool {
        match phase {
            Phase::ResourceDefinitions => self.skip_resource_definitions,
            Phase::Templates => self.skip_templates,
            Phase::Operator => self.skip_operator,
            Phase::Infrastructure => self.skip_infrastructure,
        }
    }
}

/// Drives an installation against one cluster
pub struct Orchestrator {
    config: OrchestratorConfig,
    cluster: Arc<dyn ClusterClient>,
    manifests: Arc<dyn ManifestSource>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        cluster: Arc<dyn ClusterClient>,
        manifests: Arc<dyn ManifestSource>,
    ) -> Self {
        Self {
            config,
            cluster,
            manifests,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the installation
    ///
    /// Returns the complete result, or an [`InstallFailure`] holding the
    /// partial result and the error that stopped the run.
    #[instrument(skip(self), fields(wait = self.config.wait_for_ready))]
    pub async fn run(&self) -> Result<InstallationResult, InstallFailure> {
        let mut result = InstallationResult::new();
        for phase in Phase::ALL {
            result.mark_skipped(phase, self.config.skips(phase));
        }

        match self.run_phases(&mut result).await {
            Ok(()) => {
                result.finish();
                info!(resources = result.total(), "Installation complete");
                Ok(result)
            }
            Err(error) => {
                result.finish();
                warn!(error = %error, kind = error.kind(), "Installation stopped");
                Err(InstallFailure::new(result, error))
            }
        }
    }

    async fn run_phases(&self, result: &mut InstallationResult) -> Result<(), InstallError> {
        let reachable = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(InstallError::Cancelled),
            reachable = self.cluster.is_reachable() => reachable,
        };
        reachable.map_err(InstallError::ClusterUnreachable)?;
        debug!("Cluster reachable");

        let applier = PhaseApplier::new(self.cluster.as_ref(), self.manifests.as_ref(), &self.cancel);
        let waiter = ReadinessWaiter::new(
            self.cluster.as_ref(),
            self.manifests.as_ref(),
            &self.cancel,
            self.config.poll.clone(),
        );

        for phase in Phase::ALL {
            if self.cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }

            let spec = self.phase_spec(phase)?;
            if spec.skip {
                info!(phase = %phase, "Skipping phase");
                continue;
            }

            applier.apply(&spec, result.phase_mut(phase)).await?;

            if self.config.wait_for_ready {
                waiter
                    .wait(&spec, result.phase(phase), self.config.readiness_timeout)
                    .await?;
            }
        }

        Ok(())
    }

    fn phase_spec(&self, phase: Phase) -> Result<PhaseSpec, InstallError> {
        if self.config.skips(phase) {
            return Ok(PhaseSpec::skipped(phase));
        }

        let resources = self
            .manifests
            .list_resource_names(phase)
            .map_err(|source| InstallError::Manifests { phase, source })?;
        Ok(PhaseSpec::new(phase, resources))
    }
}
