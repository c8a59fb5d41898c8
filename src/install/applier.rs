//! Phase applier
//!
//! Applies the manifests of one phase in order and classifies each outcome.
//! The first failure other than pre-existence stops the phase.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cluster::{ApplyError, ClusterClient};
use super::error::InstallError;
use super::status::{Phase, PhaseResult, Status};
use crate::manifests::ManifestSource;

/// What to install for one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSpec {
    pub phase: Phase,
    /// Resource names in application order
    pub resources: Vec<String>,
    pub skip: bool,
}

impl PhaseSpec {
    pub fn new(phase: Phase, resources: Vec<String>) -> Self {
        Self {
            phase,
            resources,
            skip: false,
        }
    }

    pub fn skipped(phase: Phase) -> Self {
        Self {
            phase,
            resources: Vec::new(),
            skip: true,
        }
    }
}

/// Applies phases against a cluster
pub struct PhaseApplier<'a> {
    cluster: &'a dyn ClusterClient,
    manifests: &'a dyn ManifestSource,
    cancel: &'a CancellationToken,
}

impl<'a> PhaseApplier<'a> {
    pub fn new(
        cluster: &'a dyn ClusterClient,
        manifests: &'a dyn ManifestSource,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            cluster,
            manifests,
            cancel,
        }
    }

    /// Apply every resource of `spec`, recording outcomes into `into`
    ///
    /// On error, `into` holds the outcomes recorded so far, including the
    /// `Failed` entry of the resource that stopped the phase. Resources after
    /// it are neither applied nor recorded.
    pub async fn apply(&self, spec: &PhaseSpec, into: &mut PhaseResult) -> Result<(), InstallError> {
        if spec.skip {
            debug!(phase = %spec.phase, "Phase skipped");
            return Ok(());
        }

        info!(
            phase = %spec.phase,
            resources = spec.resources.len(),
            "Applying phase"
        );

        for name in &spec.resources {
            if self.cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }

            let manifest = match self.manifests.manifest(spec.phase, name) {
                Ok(manifest) => manifest,
                Err(source) => {
                    into.record(name.as_str(), Status::Failed);
                    return Err(InstallError::InvalidManifest {
                        phase: spec.phase,
                        resource: name.clone(),
                        source,
                    });
                }
            };

            if manifest.is_empty() {
                debug!(phase = %spec.phase, resource = %name, "Empty manifest, skipping");
                into.record(name.as_str(), Status::Skipped);
                continue;
            }

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(InstallError::Cancelled),
                outcome = self.cluster.apply_resource(&manifest) => outcome,
            };

            match outcome {
                Ok(()) => {
                    debug!(phase = %spec.phase, resource = %name, "Installed");
                    into.record(name.as_str(), Status::Installed);
                }
                Err(ApplyError::AlreadyExists) => {
                    debug!(phase = %spec.phase, resource = %name, "Already present");
                    into.record(name.as_str(), Status::AlreadyPresent);
                }
                Err(ApplyError::Cluster(source)) => {
                    warn!(
                        phase = %spec.phase,
                        resource = %name,
                        error = %source,
                        "Apply failed, stopping phase"
                    );
                    into.record(name.as_str(), Status::Failed);
                    return Err(InstallError::ApplyFailed {
                        phase: spec.phase,
                        resource: name.clone(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}
