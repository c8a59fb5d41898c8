//! Installation errors

use std::time::Duration;

use thiserror::Error;

use super::cluster::ClusterError;
use super::result::InstallationResult;
use super::status::Phase;
use crate::manifests::ManifestError;

/// Errors that stop an installation run
///
/// Pre-existing resources are never reported here; they are recorded as
/// `Status::AlreadyPresent`.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Preflight failed, nothing was applied
    #[error("cluster is not reachable: {0}")]
    ClusterUnreachable(#[source] ClusterError),

    /// The cluster rejected a resource
    #[error("failed to apply {resource} in phase {phase}: {source}")]
    ApplyFailed {
        phase: Phase,
        resource: String,
        #[source]
        source: ClusterError,
    },

    /// A manifest could not be loaded
    #[error("invalid manifest {resource} in phase {phase}: {source}")]
    InvalidManifest {
        phase: Phase,
        resource: String,
        #[source]
        source: ManifestError,
    },

    /// The manifests of a phase could not be listed
    #[error("failed to list manifests for phase {phase}: {source}")]
    Manifests {
        phase: Phase,
        #[source]
        source: ManifestError,
    },

    /// Resources did not become ready before the deadline
    #[error("timed out after {timeout:?} waiting for {phase} to become ready (pending: {})", .pending.join(", "))]
    Timeout {
        phase: Phase,
        timeout: Duration,
        pending: Vec<String>,
    },

    /// Polling readiness failed
    #[error("cluster error while waiting for {phase}: {source}")]
    Cluster {
        phase: Phase,
        #[source]
        source: ClusterError,
    },

    /// The run was cancelled
    #[error("installation cancelled")]
    Cancelled,
}

impl InstallError {
    /// Phase the error occurred in, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            InstallError::ApplyFailed { phase, .. }
            | InstallError::InvalidManifest { phase, .. }
            | InstallError::Manifests { phase, .. }
            | InstallError::Timeout { phase, .. }
            | InstallError::Cluster { phase, .. } => Some(*phase),
            InstallError::ClusterUnreachable(_) | InstallError::Cancelled => None,
        }
    }

    /// Resource the error is attributed to, if any
    pub fn resource(&self) -> Option<&str> {
        match self {
            InstallError::ApplyFailed { resource, .. }
            | InstallError::InvalidManifest { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            InstallError::ClusterUnreachable(_) => "ClusterUnreachable",
            InstallError::ApplyFailed { .. } => "ApplyFailed",
            InstallError::InvalidManifest { .. } => "InvalidManifest",
            InstallError::Manifests { .. } => "Manifests",
            InstallError::Timeout { .. } => "Timeout",
            InstallError::Cluster { .. } => "ClusterError",
            InstallError::Cancelled => "Cancelled",
        }
    }
}

/// A failed run together with everything recorded before the failure
#[derive(Debug, Error)]
#[error("{error}")]
pub struct InstallFailure {
    pub result: InstallationResult,
    #[source]
    pub error: InstallError,
}

impl InstallFailure {
    pub fn new(result: InstallationResult, error: InstallError) -> Self {
        Self { result, error }
    }

    pub fn into_parts(self) -> (InstallationResult, InstallError) {
        (self.result, self.error)
    }
}
