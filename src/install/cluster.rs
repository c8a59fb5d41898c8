//! Cluster client seam used by the installer
//!
//! The installer only needs three things from a cluster: a reachability check,
//! create-style application of a manifest, and a readiness read. Production
//! code uses [`crate::kube::KubeCluster`]; tests substitute a mock or an
//! in-memory fake.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::manifests::Manifest;

/// Failure talking to the cluster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// The API server could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// The API server answered with an error
    #[error("kubernetes api error ({code}): {message}")]
    Api { code: u16, message: String },

    /// The manifest's kind is not served by the cluster
    #[error("unknown resource type {api_version}/{kind}")]
    UnknownKind { api_version: String, kind: String },

    /// The manifest could not be sent as-is
    #[error("malformed manifest: {0}")]
    Malformed(String),
}

/// Outcome of a failed apply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// A resource with the same identity is already on the cluster
    #[error("resource already exists")]
    AlreadyExists,

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Readiness reported for an applied resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyState {
    Ready,
    NotReady { reason: String },
    NotFound,
}

impl ReadyState {
    pub fn not_ready(reason: impl Into<String>) -> Self {
        ReadyState::NotReady {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ReadyState::Ready)
    }
}

/// Operations the installer performs against a cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Check that the API server answers
    async fn is_reachable(&self) -> Result<(), ClusterError>;

    /// Create the resource described by `manifest`
    ///
    /// Returns [`ApplyError::AlreadyExists`] when the resource is already
    /// present; existing resources are left untouched.
    async fn apply_resource(&self, manifest: &Manifest) -> Result<(), ApplyError>;

    /// Read the readiness of the resource described by `manifest`
    async fn resource_status(&self, manifest: &Manifest) -> Result<ReadyState, ClusterError>;
}
