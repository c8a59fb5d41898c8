//! swctl library
//!
//! This library provides the installer behind the `swctl` binary. It can be
//! used both as a binary and as a library for testing against a fake cluster.

pub mod cli;
pub mod config;
pub mod install;
pub mod kube;
pub mod manifests;
pub mod output;

// Re-export commonly used types for convenience
pub use install::{
    ClusterClient, InstallError, InstallFailure, InstallationResult, Orchestrator,
    OrchestratorConfig, Phase, PhaseResult, Status,
};
pub use manifests::{DirectoryManifestSource, Manifest, ManifestSource, StaticManifestSource};
pub use output::{InstallReport, OutputFormat};
