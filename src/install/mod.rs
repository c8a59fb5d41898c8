//! Installation core
//!
//! Installs the platform in four ordered phases:
//!
//! 1. Custom resource definitions
//! 2. Templates
//! 3. Operator
//! 4. Infrastructure
//!
//! The [`Orchestrator`] checks reachability, then hands each non-skipped phase
//! to the [`PhaseApplier`] and, when waiting is requested, the
//! [`ReadinessWaiter`]. Outcomes land in an [`InstallationResult`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swctl::install::{Orchestrator, OrchestratorConfig};
//! use swctl::kube::KubeCluster;
//! use swctl::manifests::DirectoryManifestSource;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = swctl::kube::create_client().await?;
//! let cluster = Arc::new(KubeCluster::new(client, "sitewhere-system"));
//! let manifests = Arc::new(DirectoryManifestSource::new("./manifests"));
//!
//! let config = OrchestratorConfig {
//!     wait_for_ready: true,
//!     ..Default::default()
//! };
//! match Orchestrator::new(config, cluster, manifests).run().await {
//!     Ok(result) => println!("{} resources recorded", result.total()),
//!     Err(failure) => eprintln!("stopped: {}", failure.error),
//! }
//! # Ok(())
//! # }
//! ```

mod applier;
mod cluster;
mod error;
mod orchestrator;
mod readiness;
mod result;
mod status;

pub use applier::{PhaseApplier, PhaseSpec};
pub use cluster::{ApplyError, ClusterClient, ClusterError, ReadyState};
pub use error::{InstallError, InstallFailure};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use readiness::{MIN_POLL_INTERVAL, PollPolicy, ReadinessWaiter};
pub use result::InstallationResult;
pub use status::{Phase, PhaseResult, PhaseSummary, ResourceStatus, Status};
