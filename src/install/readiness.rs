//! Readiness waiter
//!
//! Polls the cluster until every resource applied in a phase reports ready, the
//! deadline passes, or the run is cancelled. The waiter never mutates cluster
//! state.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::applier::PhaseSpec;
use super::cluster::{ClusterClient, ReadyState};
use super::error::InstallError;
use super::status::PhaseResult;
use crate::manifests::{Manifest, ManifestSource};

/// Shortest delay between two poll rounds
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interval policy for readiness polling
///
/// The first poll happens immediately. Later polls wait `interval`, growing by
/// `backoff_multiplier` after each round up to `max_interval`. Delays never
/// drop below [`MIN_POLL_INTERVAL`], and a wait never sleeps past the deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub backoff_multiplier: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(15),
            backoff_multiplier: 1.5,
        }
    }
}

impl PollPolicy {
    /// Constant interval, no backoff
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before the second poll round
    pub fn initial_delay(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    /// Delay to use after `current`
    pub fn next_delay(&self, current: Duration) -> Duration {
        let multiplier = self.backoff_multiplier.max(1.0);
        let next = current.as_secs_f64() * multiplier;
        Duration::from_secs_f64(next.min(self.max_interval.as_secs_f64())).max(MIN_POLL_INTERVAL)
    }
}

/// Waits for applied resources to become ready
pub struct ReadinessWaiter<'a> {
    cluster: &'a dyn ClusterClient,
    manifests: &'a dyn ManifestSource,
    cancel: &'a CancellationToken,
    policy: PollPolicy,
}

impl<'a> ReadinessWaiter<'a> {
    pub fn new(
        cluster: &'a dyn ClusterClient,
        manifests: &'a dyn ManifestSource,
        cancel: &'a CancellationToken,
        policy: PollPolicy,
    ) -> Self {
        Self {
            cluster,
            manifests,
            cancel,
            policy,
        }
    }

    /// Block until the resources `applied` recorded for `spec` are ready
    ///
    /// Only `Installed` and `AlreadyPresent` entries are polled.
    pub async fn wait(
        &self,
        spec: &PhaseSpec,
        applied: &PhaseResult,
        timeout: Duration,
    ) -> Result<(), InstallError> {
        if spec.skip {
            return Ok(());
        }

        let mut pending: Vec<Manifest> = Vec::new();
        for name in applied.applied_names() {
            let manifest = self.manifests.manifest(spec.phase, name).map_err(|source| {
                InstallError::InvalidManifest {
                    phase: spec.phase,
                    resource: name.to_string(),
                    source,
                }
            })?;
            pending.push(manifest);
        }

        if pending.is_empty() {
            return Ok(());
        }

        info!(
            phase = %spec.phase,
            resources = pending.len(),
            timeout_secs = timeout.as_secs(),
            "Waiting for phase to become ready"
        );

        let deadline = Instant::now() + timeout;
        let mut delay = self.policy.initial_delay();

        loop {
            let mut still_pending = Vec::with_capacity(pending.len());
            for manifest in pending {
                let state = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(InstallError::Cancelled),
                    state = self.cluster.resource_status(&manifest) => state,
                };

                match state {
                    Ok(ReadyState::Ready) => {
                        debug!(phase = %spec.phase, resource = %manifest.name, "Ready");
                    }
                    Ok(ReadyState::NotReady { reason }) => {
                        debug!(phase = %spec.phase, resource = %manifest.name, reason = %reason, "Not ready");
                        still_pending.push(manifest);
                    }
                    Ok(ReadyState::NotFound) => {
                        debug!(phase = %spec.phase, resource = %manifest.name, "Not found yet");
                        still_pending.push(manifest);
                    }
                    Err(source) => {
                        return Err(InstallError::Cluster {
                            phase: spec.phase,
                            source,
                        });
                    }
                }
            }
            pending = still_pending;

            if pending.is_empty() {
                info!(phase = %spec.phase, "Phase ready");
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                let pending: Vec<String> = pending.into_iter().map(|m| m.name).collect();
                warn!(phase = %spec.phase, pending = ?pending, "Timed out waiting for readiness");
                return Err(InstallError::Timeout {
                    phase: spec.phase,
                    timeout,
                    pending,
                });
            }

            let sleep_for = delay.min(deadline - now);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(InstallError::Cancelled),
                _ = tokio::time::sleep(sleep_for) => {}
            }
            delay = self.policy.next_delay(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::cluster::{ClusterError, MockClusterClient};
    use crate::install::status::{Phase, Status};
    use crate::manifests::StaticManifestSource;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn manifests() -> StaticManifestSource {
        StaticManifestSource::new()
            .with_yaml(
                Phase::Operator,
                "operator.yaml",
                "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: sitewhere-operator\n",
            )
            .unwrap()
            .with_yaml(
                Phase::Operator,
                "rbac.yaml",
                "apiVersion: v1\nkind: ServiceAccount\nmetadata:\n  name: sitewhere-operator\n",
            )
            .unwrap()
    }

    fn applied(names: &[(&str, Status)]) -> PhaseResult {
        let mut result = PhaseResult::new();
        for (name, status) in names {
            result.record(*name, *status);
        }
        result
    }

    fn spec() -> PhaseSpec {
        PhaseSpec::new(
            Phase::Operator,
            vec!["operator.yaml".to_string(), "rbac.yaml".to_string()],
        )
    }

    #[test]
    fn test_next_delay_backs_off_to_cap() {
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.next_delay(Duration::from_secs(2)), Duration::from_secs(4));
        assert_eq!(policy.next_delay(Duration::from_secs(4)), Duration::from_secs(5));
    }

    #[test]
    fn test_fixed_policy_never_grows() {
        let policy = PollPolicy::fixed(Duration::from_millis(500));
        assert_eq!(
            policy.next_delay(Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_zero_interval_is_floored() {
        let policy = PollPolicy::fixed(Duration::ZERO);
        assert_eq!(policy.initial_delay(), MIN_POLL_INTERVAL);
        assert_eq!(policy.next_delay(Duration::ZERO), MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_spin() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let mut cluster = MockClusterClient::new();
        cluster.expect_resource_status().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ReadyState::not_ready("starting"))
        });

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(
            &cluster,
            &manifests,
            &cancel,
            PollPolicy::fixed(Duration::ZERO),
        );

        let err = waiter
            .wait(
                &spec(),
                &applied(&[("operator.yaml", Status::Installed)]),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Timeout { .. }));
        // polls at 0ms, 100ms and 200ms
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_all_ready() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let mut cluster = MockClusterClient::new();
        cluster.expect_resource_status().returning(move |manifest| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if manifest.name == "operator.yaml" && n < 2 {
                Ok(ReadyState::not_ready("0/1 replicas ready"))
            } else {
                Ok(ReadyState::Ready)
            }
        });

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());

        waiter
            .wait(
                &spec(),
                &applied(&[
                    ("operator.yaml", Status::Installed),
                    ("rbac.yaml", Status::AlreadyPresent),
                ]),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        // round 1 polls both, round 2 polls only the deployment
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_pending_names() {
        let mut cluster = MockClusterClient::new();
        cluster
            .expect_resource_status()
            .returning(|_| Ok(ReadyState::NotFound));

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());

        let err = waiter
            .wait(
                &spec(),
                &applied(&[("operator.yaml", Status::Installed)]),
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();

        match err {
            InstallError::Timeout { pending, phase, .. } => {
                assert_eq!(phase, Phase::Operator);
                assert_eq!(pending, vec!["operator.yaml".to_string()]);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_timeout_polls_once() {
        let mut cluster = MockClusterClient::new();
        cluster
            .expect_resource_status()
            .times(1)
            .returning(|_| Ok(ReadyState::not_ready("starting")));

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());

        let err = waiter
            .wait(
                &spec(),
                &applied(&[("operator.yaml", Status::Installed)]),
                Duration::ZERO,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_poll_error_is_cluster_error() {
        let mut cluster = MockClusterClient::new();
        cluster
            .expect_resource_status()
            .returning(|_| Err(ClusterError::Connection("connection reset".to_string())));

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());

        let err = waiter
            .wait(
                &spec(),
                &applied(&[("operator.yaml", Status::Installed)]),
                Duration::from_secs(30),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Cluster { .. }));
    }

    #[tokio::test]
    async fn test_skipped_and_failed_entries_are_not_polled() {
        let mut cluster = MockClusterClient::new();
        cluster.expect_resource_status().never();

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());

        waiter
            .wait(
                &spec(),
                &applied(&[
                    ("operator.yaml", Status::Skipped),
                    ("rbac.yaml", Status::Failed),
                ]),
                Duration::from_secs(30),
            )
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let mut cluster = MockClusterClient::new();
        cluster
            .expect_resource_status()
            .returning(|_| Ok(ReadyState::not_ready("starting")));

        let manifests = manifests();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let waiter = ReadinessWaiter::new(&cluster, &manifests, &cancel, PollPolicy::default());
        let err = waiter
            .wait(
                &spec(),
                &applied(&[("operator.yaml", Status::Installed)]),
                Duration::from_secs(600),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Cancelled));
    }
}
