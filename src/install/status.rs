//! Per-resource outcomes and installation phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered installation stage
///
/// Phases always run in the order of [`Phase::ALL`]: resource definitions must
/// exist before anything references them, and the operator reconciles the
/// infrastructure once it is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    ResourceDefinitions,
    Templates,
    Operator,
    Infrastructure,
}

impl Phase {
    /// All phases in installation order
    pub const ALL: [Phase; 4] = [
        Phase::ResourceDefinitions,
        Phase::Templates,
        Phase::Operator,
        Phase::Infrastructure,
    ];

    /// Human-readable component name used in tables
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::ResourceDefinitions => "Custom Resource Definitions",
            Phase::Templates => "Templates",
            Phase::Operator => "Operator",
            Phase::Infrastructure => "Infrastructure",
        }
    }

    /// Directory holding this phase's manifests inside a manifest tree
    pub fn dir_name(self) -> &'static str {
        match self {
            Phase::ResourceDefinitions => "crds",
            Phase::Templates => "templates",
            Phase::Operator => "operator",
            Phase::Infrastructure => "infrastructure",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Outcome of applying one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The cluster accepted the resource
    Installed,
    /// The resource existed before this run; counts as success
    AlreadyPresent,
    /// The manifest had no content, nothing was sent to the cluster
    Skipped,
    /// The cluster rejected the resource for a reason other than pre-existence
    Failed,
}

impl Status {
    /// Whether the resource is on the cluster after this outcome
    pub fn is_applied(self) -> bool {
        match self {
            Status::Installed | Status::AlreadyPresent => true,
            Status::Skipped | Status::Failed => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Installed => "Installed",
            Status::AlreadyPresent => "AlreadyPresent",
            Status::Skipped => "Skipped",
            Status::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Recorded outcome for a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub name: String,
    pub status: Status,
}

impl ResourceStatus {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Counts of each status within a phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub installed: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ordered, append-only outcomes for one phase
///
/// Entries appear in manifest application order and are never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseResult {
    entries: Vec<ResourceStatus>,
}

impl PhaseResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for the next resource
    pub fn record(&mut self, name: impl Into<String>, status: Status) {
        self.entries.push(ResourceStatus::new(name, status));
    }

    pub fn entries(&self) -> &[ResourceStatus] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the recorded status of a resource by name
    pub fn status_of(&self, name: &str) -> Option<Status> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.status)
    }

    /// Number of entries with the given status
    pub fn count(&self, status: Status) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn summary(&self) -> PhaseSummary {
        let mut summary = PhaseSummary::default();
        for entry in &self.entries {
            match entry.status {
                Status::Installed => summary.installed += 1,
                Status::AlreadyPresent => summary.already_present += 1,
                Status::Skipped => summary.skipped += 1,
                Status::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Names of resources that ended up on the cluster
    pub fn applied_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status.is_applied())
            .map(|e| e.name.as_str())
    }
}

impl<'a> IntoIterator for &'a PhaseResult {
    type Item = &'a ResourceStatus;
    type IntoIter = std::slice::Iter<'a, ResourceStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(
            Phase::ALL,
            [
                Phase::ResourceDefinitions,
                Phase::Templates,
                Phase::Operator,
                Phase::Infrastructure
            ]
        );
    }

    #[test]
    fn test_record_preserves_order() {
        let mut result = PhaseResult::new();
        result.record("b.yaml", Status::Installed);
        result.record("a.yaml", Status::AlreadyPresent);

        let names: Vec<&str> = result.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.yaml", "a.yaml"]);
        assert_eq!(result.status_of("a.yaml"), Some(Status::AlreadyPresent));
        assert_eq!(result.status_of("missing.yaml"), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut result = PhaseResult::new();
        result.record("a", Status::Installed);
        result.record("b", Status::Installed);
        result.record("c", Status::AlreadyPresent);
        result.record("d", Status::Skipped);
        result.record("e", Status::Failed);

        let summary = result.summary();
        assert_eq!(summary.installed, 2);
        assert_eq!(summary.already_present, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(result.count(Status::Installed), 2);
    }

    #[test]
    fn test_applied_names_excludes_skipped_and_failed() {
        let mut result = PhaseResult::new();
        result.record("a", Status::Installed);
        result.record("b", Status::Skipped);
        result.record("c", Status::AlreadyPresent);
        result.record("d", Status::Failed);

        let applied: Vec<&str> = result.applied_names().collect();
        assert_eq!(applied, vec!["a", "c"]);
    }

    #[test]
    fn test_status_serializes_as_variant_name() {
        let json = serde_json::to_string(&ResourceStatus::new("x", Status::AlreadyPresent)).unwrap();
        assert_eq!(json, r#"{"name":"x","status":"AlreadyPresent"}"#);
    }
}
