//! Installation result aggregate
//!
//! One `InstallationResult` is owned by a single orchestration run. It starts
//! empty, is filled phase by phase, and is handed back to the caller either
//! complete or, on failure, partially populated next to the error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{Phase, PhaseResult, PhaseSummary, Status};

/// Aggregate outcome of an installation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationResult {
    pub skip_resource_definitions: bool,
    pub skip_templates: bool,
    pub skip_operator: bool,
    pub skip_infrastructure: bool,

    pub resource_definitions: PhaseResult,
    pub templates: PhaseResult,
    pub operator: PhaseResult,
    pub infrastructure: PhaseResult,

    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl InstallationResult {
    /// Create an empty result, stamped with the current time
    pub fn new() -> Self {
        Self {
            skip_resource_definitions: false,
            skip_templates: false,
            skip_operator: false,
            skip_infrastructure: false,
            resource_definitions: PhaseResult::new(),
            templates: PhaseResult::new(),
            operator: PhaseResult::new(),
            infrastructure: PhaseResult::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn phase(&self, phase: Phase) -> &PhaseResult {
        match phase {
            Phase::ResourceDefinitions => &self.resource_definitions,
            Phase::Templates => &self.templates,
            Phase::Operator => &self.operator,
            Phase::Infrastructure => &self.infrastructure,
        }
    }

    pub(crate) fn phase_mut(&mut self, phase: Phase) -> &mut PhaseResult {
        match phase {
            Phase::ResourceDefinitions => &mut self.resource_definitions,
            Phase::Templates => &mut self.templates,
            Phase::Operator => &mut self.operator,
            Phase::Infrastructure => &mut self.infrastructure,
        }
    }

    pub fn is_skipped(&self, phase: Phase) -> bool {
        match phase {
            Phase::ResourceDefinitions => self.skip_resource_definitions,
            Phase::Templates => self.skip_templates,
            Phase::Operator => self.skip_operator,
            Phase::Infrastructure => self.skip_infrastructure,
        }
    }

    pub(crate) fn mark_skipped(&mut self, phase: Phase, skipped: bool) {
        match phase {
            Phase::ResourceDefinitions => self.skip_resource_definitions = skipped,
            Phase::Templates => self.skip_templates = skipped,
            Phase::Operator => self.skip_operator = skipped,
            Phase::Infrastructure => self.skip_infrastructure = skipped,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Iterate phases in installation order with their results
    pub fn phases(&self) -> impl Iterator<Item = (Phase, &PhaseResult)> {
        Phase::ALL.into_iter().map(move |p| (p, self.phase(p)))
    }

    /// Total number of recorded outcomes across all phases
    pub fn total(&self) -> usize {
        self.phases().map(|(_, r)| r.len()).sum()
    }

    /// Number of outcomes with the given status across all phases
    pub fn count(&self, status: Status) -> usize {
        self.phases().map(|(_, r)| r.count(status)).sum()
    }

    pub fn summary(&self, phase: Phase) -> PhaseSummary {
        self.phase(phase).summary()
    }

    pub fn has_failures(&self) -> bool {
        self.count(Status::Failed) > 0
    }
}

impl Default for InstallationResult {
    fn default() -> Self {
        Self::new()
    }
}
