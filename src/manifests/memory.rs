//! In-memory descriptor set

use std::collections::HashMap;

use super::{Manifest, ManifestError, ManifestSource};
use crate::install::Phase;

/// Manifests held in memory, in insertion order per phase
#[derive(Debug, Clone, Default)]
pub struct StaticManifestSource {
    phases: HashMap<Phase, Vec<Manifest>>,
}

impl StaticManifestSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a manifest to a phase
    pub fn with_manifest(mut self, phase: Phase, manifest: Manifest) -> Self {
        self.phases.entry(phase).or_default().push(manifest);
        self
    }

    /// Append the manifests parsed from a YAML file
    ///
    /// Multi-document files register one manifest per resource, named as
    /// [`Manifest::split_yaml`] names them.
    pub fn with_yaml(
        self,
        phase: Phase,
        name: &str,
        yaml: &str,
    ) -> Result<Self, ManifestError> {
        let manifests = Manifest::split_yaml(name, yaml)?;
        Ok(manifests
            .into_iter()
            .fold(self, |source, manifest| source.with_manifest(phase, manifest)))
    }
}

impl ManifestSource for StaticManifestSource {
    fn list_resource_names(&self, phase: Phase) -> Result<Vec<String>, ManifestError> {
        Ok(self
            .phases
            .get(&phase)
            .map(|manifests| manifests.iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default())
    }

    fn manifest(&self, phase: Phase, name: &str) -> Result<Manifest, ManifestError> {
        self.phases
            .get(&phase)
            .and_then(|manifests| manifests.iter().find(|m| m.name == name))
            .cloned()
            .ok_or_else(|| ManifestError::NotFound {
                phase,
                name: name.to_string(),
            })
    }
}
