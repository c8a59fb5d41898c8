//! Manifest tree on disk
//!
//! Layout:
//!
//! ```text
//! <root>/crds/*.yaml
//! <root>/templates/*.yaml
//! <root>/operator/*.yaml
//! <root>/infrastructure/*.yaml
//! ```
//!
//! Files are applied in file-name order; prefix them (`00-namespace.yaml`) to
//! control ordering. A missing phase directory means the phase has no manifests.

use std::path::{Path, PathBuf};

use super::{Manifest, ManifestError, ManifestSource};
use crate::install::Phase;

/// Reads manifests from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryManifestSource {
    root: PathBuf,
}

impl DirectoryManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn phase_dir(&self, phase: Phase) -> PathBuf {
        self.root.join(phase.dir_name())
    }
}

fn is_manifest_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
}

/// File a registered name lives in: `mosquitto.yaml#2` reads `mosquitto.yaml`
fn file_name_of(name: &str) -> &str {
    match name.rsplit_once('#') {
        Some((file, index)) if index.parse::<usize>().is_ok() => file,
        _ => name,
    }
}

impl DirectoryManifestSource {
    fn read(&self, phase: Phase, file: &str) -> Result<String, ManifestError> {
        let path = self.phase_dir(phase).join(file);
        std::fs::read_to_string(&path).map_err(|source| ManifestError::Io { path, source })
    }
}

impl ManifestSource for DirectoryManifestSource {
    fn list_resource_names(&self, phase: Phase) -> Result<Vec<String>, ManifestError> {
        let dir = self.phase_dir(phase);
        if !dir.is_dir() {
            tracing::debug!(phase = %phase, dir = %dir.display(), "No manifest directory for phase");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir).map_err(|source| ManifestError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ManifestError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !is_manifest_file(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
        files.sort();

        let mut names = Vec::with_capacity(files.len());
        for file in files {
            let contents = self.read(phase, &file)?;
            match Manifest::split_yaml(file.as_str(), &contents) {
                Ok(manifests) => names.extend(manifests.into_iter().map(|m| m.name)),
                // Listed whole so the parse error surfaces when it is applied
                Err(_) => names.push(file),
            }
        }

        Ok(names)
    }

    fn manifest(&self, phase: Phase, name: &str) -> Result<Manifest, ManifestError> {
        let file = file_name_of(name);
        if !self.phase_dir(phase).join(file).is_file() {
            return Err(ManifestError::NotFound {
                phase,
                name: name.to_string(),
            });
        }

        let contents = self.read(phase, file)?;
        if file == name {
            return Manifest::from_yaml(name, &contents);
        }

        Manifest::split_yaml(file, &contents)?
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ManifestError::NotFound {
                phase,
                name: name.to_string(),
            })
    }
}
