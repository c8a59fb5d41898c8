//! Resource descriptor sets
//!
//! A [`ManifestSource`] supplies the ordered manifest names for each phase and
//! the manifest content behind each name. Content is opaque to the installer
//! apart from the identifying fields the cluster client needs.

mod directory;
mod memory;

pub use directory::DirectoryManifestSource;
pub use memory::StaticManifestSource;

use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::install::Phase;

/// Errors produced while listing or loading manifests
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {name}: {message}")]
    Parse { name: String, message: String },

    #[error("manifest {name} not found in phase {phase}")]
    NotFound { phase: Phase, name: String },
}

/// Supplies manifests for each installation phase
pub trait ManifestSource: Send + Sync {
    /// Ordered resource names for a phase
    fn list_resource_names(&self, phase: Phase) -> Result<Vec<String>, ManifestError>;

    /// Load the manifest registered under `name` in `phase`
    fn manifest(&self, phase: Phase, name: &str) -> Result<Manifest, ManifestError>;
}

/// Whether a document holds only whitespace, comments and separators
fn is_blank_document(yaml: &str) -> bool {
    yaml.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Parse every non-empty document of a YAML stream
fn parse_documents(name: &str, yaml: &str) -> Result<Vec<Value>, ManifestError> {
    if is_blank_document(yaml) {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = Value::deserialize(document).map_err(|e| ManifestError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        // Separators and comment-only documents
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Check that a document identifies a resource
fn check_identity(name: &str, object: &Value) -> Result<(), ManifestError> {
    let parse_error = |message: String| ManifestError::Parse {
        name: name.to_string(),
        message,
    };

    if !object.is_object() {
        return Err(parse_error(
            "expected a mapping at the document root".to_string(),
        ));
    }
    for field in ["apiVersion", "kind"] {
        if object.get(field).and_then(Value::as_str).is_none() {
            return Err(parse_error(format!("missing {}", field)));
        }
    }
    if object.pointer("/metadata/name").and_then(Value::as_str).is_none() {
        return Err(parse_error("missing metadata.name".to_string()));
    }
    Ok(())
}

/// A single declarative resource definition
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Name the descriptor set registers this manifest under
    pub name: String,
    /// Parsed object, `Value::Null` for an empty document
    pub object: Value,
}

impl Manifest {
    pub fn new(name: impl Into<String>, object: Value) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }

    /// Parse a YAML file holding exactly one resource
    ///
    /// Empty documents and separators are ignored, so a trailing `---` is
    /// fine. A file without any resource yields an empty manifest. A file with
    /// several resources is rejected; see [`Manifest::split_yaml`].
    pub fn from_yaml(name: impl Into<String>, yaml: &str) -> Result<Self, ManifestError> {
        let name = name.into();
        let mut manifests = Self::split_yaml(name.as_str(), yaml)?;
        if manifests.len() > 1 {
            return Err(ManifestError::Parse {
                message: format!(
                    "expected a single resource, found {} documents",
                    manifests.len()
                ),
                name,
            });
        }
        Ok(manifests.remove(0))
    }

    /// Parse a YAML file into one manifest per resource
    ///
    /// A file with at most one resource keeps `name`. Files with several
    /// resources yield `name#1`, `name#2`, ... in document order.
    pub fn split_yaml(name: impl Into<String>, yaml: &str) -> Result<Vec<Self>, ManifestError> {
        let name = name.into();
        let mut documents = parse_documents(&name, yaml)?;

        match documents.len() {
            0 => Ok(vec![Self::new(name, Value::Null)]),
            1 => {
                let object = documents.remove(0);
                check_identity(&name, &object)?;
                Ok(vec![Self::new(name, object)])
            }
            _ => documents
                .into_iter()
                .enumerate()
                .map(|(i, object)| {
                    let name = format!("{}#{}", name, i + 1);
                    check_identity(&name, &object)?;
                    Ok(Self::new(name, object))
                })
                .collect(),
        }
    }

    /// Whether the document carried no resource
    pub fn is_empty(&self) -> bool {
        self.object.is_null()
    }

    pub fn kind(&self) -> Option<&str> {
        self.object.get("kind").and_then(Value::as_str)
    }

    pub fn api_version(&self) -> Option<&str> {
        self.object.get("apiVersion").and_then(Value::as_str)
    }

    /// `metadata.name` of the resource itself
    pub fn resource_name(&self) -> Option<&str> {
        self.object.pointer("/metadata/name").and_then(Value::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.object
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
    }
}
