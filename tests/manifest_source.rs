//! Directory manifest source tests
//!
//! Builds manifest trees in temporary directories and reads them back the way
//! `swctl install --manifests <DIR>` does.

use std::fs;
use std::path::Path;

use swctl::install::Phase;
use swctl::manifests::{DirectoryManifestSource, ManifestError, ManifestSource};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn config_map(name: &str) -> String {
    format!("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {}\n", name)
}

#[test]
fn test_names_are_sorted_by_file_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "templates/20-tenant.yaml", &config_map("tenant"));
    write(dir.path(), "templates/00-namespace.yml", &config_map("namespace"));
    write(dir.path(), "templates/10-instance.yaml", &config_map("instance"));

    let source = DirectoryManifestSource::new(dir.path());
    let names = source.list_resource_names(Phase::Templates).unwrap();

    assert_eq!(
        names,
        vec!["00-namespace.yml", "10-instance.yaml", "20-tenant.yaml"]
    );
}

#[test]
fn test_non_manifest_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "operator/operator.yaml", &config_map("operator"));
    write(dir.path(), "operator/README.md", "# Operator manifests\n");
    fs::create_dir_all(dir.path().join("operator/nested.yaml")).unwrap();

    let source = DirectoryManifestSource::new(dir.path());
    let names = source.list_resource_names(Phase::Operator).unwrap();

    assert_eq!(names, vec!["operator.yaml"]);
}

#[test]
fn test_missing_phase_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "crds/instances.yaml", &config_map("instances"));

    let source = DirectoryManifestSource::new(dir.path());

    assert_eq!(
        source.list_resource_names(Phase::ResourceDefinitions).unwrap().len(),
        1
    );
    assert!(source
        .list_resource_names(Phase::Infrastructure)
        .unwrap()
        .is_empty());
}

#[test]
fn test_manifest_content_is_parsed() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "infrastructure/mosquitto.yaml",
        "apiVersion: apps/v1\nkind: StatefulSet\nmetadata:\n  name: mosquitto\n  namespace: sitewhere-system\n",
    );

    let source = DirectoryManifestSource::new(dir.path());
    let manifest = source
        .manifest(Phase::Infrastructure, "mosquitto.yaml")
        .unwrap();

    assert_eq!(manifest.name, "mosquitto.yaml");
    assert_eq!(manifest.kind(), Some("StatefulSet"));
    assert_eq!(manifest.api_version(), Some("apps/v1"));
    assert_eq!(manifest.resource_name(), Some("mosquitto"));
    assert_eq!(manifest.namespace(), Some("sitewhere-system"));
}

#[test]
fn test_comment_only_manifest_is_empty() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "templates/placeholder.yaml", "# nothing to apply yet\n");

    let source = DirectoryManifestSource::new(dir.path());
    let manifest = source.manifest(Phase::Templates, "placeholder.yaml").unwrap();

    assert!(manifest.is_empty());
}

#[test]
fn test_unknown_manifest_is_not_found() {
    let dir = TempDir::new().unwrap();
    let source = DirectoryManifestSource::new(dir.path());

    let err = source.manifest(Phase::Operator, "operator.yaml").unwrap_err();
    assert!(matches!(
        err,
        ManifestError::NotFound {
            phase: Phase::Operator,
            ..
        }
    ));
}

#[test]
fn test_manifest_without_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "crds/broken.yaml",
        "apiVersion: v1\nmetadata:\n  name: broken\n",
    );

    let source = DirectoryManifestSource::new(dir.path());
    let err = source
        .manifest(Phase::ResourceDefinitions, "broken.yaml")
        .unwrap_err();

    match err {
        ManifestError::Parse { name, message } => {
            assert_eq!(name, "broken.yaml");
            assert!(message.contains("kind"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_trailing_separator_keeps_file_name() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "templates/default.yaml",
        &format!("{}---\n", config_map("default")),
    );

    let source = DirectoryManifestSource::new(dir.path());
    let names = source.list_resource_names(Phase::Templates).unwrap();
    assert_eq!(names, vec!["default.yaml"]);

    let manifest = source.manifest(Phase::Templates, "default.yaml").unwrap();
    assert_eq!(manifest.resource_name(), Some("default"));
}

#[test]
fn test_multi_document_file_lists_each_resource() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "infrastructure/mosquitto.yaml",
        "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: mosquitto\n---\napiVersion: v1\nkind: Service\nmetadata:\n  name: mosquitto\n---\n",
    );
    write(dir.path(), "infrastructure/redis.yaml", &config_map("redis"));

    let source = DirectoryManifestSource::new(dir.path());
    let names = source.list_resource_names(Phase::Infrastructure).unwrap();
    assert_eq!(
        names,
        vec!["mosquitto.yaml#1", "mosquitto.yaml#2", "redis.yaml"]
    );

    let service = source
        .manifest(Phase::Infrastructure, "mosquitto.yaml#2")
        .unwrap();
    assert_eq!(service.name, "mosquitto.yaml#2");
    assert_eq!(service.kind(), Some("Service"));

    assert!(matches!(
        source.manifest(Phase::Infrastructure, "mosquitto.yaml#3"),
        Err(ManifestError::NotFound { .. })
    ));
}

#[test]
fn test_unparseable_file_is_still_listed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "operator/broken.yaml", "kind: [unclosed\n");

    let source = DirectoryManifestSource::new(dir.path());
    assert_eq!(
        source.list_resource_names(Phase::Operator).unwrap(),
        vec!["broken.yaml"]
    );
    assert!(matches!(
        source.manifest(Phase::Operator, "broken.yaml"),
        Err(ManifestError::Parse { .. })
    ));
}
