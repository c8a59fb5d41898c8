//! Cluster client backed by kube-rs
//!
//! Manifests are created with `POST` semantics so an existing object surfaces
//! as HTTP 409 and is reported as already present instead of being modified.
//! Kinds are resolved per group/version through API discovery, which also picks
//! up CRDs installed earlier in the same run. A group that is not yet served
//! is retried with backoff while its CRD becomes established.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, GroupVersionKind, PostParams};
use kube::discovery::{self, ApiResource, Scope};
use kube::Client;

use super::readiness::evaluate_readiness;
use super::retry::{RetryConfig, retry_while};
use crate::install::{ApplyError, ClusterClient, ClusterError, ReadyState};
use crate::manifests::Manifest;

/// Field manager recorded on created objects
pub const FIELD_MANAGER: &str = "swctl";

/// [`ClusterClient`] talking to a live API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    default_namespace: String,
    discovery_retry: RetryConfig,
}

impl KubeCluster {
    /// Wrap a client; namespaced manifests without a namespace go to
    /// `default_namespace`
    pub fn new(client: Client, default_namespace: impl Into<String>) -> Self {
        Self {
            client,
            default_namespace: default_namespace.into(),
            discovery_retry: RetryConfig::default(),
        }
    }

    /// Resolve the API endpoint and object name for a manifest
    async fn resolve(&self, manifest: &Manifest) -> Result<(Api<DynamicObject>, Scope), ClusterError> {
        let gvk = manifest_gvk(manifest)?;

        let (resource, capabilities) = retry_while(
            &self.discovery_retry,
            "discovery",
            is_unknown_kind,
            || self.discover(manifest, &gvk),
        )
        .await?;

        let api = self.api_for(&resource, &capabilities.scope, manifest.namespace());
        Ok((api, capabilities.scope))
    }

    async fn discover(
        &self,
        manifest: &Manifest,
        gvk: &GroupVersionKind,
    ) -> Result<(ApiResource, discovery::ApiCapabilities), ClusterError> {
        discovery::pinned_kind(&self.client, gvk)
            .await
            .map_err(|e| match e {
                kube::Error::Api(ae) if ae.code == 404 => unknown_kind(manifest, gvk),
                kube::Error::Discovery(_) => unknown_kind(manifest, gvk),
                other => map_kube_error(other),
            })
    }

    fn api_for(
        &self,
        resource: &ApiResource,
        scope: &Scope,
        namespace: Option<&str>,
    ) -> Api<DynamicObject> {
        match scope {
            Scope::Namespaced => Api::namespaced_with(
                self.client.clone(),
                namespace.unwrap_or(&self.default_namespace),
                resource,
            ),
            Scope::Cluster => Api::all_with(self.client.clone(), resource),
        }
    }
}

/// Parse the group/version/kind out of a manifest
fn manifest_gvk(manifest: &Manifest) -> Result<GroupVersionKind, ClusterError> {
    let kind = manifest
        .kind()
        .ok_or_else(|| ClusterError::Malformed(format!("{}: missing kind", manifest.name)))?;
    let api_version = manifest
        .api_version()
        .ok_or_else(|| ClusterError::Malformed(format!("{}: missing apiVersion", manifest.name)))?;

    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    Ok(GroupVersionKind::gvk(group, version, kind))
}

fn unknown_kind(manifest: &Manifest, gvk: &GroupVersionKind) -> ClusterError {
    ClusterError::UnknownKind {
        api_version: manifest.api_version().unwrap_or_default().to_string(),
        kind: gvk.kind.clone(),
    }
}

fn is_unknown_kind(err: &ClusterError) -> bool {
    matches!(err, ClusterError::UnknownKind { .. })
}

fn resource_name(manifest: &Manifest) -> Result<&str, ClusterError> {
    manifest
        .resource_name()
        .ok_or_else(|| ClusterError::Malformed(format!("{}: missing metadata.name", manifest.name)))
}

fn map_kube_error(err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(ae) => ClusterError::Api {
            code: ae.code,
            message: ae.message.clone(),
        },
        other => ClusterError::Connection(other.to_string()),
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn is_reachable(&self) -> Result<(), ClusterError> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| ClusterError::Connection(e.to_string()))?;
        tracing::debug!(
            "Connected to API server {}.{} ({})",
            version.major,
            version.minor,
            version.git_version
        );
        Ok(())
    }

    async fn apply_resource(&self, manifest: &Manifest) -> Result<(), ApplyError> {
        let (api, scope) = self.resolve(manifest).await?;
        let name = resource_name(manifest)?;

        let mut object: DynamicObject = serde_json::from_value(manifest.object.clone())
            .map_err(|e| ClusterError::Malformed(format!("{}: {}", manifest.name, e)))?;
        if matches!(scope, Scope::Namespaced) && object.metadata.namespace.is_none() {
            object.metadata.namespace = Some(self.default_namespace.clone());
        }

        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match api.create(&params, &object).await {
            Ok(_) => {
                tracing::debug!(kind = ?manifest.kind(), name = %name, "Created resource");
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(ApplyError::AlreadyExists),
            Err(e) => Err(ApplyError::Cluster(map_kube_error(e))),
        }
    }

    async fn resource_status(&self, manifest: &Manifest) -> Result<ReadyState, ClusterError> {
        let (api, _) = self.resolve(manifest).await?;
        let name = resource_name(manifest)?;
        let kind = manifest.kind().unwrap_or_default();

        match api.get_opt(name).await.map_err(map_kube_error)? {
            Some(object) => {
                let value = serde_json::to_value(&object)
                    .map_err(|e| ClusterError::Malformed(format!("{}: {}", manifest.name, e)))?;
                Ok(evaluate_readiness(kind, &value))
            }
            None => Ok(ReadyState::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_gvk_core_group() {
        let manifest = Manifest::new(
            "ns.yaml",
            json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": "sitewhere-system"}}),
        );
        let gvk = manifest_gvk(&manifest).unwrap();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Namespace");
    }

    #[test]
    fn test_manifest_gvk_named_group() {
        let manifest = Manifest::new(
            "instance-crd.yaml",
            json!({
                "apiVersion": "apiextensions.k8s.io/v1",
                "kind": "CustomResourceDefinition",
                "metadata": {"name": "instances.sitewhere.io"}
            }),
        );
        let gvk = manifest_gvk(&manifest).unwrap();
        assert_eq!(gvk.group, "apiextensions.k8s.io");
        assert_eq!(gvk.version, "v1");
    }

    #[test]
    fn test_only_unknown_kinds_are_retried() {
        assert!(is_unknown_kind(&ClusterError::UnknownKind {
            api_version: "sitewhere.io/v1alpha4".to_string(),
            kind: "SiteWhereInstance".to_string(),
        }));
        assert!(!is_unknown_kind(&ClusterError::Api {
            code: 403,
            message: "forbidden".to_string(),
        }));
        assert!(!is_unknown_kind(&ClusterError::Connection(
            "connection refused".to_string()
        )));
    }

    #[test]
    fn test_manifest_without_kind_is_malformed() {
        let manifest = Manifest::new("bad.yaml", json!({"apiVersion": "v1"}));
        assert!(matches!(
            manifest_gvk(&manifest),
            Err(ClusterError::Malformed(_))
        ));
    }
}
