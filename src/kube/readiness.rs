//! Readiness rules for applied objects
//!
//! Workloads are ready when their controllers report the desired replica count
//! ready for the latest generation. CRDs are ready once established. Anything
//! else follows its `Ready` condition when it has one, and is ready as soon as
//! it exists otherwise.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::runtime::wait::{Condition, conditions};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::install::ReadyState;

/// Evaluate the readiness of a live object of the given kind
pub fn evaluate_readiness(kind: &str, object: &Value) -> ReadyState {
    match kind {
        "CustomResourceDefinition" => typed::<CustomResourceDefinition>(object, crd_readiness),
        "Deployment" => typed::<Deployment>(object, deployment_readiness),
        "StatefulSet" => typed::<StatefulSet>(object, statefulset_readiness),
        "DaemonSet" => typed::<DaemonSet>(object, daemonset_readiness),
        _ => condition_readiness(object),
    }
}

fn typed<K: DeserializeOwned>(object: &Value, eval: fn(&K) -> ReadyState) -> ReadyState {
    match serde_json::from_value::<K>(object.clone()) {
        Ok(obj) => eval(&obj),
        Err(e) => ReadyState::not_ready(format!("unreadable object: {}", e)),
    }
}

fn crd_readiness(crd: &CustomResourceDefinition) -> ReadyState {
    if conditions::is_crd_established().matches_object(Some(crd)) {
        ReadyState::Ready
    } else {
        ReadyState::not_ready("not established")
    }
}

fn generation_observed(generation: Option<i64>, observed: Option<i64>) -> bool {
    match (generation, observed) {
        (Some(generation), Some(observed)) => observed >= generation,
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn replicas_readiness(
    generation: Option<i64>,
    observed: Option<i64>,
    desired: i32,
    ready: i32,
) -> ReadyState {
    if !generation_observed(generation, observed) {
        return ReadyState::not_ready("waiting for controller to observe latest generation");
    }
    if ready < desired {
        return ReadyState::not_ready(format!("{}/{} replicas ready", ready, desired));
    }
    ReadyState::Ready
}

fn deployment_readiness(deployment: &Deployment) -> ReadyState {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let status = deployment.status.as_ref();
    replicas_readiness(
        deployment.metadata.generation,
        status.and_then(|s| s.observed_generation),
        desired,
        status.and_then(|s| s.ready_replicas).unwrap_or(0),
    )
}

fn statefulset_readiness(statefulset: &StatefulSet) -> ReadyState {
    let desired = statefulset
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let status = statefulset.status.as_ref();
    replicas_readiness(
        statefulset.metadata.generation,
        status.and_then(|s| s.observed_generation),
        desired,
        status.and_then(|s| s.ready_replicas).unwrap_or(0),
    )
}

fn daemonset_readiness(daemonset: &DaemonSet) -> ReadyState {
    let Some(status) = daemonset.status.as_ref() else {
        return ReadyState::not_ready("no status reported");
    };
    replicas_readiness(
        daemonset.metadata.generation,
        status.observed_generation,
        status.desired_number_scheduled,
        status.number_ready,
    )
}

/// Follow a `Ready` condition if present
fn condition_readiness(object: &Value) -> ReadyState {
    let ready = object
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .and_then(|conditions| {
            conditions
                .iter()
                .find(|c| c.get("type").and_then(Value::as_str) == Some("Ready"))
        });

    match ready {
        None => ReadyState::Ready,
        Some(condition) if condition.get("status").and_then(Value::as_str) == Some("True") => {
            ReadyState::Ready
        }
        Some(condition) => {
            let reason = condition
                .get("message")
                .or_else(|| condition.get("reason"))
                .and_then(Value::as_str)
                .unwrap_or("Ready condition is not True");
            ReadyState::not_ready(reason)
        }
    }
}
