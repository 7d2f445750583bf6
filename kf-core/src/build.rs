//! Builds (`build.knative.dev/v1alpha1`)
use crate::{
    conditions::Condition,
    object::{api_resource, HasConditions, ObjectExt},
};
use kube::core::{ApiResource, NotUsed, Object};
use serde::{Deserialize, Serialize};

/// API group of builds
pub const GROUP: &str = "build.knative.dev";
/// API version of builds
pub const VERSION: &str = "v1alpha1";
/// Kind of builds
pub const KIND: &str = "Build";
/// Plural resource name of builds
pub const PLURAL: &str = "builds";

/// A build as delivered by the cluster
///
/// kf never writes builds, so the spec is discarded.
pub type Build = Object<NotUsed, BuildStatus>;

/// The [`ApiResource`] of builds
pub fn resource() -> ApiResource {
    api_resource(GROUP, VERSION, KIND, PLURAL)
}

/// Observed state of a [`Build`]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    /// Conditions in the order reported by the platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Where the build is executing, once scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterSpec>,
}

impl HasConditions for BuildStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }
}

/// Location of a build that runs on the cluster
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Namespace of the pod running the build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Name of the pod running the build steps
    #[serde(default)]
    pub pod_name: String,
}

/// Build specific accessors
pub trait BuildExt {
    /// A build with only a name set
    fn named(name: &str) -> Self;

    /// The first terminal failure condition, if the build has failed
    fn failure(&self) -> Option<&Condition>;

    /// Name of the pod executing the build, once the platform has scheduled it
    fn pod_name(&self) -> Option<&str>;

    /// Namespace of the pod executing the build, if it differs from the build's
    fn pod_namespace(&self) -> Option<&str>;
}

impl BuildExt for Build {
    fn named(name: &str) -> Self {
        Build::new(name, &resource(), NotUsed {})
    }

    fn failure(&self) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.is_failure())
    }

    fn pod_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.cluster.as_ref())
            .map(|c| c.pod_name.as_str())
            .filter(|name| !name.is_empty())
    }

    fn pod_namespace(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.cluster.as_ref())
            .and_then(|c| c.namespace.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{ConditionStatus, SUCCEEDED};
    use serde_json::json;

    #[test]
    fn parses_apiserver_object() {
        let b: Build = serde_json::from_value(json!({
            "apiVersion": "build.knative.dev/v1alpha1",
            "kind": "Build",
            "metadata": { "name": "myapp-00001", "namespace": "dev", "resourceVersion": "41" },
            "spec": { "steps": [] },
            "status": {
                "cluster": { "namespace": "builds", "podName": "myapp-00001-pod-abc" },
                "conditions": [
                    { "type": "Succeeded", "status": "False", "reason": "BuildFailed", "message": "step exited 1" }
                ]
            }
        }))
        .unwrap();
        assert_eq!(b.name(), "myapp-00001");
        assert_eq!(b.pod_name(), Some("myapp-00001-pod-abc"));
        assert_eq!(b.pod_namespace(), Some("builds"));
        let failure = b.failure().unwrap();
        assert_eq!(failure.message, "step exited 1");
    }

    #[test]
    fn missing_status_means_no_failure() {
        let b: Build = serde_json::from_value(json!({"metadata": {"name": "b"}, "spec": {}})).unwrap();
        assert!(b.failure().is_none());
        assert!(b.pod_name().is_none());
    }

    #[test]
    fn failure_ignores_other_conditions() {
        let b = Build::named("b")
            .with_condition(Condition::new("Ready", ConditionStatus::False))
            .with_condition(Condition::new(SUCCEEDED, ConditionStatus::Unknown));
        assert!(b.failure().is_none());
        assert_eq!(b.conditions().len(), 2);
    }

    #[test]
    fn named_builds_carry_their_type() {
        let b = Build::named("b");
        let types = b.types.unwrap();
        assert_eq!(types.api_version, "build.knative.dev/v1alpha1");
        assert_eq!(types.kind, "Build");
    }
}
