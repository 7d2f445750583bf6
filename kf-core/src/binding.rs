//! Service bindings (`servicecatalog.k8s.io/v1beta1`)
use crate::{
    conditions::{self, Condition, ConditionStatus},
    object::{api_resource, HasConditions, ObjectExt},
};
use kube::core::{ApiResource, Object};
use serde::{Deserialize, Serialize};

/// API group of service bindings
pub const GROUP: &str = "servicecatalog.k8s.io";
/// API version of service bindings
pub const VERSION: &str = "v1beta1";
/// Kind of service bindings
pub const KIND: &str = "ServiceBinding";
/// Plural resource name of service bindings
pub const PLURAL: &str = "servicebindings";

/// Label carrying the name of the app a binding belongs to
pub const APP_NAME_LABEL: &str = "kf-app-name";
/// Label carrying the name of the bound service instance
pub const SERVICE_INSTANCE_LABEL: &str = "kf-service-instance";

/// A binding between an app and a managed service instance
pub type ServiceBinding = Object<ServiceBindingSpec, ServiceBindingStatus>;

/// The [`ApiResource`] of service bindings
pub fn resource() -> ApiResource {
    api_resource(GROUP, VERSION, KIND, PLURAL)
}

/// Desired state of a [`ServiceBinding`]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBindingSpec {
    /// The service instance to bind to
    #[serde(default)]
    pub instance_ref: LocalObjectReference,

    /// Secret the credentials are written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    /// Free-form, service specific configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Reference to an object in the same namespace
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct LocalObjectReference {
    /// Name of the referenced object
    #[serde(default)]
    pub name: String,
}

/// Observed state of a [`ServiceBinding`]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
pub struct ServiceBindingStatus {
    /// Conditions in the order reported by the platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl HasConditions for ServiceBindingStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }
}

/// Binding specific accessors
pub trait BindingExt {
    /// A binding named `name` of service `instance` to `app`, labelled so it can be found again
    fn bind(name: &str, instance: &str, app: &str) -> Self;

    /// Set the parameters passed to the service broker
    #[must_use]
    fn parameters(self, params: serde_json::Value) -> Self;

    /// App this binding belongs to, as recorded in its labels
    fn app_name(&self) -> Option<&str>;

    /// Name of the bound service instance
    fn instance_name(&self) -> &str;

    /// Secret holding the credentials, empty if not set
    fn secret_name(&self) -> &str;

    /// Status of the `Ready` condition, `Unknown` if not reported yet
    fn ready(&self) -> ConditionStatus;
}

impl BindingExt for ServiceBinding {
    fn bind(name: &str, instance: &str, app: &str) -> Self {
        let spec = ServiceBindingSpec {
            instance_ref: LocalObjectReference { name: instance.into() },
            secret_name: Some(name.into()),
            parameters: None,
        };
        let mut binding = ServiceBinding::new(name, &resource(), spec);
        let labels = binding.metadata.labels.get_or_insert_with(Default::default);
        labels.insert(APP_NAME_LABEL.into(), app.into());
        labels.insert(SERVICE_INSTANCE_LABEL.into(), instance.into());
        binding
    }

    fn parameters(mut self, params: serde_json::Value) -> Self {
        self.spec.parameters = Some(params);
        self
    }

    fn app_name(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(APP_NAME_LABEL))
            .map(String::as_str)
    }

    fn instance_name(&self) -> &str {
        &self.spec.instance_ref.name
    }

    fn secret_name(&self) -> &str {
        self.spec.secret_name.as_deref().unwrap_or_default()
    }

    fn ready(&self) -> ConditionStatus {
        self.condition(conditions::READY)
            .map(|c| c.status)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn new_binding_is_labelled() {
        let b = ServiceBinding::bind("db", "mydb", "myapp")
            .within("dev")
            .parameters(json!({"permissions": "read-only"}));
        assert_json_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({
                "apiVersion": "servicecatalog.k8s.io/v1beta1",
                "kind": "ServiceBinding",
                "metadata": {
                    "name": "db",
                    "namespace": "dev",
                    "labels": { "kf-app-name": "myapp", "kf-service-instance": "mydb" }
                },
                "spec": {
                    "instanceRef": { "name": "mydb" },
                    "secretName": "db",
                    "parameters": { "permissions": "read-only" }
                }
            })
        );
    }

    #[test]
    fn ready_defaults_to_unknown() {
        let b = ServiceBinding::bind("db", "mydb", "myapp");
        assert_eq!(b.ready(), ConditionStatus::Unknown);
        let b = b.with_condition(Condition::new(conditions::READY, ConditionStatus::True));
        assert_eq!(b.ready(), ConditionStatus::True);
        assert_eq!(b.app_name(), Some("myapp"));
        assert_eq!(b.instance_name(), "mydb");
        assert_eq!(b.secret_name(), "db");
    }

    #[test]
    fn parses_apiserver_list_item() {
        let b: ServiceBinding = serde_json::from_value(json!({
            "metadata": { "name": "db", "labels": { "kf-app-name": "myapp" } },
            "spec": { "instanceRef": { "name": "mydb" } },
            "status": { "conditions": [{ "type": "Ready", "status": "False", "message": "pending" }] }
        }))
        .unwrap();
        assert_eq!(b.name(), "db");
        assert_eq!(b.ready(), ConditionStatus::False);
        assert_eq!(b.secret_name(), "");
    }
}
