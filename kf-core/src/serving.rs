//! Serving services (`serving.knative.dev/v1alpha1`)
use crate::{
    conditions::Condition,
    object::{api_resource, HasConditions, ObjectExt},
};
use kube::core::{ApiResource, NotUsed, Object};
use serde::{Deserialize, Serialize};

/// API group of serving services
pub const GROUP: &str = "serving.knative.dev";
/// API version of serving services
pub const VERSION: &str = "v1alpha1";
/// Kind of serving services
pub const KIND: &str = "Service";
/// Plural resource name of serving services
pub const PLURAL: &str = "services";

/// A serving service, the deployed form of an app
pub type Service = Object<NotUsed, ServiceStatus>;

/// The [`ApiResource`] of serving services
pub fn resource() -> ApiResource {
    api_resource(GROUP, VERSION, KIND, PLURAL)
}

/// Observed state of a [`Service`]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
pub struct ServiceStatus {
    /// Conditions in the order reported by the platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl HasConditions for ServiceStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }
}

/// Serving specific accessors
pub trait ServiceExt {
    /// A service with only a name set
    fn named(name: &str) -> Self;

    /// Messages of all conditions that carry one, in order
    fn messages(&self) -> impl Iterator<Item = &str>;
}

impl ServiceExt for Service {
    fn named(name: &str) -> Self {
        Service::new(name, &resource(), NotUsed {})
    }

    fn messages(&self) -> impl Iterator<Item = &str> {
        self.conditions()
            .iter()
            .map(|c| c.message.as_str())
            .filter(|m| !m.is_empty())
    }
}
