//! Accessors shared by all kf resources
use crate::conditions::{self, Condition};
use kube::core::{ApiResource, GroupVersionKind, Object};

/// Status structs that carry a list of conditions
pub trait HasConditions {
    /// Conditions in the order reported by the platform
    fn conditions(&self) -> &[Condition];

    /// Mutable access to the conditions
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;
}

/// Extension trait for kf resources modelled as [`Object`]s
pub trait ObjectExt {
    /// Name of the object, empty if the platform has not named it
    fn name(&self) -> &str;

    /// Status conditions, empty while no status is reported
    fn conditions(&self) -> &[Condition];

    /// First condition of the given type
    fn condition(&self, type_: &str) -> Option<&Condition> {
        conditions::find(self.conditions(), type_)
    }

    /// Append a condition to the status, creating the status if needed
    #[must_use]
    fn with_condition(self, condition: Condition) -> Self;
}

impl<P, U> ObjectExt for Object<P, U>
where
    P: Clone,
    U: Clone + Default + HasConditions,
{
    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(HasConditions::conditions).unwrap_or_default()
    }

    fn with_condition(mut self, condition: Condition) -> Self {
        self.status
            .get_or_insert_with(U::default)
            .conditions_mut()
            .push(condition);
        self
    }
}

pub(crate) fn api_resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
}
