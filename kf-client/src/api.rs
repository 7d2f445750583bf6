//! Client traits and the parameters they take
use crate::{Result, Watch};
use async_trait::async_trait;
use kf_core::{Build, Service, ServiceBinding};
use serde_json::{Map, Value};

/// Watches builds
#[async_trait]
pub trait BuildClient: Send + Sync {
    /// Subscribe to build events in `namespace`, starting at `resource_version`
    ///
    /// Fails with [`Error::Connection`](crate::Error::Connection) if the
    /// subscription cannot be established.
    async fn watch_builds(&self, namespace: &str, resource_version: &str) -> Result<Watch<Build>>;
}

/// Watches serving services
#[async_trait]
pub trait ServingClient: Send + Sync {
    /// Subscribe to service events in `namespace`, starting at `resource_version`
    ///
    /// Fails with [`Error::Connection`](crate::Error::Connection) if the
    /// subscription cannot be established.
    async fn watch_services(&self, namespace: &str, resource_version: &str) -> Result<Watch<Service>>;
}

/// Hands out build and serving clients on demand
///
/// Acquisition fails with [`Error::ClientAcquisition`](crate::Error::ClientAcquisition)
/// when the platform cannot be reached with the current configuration.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// The build client handed out
    type Builds: BuildClient;
    /// The serving client handed out
    type Services: ServingClient;

    /// Acquire a build client
    async fn builds(&self) -> Result<Self::Builds>;

    /// Acquire a serving client
    async fn services(&self) -> Result<Self::Services>;
}

/// Manages service bindings
///
/// Errors from the api are surfaced as they are.
#[async_trait]
pub trait BindingClient: Send + Sync {
    /// Bind service `instance` to `app`
    async fn create(&self, instance: &str, app: &str, params: &CreateBinding) -> Result<ServiceBinding>;

    /// List bindings matching the filters in `params`
    async fn list(&self, params: &ListBindings) -> Result<Vec<ServiceBinding>>;

    /// Remove the binding of service `instance` to `app`
    async fn delete(&self, instance: &str, app: &str, params: &DeleteBinding) -> Result<()>;
}

/// Options for [`BindingClient::create`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateBinding {
    /// Namespace to create in, the client default if `None`
    pub namespace: Option<String>,
    /// Name of the binding, the service instance name if `None`
    pub binding_name: Option<String>,
    /// Parameters passed on to the service broker
    pub params: Map<String, Value>,
}

impl CreateBinding {
    /// Create in `namespace`
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Name the binding
    #[must_use]
    pub fn binding_name(mut self, name: &str) -> Self {
        self.binding_name = Some(name.into());
        self
    }

    /// Set broker parameters
    #[must_use]
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }
}

/// Filters for [`BindingClient::list`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListBindings {
    /// Namespace to list in, the client default if `None`
    pub namespace: Option<String>,
    /// Only bindings of this app
    pub app_name: Option<String>,
    /// Only bindings of this service instance
    pub service_instance: Option<String>,
}

impl ListBindings {
    /// List in `namespace`
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Only bindings of `app`
    #[must_use]
    pub fn app_name(mut self, app: &str) -> Self {
        self.app_name = Some(app.into());
        self
    }

    /// Only bindings of service `instance`
    #[must_use]
    pub fn service_instance(mut self, instance: &str) -> Self {
        self.service_instance = Some(instance.into());
        self
    }

    /// The label selector implementing the filters, `None` when unfiltered
    pub fn label_selector(&self) -> Option<String> {
        let selectors: Vec<String> = [
            (kf_core::binding::APP_NAME_LABEL, &self.app_name),
            (kf_core::binding::SERVICE_INSTANCE_LABEL, &self.service_instance),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}={v}")))
        .collect();
        if selectors.is_empty() {
            None
        } else {
            Some(selectors.join(","))
        }
    }
}

/// Options for [`BindingClient::delete`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteBinding {
    /// Namespace to delete in, the client default if `None`
    pub namespace: Option<String>,
}

impl DeleteBinding {
    /// Delete in `namespace`
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_selector_combines_filters() {
        assert_eq!(ListBindings::default().label_selector(), None);
        assert_eq!(
            ListBindings::default().app_name("myapp").label_selector().as_deref(),
            Some("kf-app-name=myapp")
        );
        assert_eq!(
            ListBindings::default()
                .namespace("dev")
                .service_instance("mydb")
                .app_name("myapp")
                .label_selector()
                .as_deref(),
            Some("kf-app-name=myapp,kf-service-instance=mydb")
        );
    }
}
