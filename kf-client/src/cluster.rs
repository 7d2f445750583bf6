//! Implementations of the client traits on top of [`kube`]
use crate::{
    api::{BindingClient, BuildClient, ClientFactory, CreateBinding, DeleteBinding, ListBindings, ServingClient},
    Error, Result, Watch,
};
use async_trait::async_trait;
use futures::{future, StreamExt};
use kf_core::{binding, build, serving, BindingExt, Build, ObjectExt, Service, ServiceBinding, WatchEvent};
use kube::{
    api::{Api, ApiResource, DeleteParams, ListParams, PostParams, WatchEvent as RawEvent, WatchParams},
    config::KubeConfigOptions,
    core::{DynamicResourceScope, Resource},
    Client, Config,
};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, ops::ControlFlow};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Seconds after which the apiserver closes a watch
///
/// A phase reading such a watch ends at this point even if more events would follow.
pub const WATCH_TIMEOUT_SECS: u32 = 290;

/// Build, serving and binding client backed by a [`kube::Client`]
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The namespace used when none is given, as configured in the kubeconfig
    pub fn default_namespace(&self) -> &str {
        self.client.default_namespace()
    }

    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K>(&self, namespace: Option<&str>, resource: &ApiResource) -> Api<K>
    where
        K: Resource<DynamicType = ApiResource, Scope = DynamicResourceScope>,
    {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::default_namespaced_with(self.client.clone(), resource),
        }
    }

    async fn watch<K>(&self, resource: ApiResource, namespace: &str, resource_version: &str) -> Result<Watch<K>>
    where
        K: Resource<DynamicType = ApiResource, Scope = DynamicResourceScope>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + 'static,
    {
        let plural = resource.plural.clone();
        let api: Api<K> = self.api(Some(namespace), &resource);
        let wp = WatchParams::default().timeout(WATCH_TIMEOUT_SECS);
        let stream = api
            .watch(&wp, resource_version)
            .await
            .map_err(|source| Error::Connection {
                resource: plural.clone(),
                namespace: namespace.to_string(),
                source: Box::new(source),
            })?;
        debug!(resource = %plural, %namespace, %resource_version, "watch established");
        let events = stream
            .map(move |raw| translate(&plural, raw))
            .take_while(|step| future::ready(step.is_continue()))
            .filter_map(|step| {
                future::ready(match step {
                    ControlFlow::Continue(event) => event,
                    ControlFlow::Break(()) => None,
                })
            });
        Ok(Watch::spawn(events))
    }
}

/// Turn a raw watch item into a kf event
///
/// Bookmarks are skipped. Errors end the stream: the watch is not restarted.
fn translate<K>(resource: &str, raw: kube::Result<RawEvent<K>>) -> ControlFlow<(), Option<WatchEvent<K>>> {
    match raw {
        Ok(RawEvent::Added(obj)) => ControlFlow::Continue(Some(WatchEvent::Added(obj))),
        Ok(RawEvent::Modified(obj)) => ControlFlow::Continue(Some(WatchEvent::Modified(obj))),
        Ok(RawEvent::Deleted(obj)) => ControlFlow::Continue(Some(WatchEvent::Deleted(obj))),
        Ok(RawEvent::Bookmark(_)) => ControlFlow::Continue(None),
        Ok(RawEvent::Error(err)) => {
            warn!(%resource, error = ?err, "apiserver ended the watch");
            ControlFlow::Break(())
        }
        Err(err) => {
            warn!(%resource, error = %err, "watch connection failed");
            ControlFlow::Break(())
        }
    }
}

#[async_trait]
impl BuildClient for KubeClient {
    async fn watch_builds(&self, namespace: &str, resource_version: &str) -> Result<Watch<Build>> {
        self.watch(build::resource(), namespace, resource_version).await
    }
}

#[async_trait]
impl ServingClient for KubeClient {
    async fn watch_services(&self, namespace: &str, resource_version: &str) -> Result<Watch<Service>> {
        self.watch(serving::resource(), namespace, resource_version).await
    }
}

#[async_trait]
impl BindingClient for KubeClient {
    async fn create(&self, instance: &str, app: &str, params: &CreateBinding) -> Result<ServiceBinding> {
        let name = params.binding_name.as_deref().unwrap_or(instance);
        let desired = ServiceBinding::bind(name, instance, app)
            .parameters(serde_json::Value::Object(params.params.clone()));
        let api: Api<ServiceBinding> = self.api(params.namespace.as_deref(), &binding::resource());
        debug!(binding = name, %instance, %app, "creating service binding");
        api.create(&PostParams::default(), &desired).await.map_err(Error::Api)
    }

    async fn list(&self, params: &ListBindings) -> Result<Vec<ServiceBinding>> {
        let api: Api<ServiceBinding> = self.api(params.namespace.as_deref(), &binding::resource());
        let mut lp = ListParams::default();
        if let Some(selector) = params.label_selector() {
            lp = lp.labels(&selector);
        }
        let list = api.list(&lp).await.map_err(Error::Api)?;
        Ok(list.items)
    }

    async fn delete(&self, instance: &str, app: &str, params: &DeleteBinding) -> Result<()> {
        let mut filter = ListBindings::default().app_name(app).service_instance(instance);
        filter.namespace = params.namespace.clone();
        let matching = self.list(&filter).await?;
        if matching.is_empty() {
            return Err(Error::BindingNotFound {
                app: app.into(),
                instance: instance.into(),
            });
        }
        let api: Api<ServiceBinding> = self.api(params.namespace.as_deref(), &binding::resource());
        for b in matching {
            debug!(binding = b.name(), %instance, %app, "deleting service binding");
            api.delete(b.name(), &DeleteParams::default())
                .await
                .map_err(Error::Api)?;
        }
        Ok(())
    }
}

/// Acquires [`KubeClient`]s from kubeconfig
///
/// The underlying client is created on first use and shared afterwards.
pub struct KubeFactory {
    options: KubeConfigOptions,
    client: OnceCell<Client>,
}

impl KubeFactory {
    /// Use the inferred configuration, or the given kubeconfig context, cluster and user
    pub fn new(options: KubeConfigOptions) -> Self {
        Self {
            options,
            client: OnceCell::new(),
        }
    }

    /// Hand out clones of an already constructed client
    pub fn from_client(client: Client) -> Self {
        Self {
            options: KubeConfigOptions::default(),
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Acquire a client, connecting on first use
    pub async fn connect(&self) -> Result<KubeClient> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let config = self.config().await?;
                Client::try_from(config).map_err(|e| Error::ClientAcquisition(Box::new(e)))
            })
            .await?;
        Ok(KubeClient::new(client.clone()))
    }

    async fn config(&self) -> Result<Config> {
        let explicit = self.options.context.is_some() || self.options.cluster.is_some() || self.options.user.is_some();
        if explicit {
            debug!(context = ?self.options.context, "loading kubeconfig");
            Config::from_kubeconfig(&self.options)
                .await
                .map_err(|e| Error::ClientAcquisition(Box::new(e)))
        } else {
            Config::infer()
                .await
                .map_err(|e| Error::ClientAcquisition(Box::new(e)))
        }
    }
}

#[async_trait]
impl ClientFactory for KubeFactory {
    type Builds = KubeClient;
    type Services = KubeClient;

    async fn builds(&self) -> Result<KubeClient> {
        self.connect().await
    }

    async fn services(&self) -> Result<KubeClient> {
        self.connect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_core::BuildExt;
    use serde_json::json;

    #[test]
    fn translates_typed_events() {
        // the shape an apiserver watch line arrives in
        let raw: RawEvent<Build> = serde_json::from_value(json!({
            "type": "MODIFIED",
            "object": {
                "apiVersion": "build.knative.dev/v1alpha1",
                "kind": "Build",
                "metadata": { "name": "b1", "resourceVersion": "7" },
                "spec": { "steps": [] },
                "status": { "conditions": [{ "type": "Succeeded", "status": "False", "message": "boom" }] }
            }
        }))
        .unwrap();
        match translate("builds", Ok(raw)) {
            ControlFlow::Continue(Some(WatchEvent::Modified(b))) => {
                assert_eq!(b.name(), "b1");
                assert_eq!(b.failure().unwrap().message, "boom");
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn bookmarks_are_skipped() {
        let raw: RawEvent<Build> = serde_json::from_value(json!({
            "type": "BOOKMARK",
            "object": {
                "apiVersion": "build.knative.dev/v1alpha1",
                "kind": "Build",
                "metadata": { "resourceVersion": "8" }
            }
        }))
        .unwrap();
        assert!(matches!(translate("builds", Ok(raw)), ControlFlow::Continue(None)));
    }

    #[test]
    fn errors_end_the_stream() {
        let step = translate::<Build>("builds", Err(kube::Error::LinesCodecMaxLineLengthExceeded));
        assert!(step.is_break());
    }

    #[test]
    fn api_errors_display_unchanged() {
        let inner = kube::Error::LinesCodecMaxLineLengthExceeded;
        let expected = inner.to_string();
        assert_eq!(Error::Api(inner).to_string(), expected);
    }
}
