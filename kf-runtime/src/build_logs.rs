//! Streaming the logs of a single build
use async_trait::async_trait;
use futures::{pin_mut, AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kf_client::BoxError;
use kf_core::{build, Build, BuildExt};
use kube::{
    api::{Api, LogParams},
    runtime::wait::await_condition,
    Client,
};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Copies the logs of one build to an output
///
/// Implementations block until the build's logs have been drained, and return
/// the first error they hit.
#[async_trait]
pub trait BuildLogs: Send + Sync {
    /// Write the logs of `build` in `namespace` to `out`
    async fn tail(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        build: &str,
        namespace: &str,
    ) -> Result<(), BoxError>;
}

/// Errors from [`PodLogs`]
#[derive(Debug, Error)]
pub enum Error {
    /// Waiting for the build or its pod failed
    #[error("failed waiting for {target}: {source}")]
    Wait {
        /// What was waited for
        target: String,
        /// The underlying watch error
        #[source]
        source: kube::runtime::wait::Error,
    },

    /// The build was deleted before it was scheduled
    #[error("build {0} disappeared")]
    BuildGone(String),

    /// A request against the api failed
    #[error("ApiError: {0}")]
    Api(#[source] kube::Error),

    /// Reading the log stream or writing the output failed
    #[error("failed to copy logs: {0}")]
    Io(#[source] std::io::Error),
}

/// Prefix of the containers running build steps
const STEP_PREFIX: &str = "build-step-";

/// Streams build logs from the pod running the build
///
/// Every step of a build runs as an init container of the build's pod. The
/// steps are followed one after the other, each line written as
/// `[<step>] <line>`.
#[derive(Clone)]
pub struct PodLogs {
    client: Client,
}

impl PodLogs {
    /// Stream with `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Wait until the build runs on a pod, returning the pod's namespace and name
    ///
    /// `None` if the build failed before a pod was scheduled for it.
    async fn scheduled_pod(&self, build: &str, namespace: &str) -> Result<Option<(String, String)>, Error> {
        let builds: Api<Build> = Api::namespaced_with(self.client.clone(), namespace, &build::resource());
        let obj = await_condition(builds, build, scheduled_or_failed)
            .await
            .map_err(|source| Error::Wait {
                target: format!("build {build}"),
                source,
            })?
            .ok_or_else(|| Error::BuildGone(build.into()))?;
        let Some(pod_name) = obj.pod_name() else {
            return Ok(None);
        };
        let pod_ns = obj.pod_namespace().unwrap_or(namespace);
        Ok(Some((pod_ns.to_string(), pod_name.to_string())))
    }

    async fn tail_pod(&self, out: &mut (dyn AsyncWrite + Send + Unpin), pod_ns: &str, pod_name: &str) -> Result<(), Error> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), pod_ns);
        let pod = pods.get(pod_name).await.map_err(Error::Api)?;
        let steps: Vec<String> = pod
            .spec
            .and_then(|s| s.init_containers)
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.name)
            .collect();

        for container in steps {
            let started = await_condition(pods.clone(), pod_name, step_started(&container))
                .await
                .map_err(|source| Error::Wait {
                    target: format!("step {container} of pod {pod_name}"),
                    source,
                })?;
            if !started.as_ref().is_some_and(|p| is_started(p, &container)) {
                // an earlier step failed, the rest never run
                debug!(pod = %pod_name, %container, "build pod finished before step started");
                return Ok(());
            }
            trace!(pod = %pod_name, %container, "following build step");
            let params = LogParams {
                container: Some(container.clone()),
                follow: true,
                ..LogParams::default()
            };
            let lines = pods.log_stream(pod_name, &params).await.map_err(Error::Api)?.lines();
            pin_mut!(lines);
            let step = step_name(&container);
            while let Some(line) = lines.try_next().await.map_err(Error::Io)? {
                out.write_all(format!("[{step}] {line}\n").as_bytes())
                    .await
                    .map_err(Error::Io)?;
            }
            out.flush().await.map_err(Error::Io)?;
        }
        Ok(())
    }
}

#[async_trait]
impl BuildLogs for PodLogs {
    async fn tail(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        build: &str,
        namespace: &str,
    ) -> Result<(), BoxError> {
        let Some((pod_ns, pod_name)) = self.scheduled_pod(build, namespace).await? else {
            // the failure itself is reported by the build watch
            debug!(%build, "build failed before it was scheduled, no logs to stream");
            return Ok(());
        };
        debug!(%build, pod = %pod_name, "build scheduled");
        self.tail_pod(out, &pod_ns, &pod_name).await?;
        Ok(())
    }
}

/// Holds once the build has a pod, has failed, or is gone
fn scheduled_or_failed(build: Option<&Build>) -> bool {
    build.is_none_or(|b| b.pod_name().is_some() || b.failure().is_some())
}

fn step_name(container: &str) -> &str {
    container.strip_prefix(STEP_PREFIX).unwrap_or(container)
}

/// Holds once `container` has started, or once the pod is done without it
fn step_started(container: &str) -> impl Fn(Option<&Pod>) -> bool + '_ {
    move |pod: Option<&Pod>| match pod {
        None => true,
        Some(p) => is_started(p, container) || is_finished(p),
    }
}

fn is_started(pod: &Pod, container: &str) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.init_container_statuses.as_ref())
        .and_then(|statuses| statuses.iter().find(|cs| cs.name == container))
        .and_then(|cs| cs.state.as_ref())
        .is_some_and(|state| state.running.is_some() || state.terminated.is_some())
}

fn is_finished(pod: &Pod) -> bool {
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Succeeded") | Some("Failed")
    )
}
