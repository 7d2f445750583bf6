//! Follows the build and deploy phases of a release
use crate::build_logs::BuildLogs;
use kf_client::{BoxError, BuildClient, ClientFactory, ServingClient};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tracing::debug;

mod build;
mod deploy;

pub use deploy::DEPLOY_PREFIX;

/// Errors that end a [`LogTailer::tail`]
#[derive(Debug, Error)]
pub enum Error {
    /// The build or serving client could not be acquired
    #[error(transparent)]
    ClientAcquisition(kf_client::Error),

    /// A watch subscription could not be established
    #[error(transparent)]
    Connection(kf_client::Error),

    /// A build reached its terminal failure condition
    #[error("build {build} failed{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    BuildFailed {
        /// Name of the failed build
        build: String,
        /// Reason reported on the failure condition
        reason: Option<String>,
        /// Message reported on the failure condition
        message: Option<String>,
    },

    /// Streaming the logs of a build failed
    ///
    /// The error of the [`BuildLogs`] implementation, unchanged.
    #[error(transparent)]
    LogStream(BoxError),

    /// The log output could not be written to
    #[error("failed to write log output: {0}")]
    Write(#[source] std::io::Error),
}

/// Tails the logs of the build and deploy phases of a release
///
/// Every call to [`LogTailer::tail`] is self-contained: it acquires its own
/// clients and owns its watch subscriptions for as long as it runs, releasing
/// them on every exit path.
pub struct LogTailer<F, L> {
    clients: F,
    logs: L,
}

impl<F, L> LogTailer<F, L>
where
    F: ClientFactory,
    L: BuildLogs,
{
    /// Create a tailer acquiring clients from `clients` and streaming build logs with `logs`
    pub fn new(clients: F, logs: L) -> Self {
        Self { clients, logs }
    }

    /// Write the logs of the release at `resource_version` in `namespace` to `out`
    ///
    /// Blocks until the deploy watch closes. Unless `skip_build` is set, the
    /// build phase runs first: the logs of every build added from
    /// `resource_version` onwards are streamed one after the other, and the
    /// first failed build ends the tail with [`Error::BuildFailed`] before the
    /// deploy phase is started.
    pub async fn tail<W>(
        &self,
        out: &mut W,
        resource_version: &str,
        namespace: &str,
        skip_build: bool,
    ) -> crate::Result<()>
    where
        W: AsyncWrite + Send + Unpin,
    {
        let builds = self.clients.builds().await.map_err(Error::ClientAcquisition)?;
        let services = self.clients.services().await.map_err(Error::ClientAcquisition)?;

        if skip_build {
            debug!(%namespace, "skipping build phase");
        } else {
            let watch = builds
                .watch_builds(namespace, resource_version)
                .await
                .map_err(Error::Connection)?;
            let _release = watch.stop_handle().stop_on_drop();
            build::run(&self.logs, out, namespace, watch).await?;
        }

        let watch = services
            .watch_services(namespace, resource_version)
            .await
            .map_err(Error::Connection)?;
        let _release = watch.stop_handle().stop_on_drop();
        deploy::run(out, watch).await
    }
}
