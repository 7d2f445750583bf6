//! Error handling in [`kf_client`][crate]
use thiserror::Error;

/// A type-erased error from a collaborator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Possible errors when talking to the cluster
#[derive(Error, Debug)]
pub enum Error {
    /// The cluster client could not be constructed
    ///
    /// Typically a missing or broken kubeconfig.
    #[error("failed to acquire cluster client: {0}")]
    ClientAcquisition(#[source] BoxError),

    /// A watch subscription could not be established
    #[error("failed to watch {resource} in namespace {namespace:?}: {source}")]
    Connection {
        /// Plural name of the watched resource
        resource: String,
        /// Namespace the watch was scoped to
        namespace: String,
        /// Why the subscription failed
        #[source]
        source: BoxError,
    },

    /// A request against the api failed, the api error unchanged
    #[error(transparent)]
    Api(kube::Error),

    /// No binding exists for the given app and service instance
    #[error("no binding found for service instance {instance:?} and app {app:?}")]
    BindingNotFound {
        /// Name of the app
        app: String,
        /// Name of the service instance
        instance: String,
    },
}
