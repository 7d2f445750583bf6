//! Cluster clients used by kf
//!
//! The traits in [`api`] are the seams the rest of kf is written against:
//! watching builds and serving services, and managing service bindings.
//! [`KubeClient`] implements all of them on top of a [`kube::Client`].
//!
//! Watches are handed out as [`Watch`] subscriptions. A subscription owns a
//! producer task that forwards events from the cluster connection, and is
//! released by [`Watch::stop`], a [`StopHandle`], or by being dropped.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub use api::{BindingClient, BuildClient, ClientFactory, ServingClient};

pub mod cluster;
pub use cluster::{KubeClient, KubeFactory};

pub mod watch;
pub use watch::{StopGuard, StopHandle, Watch};

mod error;
pub use error::{BoxError, Error};

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
