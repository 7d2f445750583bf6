//! Crate with the resource types and helpers shared by the kf crates
//!
//! Builds, serving services and service bindings are modelled as
//! [`kube::core::Object`]s with local spec and status structs holding only the
//! fields kf reads. The extension traits in here add the accessors kf needs on
//! top of them: status conditions, build failure and scheduling, deploy
//! messages and binding labels. No client is required to use them.
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod binding;
pub use binding::{BindingExt, ServiceBinding};

pub mod build;
pub use build::{Build, BuildExt};

pub mod conditions;
pub use conditions::{Condition, ConditionStatus};

pub mod object;
pub use object::{HasConditions, ObjectExt};

pub mod params;
pub use params::parse_json_or_file;

pub mod serving;
pub use serving::{Service, ServiceExt};

pub mod watch;
pub use watch::WatchEvent;

mod error;
pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
