//! Crate with the log tailing runtime of kf
//!
//! A release goes through two phases on the cluster: a build producing the
//! artifacts, then a deploy rolling them out as a new service revision. The
//! [`LogTailer`] follows both phases for one resource version, streaming build
//! logs and deploy progress into a single output, and stops at the first build
//! failure.
#![deny(unsafe_code)]

pub mod build_logs;
pub use build_logs::{BuildLogs, PodLogs};

pub mod tailer;
pub use tailer::{Error, LogTailer};

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
