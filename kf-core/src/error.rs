use std::path::PathBuf;
use thiserror::Error;

/// Possible errors when loading shared inputs
#[derive(Error, Debug)]
pub enum Error {
    /// Parameters were neither inline JSON nor a readable file
    #[error("couldn't read parameter file {path:?}: {source}")]
    ReadParams {
        /// Path that was tried
        path: PathBuf,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The parameter file does not contain JSON
    #[error("couldn't parse {path:?} as JSON: {source}")]
    ParseParams {
        /// Path of the file
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Parameters were valid JSON but not an object
    #[error("parameters must be a JSON object, got {0}")]
    ParamsNotAnObject(&'static str),
}
