use std::path::PathBuf;

use thiserror::Error;

/// Startup failures. Any of these stops the process before a batch begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0} (pass --config or set DIGEST_CONFIG_PATH)")]
    NotFound(PathBuf),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}
