//! Errors raised while locating and reading local shell state.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for configuration and path handling.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Reading, writing or creating something under the base directory failed
    #[error("Failed to access {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`Config`](crate::Config)
    #[error("Malformed config file {}: {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid api_url {url:?}: {source}")]
    ApiUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The api_url parses but has no path to hang endpoints from (e.g. `mailto:`)
    #[error("api_url cannot be used as a base: {0}")]
    NotABase(String),
}

impl CoreError {
    pub(crate) fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CoreError::File { path, source }
    }
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
