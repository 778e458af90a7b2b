use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the flat-file stores.
///
/// Read-side callers usually degrade these to an empty listing; keeping them
/// typed lets the caller log what actually went wrong first.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to run `{command}`: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
