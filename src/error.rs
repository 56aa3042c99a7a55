use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backing file {path:?} is not valid JSON")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snippets: {0}")]
    Encode(#[source] serde_json::Error),
}
