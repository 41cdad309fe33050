use std::path::PathBuf;

use thiserror::Error;

use crate::context::document::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The context file exists but is not a valid context document. A torn
    /// write from another process is the usual cause; there is no automatic repair.
    #[error("context document at {path} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize context document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("{collection} entry {id} has an unexpected shape: {source}")]
    Decode {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection} entry {id} does not exist")]
    Missing { collection: Collection, id: String },

    #[error("context writer is no longer running")]
    WriterClosed,
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
