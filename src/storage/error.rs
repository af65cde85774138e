use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot read audio directory {}: {source}", path.to_string_lossy())]
    Directory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("audio file {0} not found")]
    TrackNotFound(String),

    #[error("cannot read manifest {}: {source}", path.to_string_lossy())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", path.to_string_lossy())]
    ManifestFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
