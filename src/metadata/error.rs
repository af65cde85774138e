use thiserror::Error;

/// Tag extraction failure. Callers resolving tracks treat every variant as "metadata absent".
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no ID3 tag found")]
    NoTag,

    #[error("malformed ID3 tag: {0}")]
    Malformed(#[source] id3::Error),

    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<id3::Error> for MetadataError {
    fn from(err: id3::Error) -> Self {
        match err.kind {
            id3::ErrorKind::NoTag => MetadataError::NoTag,
            _ => MetadataError::Malformed(err),
        }
    }
}
