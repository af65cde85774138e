use rouille::Response;
use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TrackNotFound(_) => ApiError::NotFound("File not found".into()),

            StorageError::Directory { .. }
            | StorageError::ManifestRead { .. }
            | StorageError::ManifestFormat { .. }
            | StorageError::Fs(_)
            | StorageError::Internal(_) => ApiError::Internal("internal server error".into()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                Response::text(msg).with_status_code(status)
            }
        }
    }
}
