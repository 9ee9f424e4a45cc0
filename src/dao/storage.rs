use std::error::Error;
use thiserror::Error;

use crate::dao::document_store::Collection;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed while serving the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend refused a write, typically because a concurrent writer got there first.
    #[error("storage rejected write to {collection} `{id}`: {message}")]
    Rejected {
        collection: Collection,
        id: String,
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Construct a rejected-write error for a single record.
    pub fn rejected(collection: Collection, id: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Rejected {
            collection,
            id: id.into(),
            message: message.into(),
        }
    }
}
