use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::dao::{repository::RepositoryError, storage::StorageError};

/// Errors that can occur in service layer operations.
///
/// Absence of a requested record is not an error: services return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed or refused the operation.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// A stored record could not be decoded.
    #[error("stored data is malformed")]
    Deserialization(#[source] RepositoryError),
    /// A record references a related record that is missing or does not point back.
    #[error("inconsistent data: {0}")]
    Inconsistent(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Storage(source) => ServiceError::Unavailable(source),
            other => ServiceError::Deserialization(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Conflict with the stored state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(StorageError::Rejected {
                collection,
                id,
                message,
            }) => AppError::Conflict(format!("{collection} `{id}`: {message}")),
            ServiceError::Unavailable(source) => {
                warn!(error = %source, "storage operation failed");
                AppError::ServiceUnavailable(source.to_string())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Deserialization(source) => {
                error!(error = %source, "stored record could not be decoded");
                AppError::Internal(source.to_string())
            }
            ServiceError::Inconsistent(message) => {
                warn!(%message, "inconsistent references between records");
                AppError::Conflict(message)
            }
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document_store::Collection;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn service_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_of(ServiceError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::Inconsistent("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn rejected_write_is_a_conflict() {
        let err = ServiceError::from(StorageError::rejected(Collection::Users, "u1", "stale"));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn undecodable_record_is_internal() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ServiceError::from(RepositoryError::Deserialization {
            collection: Collection::Players,
            id: "p1".into(),
            source,
        });
        assert!(matches!(err, ServiceError::Deserialization(_)));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
