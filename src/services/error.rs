use log::{error, warn};
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::StoreError;
use crate::utils::{validation_message, ApiError};

/// Failures of the application operations, independent of HTTP.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No signed-in user, or signed in with the wrong provider for the action.
    #[error("{0}")]
    Unauthenticated(String),

    /// Signed in, but not the owner of the resource.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// The resource is no longer in the state the operation requires.
    #[error("{0}")]
    Conflict(String),

    /// An external API call failed.
    #[error("{0}")]
    Remote(String),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(validation_message(&errors))
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthenticated(message) => ApiError::unauthorized(message),
            ServiceError::Unauthorized(message) => ApiError::forbidden(message),
            ServiceError::NotFound(message) => ApiError::not_found(message),
            ServiceError::Validation(message) => ApiError::bad_request(message),
            ServiceError::Conflict(message) => ApiError::conflict(message),
            ServiceError::Remote(message) => {
                warn!("Remote call failed: {}", message);
                ApiError::bad_gateway(message)
            }
            ServiceError::Store(e) => {
                error!("Store failure: {}", e);
                ApiError::internal_error("Something went wrong. Please try again.")
            }
        }
    }
}
