use thiserror::Error;

use crate::auth::errors::AuthError;
use crate::catalog::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("authentication required")]
    Unauthorized,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("a cover image is required")]
    MissingImage,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("service misconfigured: {0}")]
    Misconfigured(String),
    #[error("store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::MissingImage => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Unauthorized => 1004,
            ServiceError::InvalidCredential => 1005,
            ServiceError::UploadFailed(_) => 1101,
            ServiceError::Misconfigured(_) => 1102,
            ServiceError::Store(_) => 1200,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(e: ValidationErrors) -> Self { ServiceError::Validation(e) }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Missing => ServiceError::Unauthorized,
            AuthError::Invalid(_) | AuthError::Expired => ServiceError::InvalidCredential,
            AuthError::NotConfigured => ServiceError::Misconfigured("token secret is not configured".into()),
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) | models::errors::ModelError::Db(msg) => ServiceError::Store(msg),
        }
    }
}
