use thiserror::Error;

/// Outcomes of credential verification
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("credential missing")]
    Missing,
    #[error("credential invalid: {0}")]
    Invalid(String),
    #[error("credential expired")]
    Expired,
    #[error("token secret not configured")]
    NotConfigured,
}
