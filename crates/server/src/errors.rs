use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::catalog::validation::FieldError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{debug, error};

/// JSON error body: `{"error": title, "message": detail, "fields"?}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
    pub fields: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail, fields: None }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some("car not found".into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.title,
            message: self.detail.as_deref().unwrap_or(self.title),
            fields: self.fields.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        let detail = Some(e.to_string());
        match e {
            ServiceError::Validation(errs) => {
                debug!(code = 1001, fields = ?errs.fields(), "validation failed");
                Self {
                    status: StatusCode::BAD_REQUEST,
                    title: "Validation Failed",
                    detail: Some(errs.to_string()),
                    fields: Some(errs.0),
                }
            }
            ServiceError::MissingImage => Self::new(StatusCode::BAD_REQUEST, "Missing Image", detail),
            ServiceError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None),
            ServiceError::InvalidCredential => Self::new(StatusCode::UNAUTHORIZED, "Invalid Credential", None),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::UploadFailed(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Upload Failed", detail),
            ServiceError::Misconfigured(_) => {
                error!(code, err = ?detail, "request refused: service misconfigured");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Service Misconfigured", detail)
            }
            ServiceError::Store(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Store Error", detail),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::catalog::validation::{validate, RawCarFields};

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_carry_fields() {
        let errs = validate(&RawCarFields::default(), None).unwrap_err();
        let resp = JsonApiError::from(ServiceError::Validation(errs)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["error"], "Validation Failed");
        let fields = v["fields"].as_array().unwrap();
        assert!(fields.iter().any(|f| f["field"] == "name" && f["kind"] == "Required"));
    }

    #[tokio::test]
    async fn status_mapping() {
        for (err, status) in [
            (ServiceError::MissingImage, StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (ServiceError::not_found("car"), StatusCode::NOT_FOUND),
            (ServiceError::UploadFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Misconfigured("JWT_SECRET not set".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Store("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ] {
            assert_eq!(JsonApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn misconfigured_is_distinct_and_fields_absent() {
        let v = body_json(JsonApiError::from(ServiceError::Misconfigured("DATABASE_URL is not set".into())).into_response()).await;
        assert_eq!(v["error"], "Service Misconfigured");
        assert!(v["message"].as_str().unwrap().contains("DATABASE_URL"));
        assert!(v.get("fields").is_none());
    }

    #[tokio::test]
    async fn store_message_passes_through() {
        let v = body_json(JsonApiError::from(ServiceError::Store("connection refused".into())).into_response()).await;
        assert!(v["message"].as_str().unwrap().contains("connection refused"));
    }
}
