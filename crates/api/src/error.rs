use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::document::validate::ValidationError;
use folio_core::Error;
use serde_json::json;

/// API error type rendered as the JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

const VALIDATION_ERROR: &str = "validationError";

fn service_status(err: &Error) -> StatusCode {
    match err {
        Error::Unauthenticated => StatusCode::UNAUTHORIZED,
        Error::Unauthorized(_) | Error::Forbidden(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Service(err @ Error::Internal(msg)) => {
                tracing::error!("Internal error: {msg}");
                (service_status(err), err.kind(), "An internal error occurred".to_string())
            }
            ApiError::Service(err @ Error::StoreUnavailable(_)) => {
                tracing::error!("Store error: {err}");
                (service_status(err), err.kind(), err.to_string())
            }
            ApiError::Service(err) => (service_status(err), err.kind(), err.to_string()),
            // Malformed or oversized request bodies are input errors like any other.
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, VALIDATION_ERROR, msg.clone()),
            ApiError::Multipart(err) => (StatusCode::BAD_REQUEST, VALIDATION_ERROR, err.body_text()),
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
