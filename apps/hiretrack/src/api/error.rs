//! # API Errors
//!
//! Every failure leaves the server as `{"error": "...", "details": [...]}`
//! with a status derived from the domain error kind.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hiretrack_core::HireError;

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error on its way to becoming an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// A domain failure from the store or the policy.
    Domain(HireError),
    /// The request itself could not be read (malformed JSON, bad query string).
    BadRequest(String),
    /// The global rate limit was exceeded.
    RateLimited,
}

impl From<HireError> for ApiError {
    fn from(e: HireError) -> Self {
        Self::Domain(e)
    }
}

/// HTTP status for a domain error.
pub fn status_for(error: &HireError) -> StatusCode {
    match error {
        HireError::Unauthenticated => StatusCode::UNAUTHORIZED,
        HireError::Forbidden(_) => StatusCode::FORBIDDEN,
        HireError::Validation(_) => StatusCode::BAD_REQUEST,
        HireError::NotFound { .. } => StatusCode::NOT_FOUND,
        HireError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        HireError::SerializationError(_) | HireError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Domain(HireError::Validation(details)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation failed".to_string(),
                    details: Some(details),
                },
            ),
            Self::Domain(e) if e.is_internal() => {
                tracing::error!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
            Self::Domain(e) => (status_for(&e), ErrorResponse::new(e.to_string())),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorResponse::new(message)),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new("Too Many Requests"),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiretrack_core::FieldError;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (HireError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (HireError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (HireError::invalid("name", "empty"), StatusCode::BAD_REQUEST),
            (
                HireError::NotFound {
                    kind: "Workflow",
                    id: 4,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                HireError::PreconditionFailed("default".into()),
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                HireError::IoError("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(status_for(&error), status);
        }
    }

    #[test]
    fn validation_keeps_field_details() {
        let response = ApiError::from(HireError::Validation(vec![FieldError::new(
            "stageIds",
            "must list every stage",
        )]))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_are_masked() {
        let response = ApiError::from(HireError::SerializationError("postcard".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
