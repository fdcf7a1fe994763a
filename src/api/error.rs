//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::booking::BookingError;
use crate::db::DatabaseError;
use crate::review::ReviewError;
use crate::storage::StorageError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Forbidden")]
    Forbidden,
    #[error("Slot no longer available")]
    SlotUnavailable,
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Already reviewed")]
    AlreadyReviewed,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "You do not have access to this resource".to_string(),
            ),
            ApiError::SlotUnavailable => (
                StatusCode::CONFLICT,
                "SLOT_UNAVAILABLE",
                "This time slot is no longer available. Pick another date or time.".to_string(),
            ),
            ApiError::InvalidTransition(detail) => (
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                detail.clone(),
            ),
            ApiError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "An account with this email already exists".to_string(),
            ),
            ApiError::AlreadyReviewed => (
                StatusCode::CONFLICT,
                "ALREADY_REVIEWED",
                "You have already reviewed this lawyer".to_string(),
            ),
            ApiError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                detail.clone(),
            ),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotUnavailable => ApiError::SlotUnavailable,
            BookingError::Validation(msg) => ApiError::BadRequest(msg),
            BookingError::InvalidTransition { .. } => ApiError::InvalidTransition(err.to_string()),
            BookingError::NotAParty => ApiError::Forbidden,
            BookingError::AppointmentNotFound(_) => ApiError::NotFound("Appointment not found".into()),
            BookingError::LawyerNotFound(_) => ApiError::NotFound("Lawyer not found".into()),
            BookingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(msg) => ApiError::BadRequest(msg),
            ReviewError::AlreadyReviewed => ApiError::AlreadyReviewed,
            ReviewError::LawyerNotFound(_) => ApiError::NotFound("Lawyer not found".into()),
            ReviewError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => ApiError::EmailTaken,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidResetToken => {
                ApiError::BadRequest("Reset token invalid or expired".into())
            }
            AuthError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType | StorageError::TooLarge => {
                ApiError::BadRequest(err.to_string())
            }
            StorageError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn slot_unavailable_returns_409_with_user_facing_message() {
        let response = ApiError::SlotUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "SLOT_UNAVAILABLE");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("no longer available"));
    }

    #[tokio::test]
    async fn booking_errors_map_to_statuses() {
        let cases: Vec<(BookingError, StatusCode)> = vec![
            (BookingError::SlotUnavailable, StatusCode::CONFLICT),
            (BookingError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (BookingError::NotAParty, StatusCode::FORBIDDEN),
            (
                BookingError::AppointmentNotFound("x".into()),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("secret db path".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("Lawyer not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn email_taken_and_already_reviewed_return_409() {
        assert_eq!(
            ApiError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::AlreadyReviewed.into_response().status(),
            StatusCode::CONFLICT
        );
    }
}
