use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::{
    account::AccountError, ai::AiError, attendance::AttendanceError, leave::LeaveError,
};
use crate::store::StoreError;

pub const DB_UNAVAILABLE: &str = "A server error occurred: Could not connect to the database.";

/// Every handler error ends up here and is rendered as `{"message": "..."}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// Precondition violations. Clients of this API expect 400, not 409.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => {
                error!(error = %e, "Database unavailable");
                AppError::ServiceUnavailable(DB_UNAVAILABLE.into())
            }
            StoreError::Duplicate(e) | StoreError::Backend(e) => {
                error!(error = %e, "Store error");
                AppError::Internal("Internal server error".into())
            }
        }
    }
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::UserNotFound => AppError::NotFound(err.to_string()),
            AttendanceError::InvalidAction => AppError::InvalidInput(err.to_string()),
            AttendanceError::AlreadyCheckedIn
            | AttendanceError::NotCheckedIn
            | AttendanceError::AlreadyCheckedOut => AppError::Conflict(err.to_string()),
            AttendanceError::Store(e) => e.into(),
        }
    }
}

impl From<LeaveError> for AppError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::UserNotFound | LeaveError::RequestNotFound => {
                AppError::NotFound(err.to_string())
            }
            LeaveError::InvalidStatus => AppError::InvalidInput(err.to_string()),
            LeaveError::AlreadyDecided(_) => AppError::Conflict(err.to_string()),
            LeaveError::Store(e) => e.into(),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            AccountError::MissingFields => AppError::InvalidInput(err.to_string()),
            AccountError::EmailTaken => AppError::Conflict(err.to_string()),
            AccountError::UserNotFound => AppError::NotFound(err.to_string()),
            AccountError::Hash(e) => {
                error!(error = %e, "Password hashing failed");
                AppError::Internal("Internal server error".into())
            }
            AccountError::Store(e) => e.into(),
        }
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::NotConfigured => AppError::ServiceUnavailable(err.to_string()),
            AiError::MissingInput => AppError::InvalidInput(err.to_string()),
            AiError::Generator(ref e) => {
                error!(error = %e, "Error calling the text generator");
                AppError::Internal(err.to_string())
            }
            AiError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn conflicts_render_as_bad_request_with_message() {
        let err: AppError = AttendanceError::AlreadyCheckedIn.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "You have already checked in today.");
    }

    #[test]
    fn unreachable_database_is_service_unavailable() {
        let err: AppError = StoreError::Unavailable("connection refused".into()).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), DB_UNAVAILABLE);
    }

    #[test]
    fn leave_errors_keep_their_status_codes() {
        assert_eq!(
            AppError::from(LeaveError::RequestNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(LeaveError::InvalidStatus).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
