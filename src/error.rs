//! Error types surfaced by the HTTP handlers.
//!
//! Workflow and validation failures from [`crate::vacation`] convert into
//! [`AppError`], which renders as `{"message": ...}` JSON with a status code
//! matching the failure class. Database errors are logged and reported as a
//! generic 500.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::vacation::workflow::{TransitionError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any state was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request is not in a state that allows the attempted action.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// Well-formed input that breaks a data rule, such as a missing reference.
    #[error("{0}")]
    Unprocessable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Maps a unique-key violation to `Conflict` and a dangling foreign key
    /// to `Unprocessable`; anything else stays a `Database` error.
    pub fn from_insert(err: sqlx::Error, conflict: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(conflict.into());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Unprocessable("Referenced record does not exist".to_string());
            }
        }
        AppError::Database(err)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Transition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                json!({ "message": "Internal Server Error" })
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                json!({ "message": "Internal Server Error" })
            }
            AppError::Transition(e) => json!({
                "message": e.to_string(),
                "status": e.current(),
            }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vacation_request::RequestStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: AppError = ValidationError::EmptyRange.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "the selected range contains no vacation days");
    }

    #[test]
    fn test_transition_maps_to_conflict() {
        let err: AppError = TransitionError::AlreadyFinal(RequestStatus::Cancelled).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound("Vacation request");
        assert_eq!(err.to_string(), "Vacation request not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(AppError::Unauthorized("Missing token").status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!AppError::from_insert(sqlx::Error::RowNotFound, "dup").to_string().contains("dup"));
    }

    #[test]
    fn test_validation_dates_in_message() {
        let err: AppError = ValidationError::EndBeforeStart {
            start: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        }
        .into();
        assert_eq!(err.to_string(), "end date 2026-05-01 is before start date 2026-05-02");
    }
}
