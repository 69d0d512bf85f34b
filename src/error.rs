use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use compute::ComputeError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required field is empty or a value is out of range
    #[error("{0}")]
    Validation(String),

    #[error("Membership end date {end} is before start date {start}")]
    InvalidMembershipPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Invalid data URL in '{field}': {reason}")]
    InvalidDataUrl { field: String, reason: String },

    #[error("{0}")]
    NotFound(String),

    /// The record collides with an existing one
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        AppError::NotFound(format!("{} with id {} not found", entity, id))
    }

    /// Maps a unique index violation to a conflict with `code`.
    pub fn conflict_on_unique(err: DbErr, code: &'static str, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict {
                code,
                message: message.into(),
            },
            _ => AppError::Database(err),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InvalidMembershipPeriod { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_MEMBERSHIP_PERIOD")
            }
            AppError::InvalidDataUrl { .. } => (StatusCode::BAD_REQUEST, "INVALID_DATA_URL"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
            AppError::Compute(err) => match err {
                ComputeError::InvalidSchedule { .. } => (StatusCode::BAD_REQUEST, "INVALID_SCHEDULE"),
                ComputeError::MissingDueMonth(_) => (StatusCode::BAD_REQUEST, "MISSING_DUE_MONTH"),
                ComputeError::InvalidDueDay { .. } => (StatusCode::BAD_REQUEST, "INVALID_DUE_DAY"),
                ComputeError::OutsideSchedulingWindow { .. } => {
                    (StatusCode::BAD_REQUEST, "OUTSIDE_SCHEDULING_WINDOW")
                }
                ComputeError::DuplicateItem(_) => (StatusCode::BAD_REQUEST, "DUPLICATE_ITEM"),
                ComputeError::InvalidListQuery(_) => (StatusCode::BAD_REQUEST, "INVALID_LIST_QUERY"),
                ComputeError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ComputeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            },
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        // Database details stay in the log.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = vec![
            (AppError::Validation("company_name is required".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::not_found("Customer", 7), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Conflict { code: "TAX_RETURN_EXISTS", message: "taken".into() },
                StatusCode::CONFLICT,
                "TAX_RETURN_EXISTS",
            ),
            (
                AppError::Compute(ComputeError::MissingDueMonth("Gelir Vergisi".into())),
                StatusCode::BAD_REQUEST,
                "MISSING_DUE_MONTH",
            ),
            (
                AppError::Database(DbErr::Custom("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = AppError::Database(DbErr::Custom("secret table".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
