//! Error type shared by the leave and payroll engine.
//!
//! Every service operation returns [`AppError`]. Handlers propagate it with
//! `?`; the [`ResponseError`] impl turns it into a JSON body carrying a
//! machine-readable `kind` and a human-readable `message`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// End date lies before the start date.
    #[error("end date {end} must be after start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Unrecognised half/full designation.
    #[error("invalid leave timing '{0}': expected first-half, second-half or full-day")]
    InvalidTimingMode(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("payroll for {month:02}/{year} is already finalized")]
    AlreadyFinalized { month: i32, year: i32 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient leave balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Payroll requested for a month that has not elapsed yet.
    #[error("payroll for {month:02}/{year} cannot be run before the month has ended")]
    FutureMonth { month: i32, year: i32 },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    /// Lock, transaction or constraint failures not caused by the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Machine-readable discriminator sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRange { .. } => "invalid_range",
            AppError::InvalidTimingMode(_) => "invalid_timing_mode",
            AppError::NotFound { .. } => "not_found",
            AppError::AlreadyFinalized { .. } => "already_finalized",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::FutureMonth { .. } => "future_month",
            AppError::Validation(_) => "validation",
            AppError::Forbidden(_) => "forbidden",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn not_found(entity: &'static str) -> Self {
        AppError::NotFound { entity }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database operation failed");
        AppError::Internal("database operation failed".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRange { .. }
            | AppError::InvalidTimingMode(_)
            | AppError::Validation(_)
            | AppError::FutureMonth { .. } => StatusCode::BAD_REQUEST,
            AppError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyFinalized { .. } | AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn invalid_range_mentions_both_dates() {
        let error = AppError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "end date 2025-03-07 must be after start date 2025-03-10"
        );
        assert_eq!(error.kind(), "invalid_range");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn already_finalized_is_a_conflict() {
        let error = AppError::AlreadyFinalized { month: 4, year: 2025 };
        assert_eq!(error.to_string(), "payroll for 04/2025 is already finalized");
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn insufficient_balance_is_unprocessable() {
        let error = AppError::InsufficientBalance {
            requested: Decimal::new(35, 1),
            available: Decimal::new(2, 0),
        };
        assert_eq!(error.kind(), "insufficient_balance");
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn database_errors_become_internal_without_leaking_details() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(error.kind(), "internal");
        assert_eq!(error.to_string(), "internal error: database operation failed");
    }

    #[test]
    fn error_response_carries_kind() {
        let error = AppError::not_found("payroll run");
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
