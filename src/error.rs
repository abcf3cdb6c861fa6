//! Boundary error type for the HTTP adapter
//!
//! Module errors (`StatsError`, `CsvError`, sqlx) convert into [`AppError`],
//! which renders as `{"error": "...", "details": [...]}` with a matching status.
//! Remote plan-generation failures never pass through here; they are returned
//! as a `PlanResult` instead.

use crate::csv_io::CsvError;
use crate::forms::FieldError;
use crate::stats::StatsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("{0} not found")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("Validation failed")]
  Validation(Vec<FieldError>),

  #[error("{0}")]
  InvalidArgument(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  details: Option<Vec<FieldError>>,
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
      AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<Vec<FieldError>> for AppError {
  fn from(errors: Vec<FieldError>) -> Self {
    AppError::Validation(errors)
  }
}

impl From<StatsError> for AppError {
  fn from(err: StatsError) -> Self {
    match err {
      StatsError::InvalidArgument(message) => AppError::InvalidArgument(message),
    }
  }
}

impl From<CsvError> for AppError {
  fn from(err: CsvError) -> Self {
    match err {
      CsvError::InvalidRows(errors) => AppError::Validation(errors),
      other => AppError::InvalidArgument(other.to_string()),
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "Request failed");
    }

    let body = match self {
      AppError::Validation(details) => ErrorBody {
        error: "Validation failed".to_string(),
        details: Some(details),
      },
      // Storage details stay in the log
      AppError::Database(_) => ErrorBody {
        error: "Database error".to_string(),
        details: None,
      },
      other => ErrorBody {
        error: other.to_string(),
        details: None,
      },
    };

    (status, Json(body)).into_response()
  }
}
