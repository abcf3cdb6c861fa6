//! CSV upload and download

use super::metrics::upsert_metrics;
use super::workouts::insert_workouts;
use super::{ensure_user, fetch_metrics, fetch_workouts};
use crate::csv_io;
use crate::db::AppState;
use crate::error::AppError;
use crate::models::{NewDailyMetric, NewWorkoutEntry};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ImportResult {
  pub imported: usize,
}

fn csv_download(filename: &str, body: String) -> impl IntoResponse {
  (
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename),
      ),
    ],
    body,
  )
}

pub async fn import_metrics(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  body: Bytes,
) -> Result<Json<ImportResult>, AppError> {
  ensure_user(&state.db, user_id).await?;

  let metrics = csv_io::parse_metrics_csv(&body)?;
  let imported = upsert_metrics(&state.db, user_id, &metrics).await?;

  info!(user_id, imported, "Metrics CSV imported");
  Ok(Json(ImportResult { imported }))
}

pub async fn export_metrics(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
  ensure_user(&state.db, user_id).await?;

  let metrics: Vec<NewDailyMetric> = fetch_metrics(&state.db, user_id)
    .await?
    .iter()
    .map(NewDailyMetric::from)
    .collect();
  let body = csv_io::metrics_to_csv(&metrics)?;

  Ok(csv_download("metrics.csv", body))
}

pub async fn import_workouts(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  body: Bytes,
) -> Result<Json<ImportResult>, AppError> {
  ensure_user(&state.db, user_id).await?;

  let entries = csv_io::parse_workouts_csv(&body)?;
  let imported = insert_workouts(&state.db, user_id, &entries).await?;

  info!(user_id, imported, "Workouts CSV imported");
  Ok(Json(ImportResult { imported }))
}

pub async fn export_workouts(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
  ensure_user(&state.db, user_id).await?;

  let entries: Vec<NewWorkoutEntry> = fetch_workouts(&state.db, user_id)
    .await?
    .iter()
    .map(NewWorkoutEntry::from)
    .collect();
  let body = csv_io::workouts_to_csv(&entries)?;

  Ok(csv_download("workouts.csv", body))
}
