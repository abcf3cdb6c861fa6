pub mod data;
pub mod library;
pub mod metrics;
pub mod plan;
pub mod profile;
pub mod reports;
pub mod users;
pub mod workouts;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{DailyMetric, WorkoutEntry};
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

/// Fail with 404 unless the user exists
pub(crate) async fn ensure_user(db: &DbPool, user_id: i64) -> Result<(), AppError> {
  let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
    .bind(user_id)
    .fetch_optional(db)
    .await?;

  found
    .map(|_| ())
    .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
}

/// All of a user's metrics, oldest first
pub(crate) async fn fetch_metrics(db: &DbPool, user_id: i64) -> Result<Vec<DailyMetric>, AppError> {
  let metrics = sqlx::query_as::<_, DailyMetric>(
    r#"
    SELECT id, user_id, date, weight, steps, calories
    FROM daily_metrics
    WHERE user_id = ?1
    ORDER BY date ASC
    "#,
  )
  .bind(user_id)
  .fetch_all(db)
  .await?;

  Ok(metrics)
}

/// All of a user's workout entries, oldest first
pub(crate) async fn fetch_workouts(db: &DbPool, user_id: i64) -> Result<Vec<WorkoutEntry>, AppError> {
  let entries = sqlx::query_as::<_, WorkoutEntry>(
    r#"
    SELECT id, user_id, date, exercise, sets, reps, weight_kg,
           duration_minutes, distance_km, notes
    FROM workout_entries
    WHERE user_id = ?1
    ORDER BY date ASC, id ASC
    "#,
  )
  .bind(user_id)
  .fetch_all(db)
  .await?;

  Ok(entries)
}

/// Map a unique-constraint violation to 409, anything else passes through
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> AppError {
  match &err {
    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(message.into()),
    _ => AppError::Database(err),
  }
}
