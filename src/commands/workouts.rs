use super::{ensure_user, fetch_workouts};
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::forms::WorkoutForm;
use crate::models::{NewWorkoutEntry, WorkoutEntry};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::info;

pub async fn add_workout(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(form): Json<WorkoutForm>,
) -> Result<(StatusCode, Json<WorkoutEntry>), AppError> {
  ensure_user(&state.db, user_id).await?;
  let entry = form.validate()?;

  let created = sqlx::query_as::<_, WorkoutEntry>(
    r#"
    INSERT INTO workout_entries (
      user_id, date, exercise, sets, reps, weight_kg,
      duration_minutes, distance_km, notes
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    RETURNING id, user_id, date, exercise, sets, reps, weight_kg,
              duration_minutes, distance_km, notes
    "#,
  )
  .bind(user_id)
  .bind(entry.date)
  .bind(&entry.exercise)
  .bind(entry.sets)
  .bind(entry.reps)
  .bind(entry.weight_kg)
  .bind(entry.duration_minutes)
  .bind(entry.distance_km)
  .bind(&entry.notes)
  .fetch_one(&state.db)
  .await?;

  info!(user_id, exercise = %created.exercise, "Workout entry added");

  Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_workouts(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<Json<Vec<WorkoutEntry>>, AppError> {
  ensure_user(&state.db, user_id).await?;
  Ok(Json(fetch_workouts(&state.db, user_id).await?))
}

pub async fn delete_workout(
  State(state): State<Arc<AppState>>,
  Path((user_id, entry_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
  ensure_user(&state.db, user_id).await?;

  let result = sqlx::query("DELETE FROM workout_entries WHERE id = ?1 AND user_id = ?2")
    .bind(entry_id)
    .bind(user_id)
    .execute(&state.db)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Workout entry {}", entry_id)));
  }

  Ok(StatusCode::NO_CONTENT)
}

/// Append entries in one transaction (CSV import)
pub(crate) async fn insert_workouts(
  db: &DbPool,
  user_id: i64,
  entries: &[NewWorkoutEntry],
) -> Result<usize, AppError> {
  let mut tx = db.begin().await?;

  for entry in entries {
    sqlx::query(
      r#"
      INSERT INTO workout_entries (
        user_id, date, exercise, sets, reps, weight_kg,
        duration_minutes, distance_km, notes
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
    )
    .bind(user_id)
    .bind(entry.date)
    .bind(&entry.exercise)
    .bind(entry.sets)
    .bind(entry.reps)
    .bind(entry.weight_kg)
    .bind(entry.duration_minutes)
    .bind(entry.distance_km)
    .bind(&entry.notes)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;
  Ok(entries.len())
}
