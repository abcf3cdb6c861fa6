use super::{conflict_on_unique, ensure_user, fetch_metrics};
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::forms::MetricForm;
use crate::models::{DailyMetric, NewDailyMetric};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::info;

fn duplicate_date(metric: &NewDailyMetric) -> String {
  format!("A metric for {} already exists", metric.date)
}

/// ---------------------------------------------------------------------------
/// CRUD
/// ---------------------------------------------------------------------------

pub async fn add_metric(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(form): Json<MetricForm>,
) -> Result<(StatusCode, Json<DailyMetric>), AppError> {
  ensure_user(&state.db, user_id).await?;
  let metric = form.validate()?;

  let created = sqlx::query_as::<_, DailyMetric>(
    r#"
    INSERT INTO daily_metrics (user_id, date, weight, steps, calories)
    VALUES (?1, ?2, ?3, ?4, ?5)
    RETURNING id, user_id, date, weight, steps, calories
    "#,
  )
  .bind(user_id)
  .bind(metric.date)
  .bind(metric.weight)
  .bind(metric.steps)
  .bind(metric.calories)
  .fetch_one(&state.db)
  .await
  .map_err(|e| conflict_on_unique(e, duplicate_date(&metric)))?;

  info!(user_id, date = %created.date, "Metric added");

  Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_metrics(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<Json<Vec<DailyMetric>>, AppError> {
  ensure_user(&state.db, user_id).await?;
  Ok(Json(fetch_metrics(&state.db, user_id).await?))
}

pub async fn get_metric(
  State(state): State<Arc<AppState>>,
  Path((user_id, metric_id)): Path<(i64, i64)>,
) -> Result<Json<DailyMetric>, AppError> {
  ensure_user(&state.db, user_id).await?;

  sqlx::query_as::<_, DailyMetric>(
    r#"
    SELECT id, user_id, date, weight, steps, calories
    FROM daily_metrics
    WHERE id = ?1 AND user_id = ?2
    "#,
  )
  .bind(metric_id)
  .bind(user_id)
  .fetch_optional(&state.db)
  .await?
  .map(Json)
  .ok_or_else(|| AppError::NotFound(format!("Metric {}", metric_id)))
}

pub async fn update_metric(
  State(state): State<Arc<AppState>>,
  Path((user_id, metric_id)): Path<(i64, i64)>,
  Json(form): Json<MetricForm>,
) -> Result<Json<DailyMetric>, AppError> {
  ensure_user(&state.db, user_id).await?;
  let metric = form.validate()?;

  sqlx::query_as::<_, DailyMetric>(
    r#"
    UPDATE daily_metrics SET
      date = ?1,
      weight = ?2,
      steps = ?3,
      calories = ?4
    WHERE id = ?5 AND user_id = ?6
    RETURNING id, user_id, date, weight, steps, calories
    "#,
  )
  .bind(metric.date)
  .bind(metric.weight)
  .bind(metric.steps)
  .bind(metric.calories)
  .bind(metric_id)
  .bind(user_id)
  .fetch_optional(&state.db)
  .await
  .map_err(|e| conflict_on_unique(e, duplicate_date(&metric)))?
  .map(Json)
  .ok_or_else(|| AppError::NotFound(format!("Metric {}", metric_id)))
}

pub async fn delete_metric(
  State(state): State<Arc<AppState>>,
  Path((user_id, metric_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
  ensure_user(&state.db, user_id).await?;

  let result = sqlx::query("DELETE FROM daily_metrics WHERE id = ?1 AND user_id = ?2")
    .bind(metric_id)
    .bind(user_id)
    .execute(&state.db)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Metric {}", metric_id)));
  }

  info!(user_id, metric_id, "Metric deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// ---------------------------------------------------------------------------
/// Bulk Upsert (CSV import)
/// ---------------------------------------------------------------------------

/// Insert or overwrite one row per date, all-or-nothing
pub(crate) async fn upsert_metrics(
  db: &DbPool,
  user_id: i64,
  metrics: &[NewDailyMetric],
) -> Result<usize, AppError> {
  let mut tx = db.begin().await?;

  for metric in metrics {
    sqlx::query(
      r#"
      INSERT INTO daily_metrics (user_id, date, weight, steps, calories)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(user_id, date) DO UPDATE SET
        weight = excluded.weight,
        steps = excluded.steps,
        calories = excluded.calories
      "#,
    )
    .bind(user_id)
    .bind(metric.date)
    .bind(metric.weight)
    .bind(metric.steps)
    .bind(metric.calories)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;
  Ok(metrics.len())
}
