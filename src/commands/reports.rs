//! Statistics and dashboard chart data

use super::{ensure_user, fetch_metrics, fetch_workouts};
use crate::db::AppState;
use crate::error::AppError;
use crate::stats::{
  self, chart_series, checked_window, entries_in_window, points_in_window, ChartSeries, Field,
  MetricPoint, MetricsSummary, StatsError, WindowPolicy, WorkoutTotals, CALORIES, LONG_WINDOW,
  SHORT_WINDOW, STEPS,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_STATS_DAYS: i64 = 30;

/// ---------------------------------------------------------------------------
/// Summary Statistics
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
  pub days: Option<i64>,
  pub as_of: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
  pub as_of: NaiveDate,
  pub window_days: i64,
  pub all_time: MetricsSummary,
  pub recent: MetricsSummary,
  pub workouts_all_time: WorkoutTotals,
  pub workouts_recent: WorkoutTotals,
}

fn resolve_as_of(raw: Option<&str>) -> Result<NaiveDate, StatsError> {
  match raw {
    Some(s) => stats::parse_date(s),
    None => Ok(Utc::now().date_naive()),
  }
}

pub async fn get_stats(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
  let as_of = resolve_as_of(query.as_of.as_deref())?;
  let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
  stats::window_start(as_of, days)?;

  ensure_user(&state.db, user_id).await?;
  let points: Vec<MetricPoint> = fetch_metrics(&state.db, user_id)
    .await?
    .iter()
    .map(MetricPoint::from)
    .collect();
  let workouts = fetch_workouts(&state.db, user_id).await?;

  let all_points: Vec<&MetricPoint> = points.iter().collect();
  let all_workouts: Vec<_> = workouts.iter().collect();

  Ok(Json(StatsResponse {
    as_of,
    window_days: days,
    all_time: MetricsSummary::compute(&all_points),
    recent: MetricsSummary::compute(&points_in_window(&points, as_of, days)?),
    workouts_all_time: WorkoutTotals::compute(&all_workouts),
    workouts_recent: WorkoutTotals::compute(&entries_in_window(&workouts, as_of, days)?),
  }))
}

/// ---------------------------------------------------------------------------
/// Dashboard Charts
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
  /// Extra moving-average window on top of 7 and 30 days
  pub window: Option<i64>,
  pub policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
  pub policy: WindowPolicy,
  pub weight: ChartSeries,
  pub steps: ChartSeries,
  pub calories: ChartSeries,
}

pub async fn get_dashboard(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
  let policy = match query.policy.as_deref() {
    Some(p) => p.parse::<WindowPolicy>()?,
    None => WindowPolicy::default(),
  };

  let mut windows = vec![SHORT_WINDOW, LONG_WINDOW];
  if let Some(raw) = query.window {
    let window = checked_window(raw)?;
    if !windows.contains(&window) {
      windows.push(window);
    }
  }

  ensure_user(&state.db, user_id).await?;
  let points: Vec<MetricPoint> = fetch_metrics(&state.db, user_id)
    .await?
    .iter()
    .map(MetricPoint::from)
    .collect();

  Ok(Json(DashboardResponse {
    policy,
    weight: chart_series(&points, Field::Value, &windows, policy)?,
    steps: chart_series(&points, Field::Secondary(STEPS), &windows, policy)?,
    calories: chart_series(&points, Field::Secondary(CALORIES), &windows, policy)?,
  }))
}
