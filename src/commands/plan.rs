use super::profile::load_profile;
use super::{ensure_user, fetch_workouts};
use crate::config::gemini_api_key;
use crate::db::AppState;
use crate::error::AppError;
use crate::planner::{generate_plan, summarize_training_history, PlanResult};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct PlanRequest {
  /// Free-text history; when absent it is summarised from logged workouts
  pub training_history: Option<String>,
}

/// Generate a plan for the user. Remote failures come back as a `PlanResult`
/// failure with status 200; only local problems (unknown user, database) are
/// HTTP errors.
pub async fn generate_user_plan(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  request: Option<Json<PlanRequest>>,
) -> Result<Json<PlanResult>, AppError> {
  ensure_user(&state.db, user_id).await?;
  let request = request.map(|Json(r)| r).unwrap_or_default();

  let profile = load_profile(&state.db, user_id).await?;
  let history = match request.training_history.filter(|h| !h.trim().is_empty()) {
    Some(h) => Some(h),
    None => {
      let workouts = fetch_workouts(&state.db, user_id).await?;
      summarize_training_history(&workouts, Utc::now().date_naive())
    }
  };

  let api_key = gemini_api_key();
  info!(
    user_id,
    model = %state.config.gemini_model,
    history_supplied = history.is_some(),
    "Generating plan"
  );
  let result = generate_plan(
    state.generator.as_ref(),
    api_key.as_deref(),
    &profile,
    history.as_deref(),
  )
  .await;

  Ok(Json(result))
}
