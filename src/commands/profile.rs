use super::ensure_user;
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::forms::validate_profile;
use crate::models::profile::ProfileRow;
use crate::models::UserProfile;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::info;

/// Stored profile, or an all-absent one if the user never saved it
pub(crate) async fn load_profile(db: &DbPool, user_id: i64) -> Result<UserProfile, AppError> {
  let row = sqlx::query_as::<_, ProfileRow>(
    r#"
    SELECT gender, age, height_cm, weight_kg, fitness_level, primary_goal
    FROM user_profiles
    WHERE user_id = ?1
    "#,
  )
  .bind(user_id)
  .fetch_optional(db)
  .await?;

  Ok(row.map(UserProfile::from).unwrap_or_default())
}

pub async fn get_profile(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, AppError> {
  ensure_user(&state.db, user_id).await?;
  Ok(Json(load_profile(&state.db, user_id).await?))
}

pub async fn update_profile(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, AppError> {
  ensure_user(&state.db, user_id).await?;
  validate_profile(&profile)?;

  sqlx::query(
    r#"
    INSERT INTO user_profiles (
      user_id, gender, age, height_cm, weight_kg, fitness_level, primary_goal
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(user_id) DO UPDATE SET
      gender = excluded.gender,
      age = excluded.age,
      height_cm = excluded.height_cm,
      weight_kg = excluded.weight_kg,
      fitness_level = excluded.fitness_level,
      primary_goal = excluded.primary_goal,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(user_id)
  .bind(profile.gender.map(|g| g.as_str()))
  .bind(profile.age)
  .bind(profile.height_cm)
  .bind(profile.weight_kg)
  .bind(profile.fitness_level.map(|f| f.as_str()))
  .bind(profile.goal.map(|g| g.as_str()))
  .execute(&state.db)
  .await?;

  info!(user_id, "Profile updated");

  Ok(Json(load_profile(&state.db, user_id).await?))
}
