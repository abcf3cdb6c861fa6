use super::conflict_on_unique;
use crate::db::AppState;
use crate::error::AppError;
use crate::forms::UserForm;
use crate::models::User;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::info;

pub async fn create_user(
  State(state): State<Arc<AppState>>,
  Json(form): Json<UserForm>,
) -> Result<(StatusCode, Json<User>), AppError> {
  let username = form.validate()?;

  let user = sqlx::query_as::<_, User>(
    "INSERT INTO users (username) VALUES (?1) RETURNING id, username, created_at",
  )
  .bind(&username)
  .fetch_one(&state.db)
  .await
  .map_err(|e| conflict_on_unique(e, format!("Username '{}' is already taken", username)))?;

  info!(user_id = user.id, "User created");

  Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
  sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = ?1")
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
}
