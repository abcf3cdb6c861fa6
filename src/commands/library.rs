use crate::error::AppError;
use crate::exercises::{self, Exercise, EXERCISES};
use axum::extract::Path;
use axum::Json;

pub async fn list_exercises() -> Json<&'static [Exercise]> {
  Json(&EXERCISES[..])
}

pub async fn get_exercise(Path(key): Path<String>) -> Result<Json<&'static Exercise>, AppError> {
  exercises::find(&key)
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Exercise '{}'", key)))
}
