use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exercise performed on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutEntry {
  pub id: i64,
  pub user_id: i64,
  pub date: NaiveDate,
  pub exercise: String,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub weight_kg: Option<f64>,
  pub duration_minutes: Option<f64>,
  pub distance_km: Option<f64>,
  pub notes: Option<String>,
}

/// For inserting new entries (without id, user_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutEntry {
  pub date: NaiveDate,
  pub exercise: String,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub weight_kg: Option<f64>,
  pub duration_minutes: Option<f64>,
  pub distance_km: Option<f64>,
  pub notes: Option<String>,
}

impl From<&WorkoutEntry> for NewWorkoutEntry {
  fn from(entry: &WorkoutEntry) -> Self {
    Self {
      date: entry.date,
      exercise: entry.exercise.clone(),
      sets: entry.sets,
      reps: entry.reps,
      weight_kg: entry.weight_kg,
      duration_minutes: entry.duration_minutes,
      distance_km: entry.distance_km,
      notes: entry.notes.clone(),
    }
  }
}
