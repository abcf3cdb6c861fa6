//! Input validation for user-submitted data
//!
//! Each form deserializes loosely from JSON (or a CSV row) and is turned into
//! a typed insert value by `validate`, which reports every problem at once as
//! a list of [`FieldError`]s instead of stopping at the first.

use crate::models::{NewDailyMetric, NewWorkoutEntry, UserProfile};
use crate::stats::parse_date;
use serde::{Deserialize, Serialize};

const MAX_USERNAME_LEN: usize = 150;
const MAX_EXERCISE_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
  pub field: String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
    }
  }
}

fn check_non_negative_int(errors: &mut Vec<FieldError>, field: &str, value: Option<i64>) {
  if matches!(value, Some(v) if v < 0) {
    errors.push(FieldError::new(field, "must not be negative"));
  }
}

fn check_non_negative(errors: &mut Vec<FieldError>, field: &str, value: Option<f64>) {
  if let Some(v) = value {
    if !v.is_finite() || v < 0.0 {
      errors.push(FieldError::new(field, "must be a non-negative number"));
    }
  }
}

fn check_positive(errors: &mut Vec<FieldError>, field: &str, value: Option<f64>) {
  if let Some(v) = value {
    if !v.is_finite() || v <= 0.0 {
      errors.push(FieldError::new(field, "must be a positive number"));
    }
  }
}

/// ---------------------------------------------------------------------------
/// Users
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
  #[serde(default)]
  pub username: String,
}

impl UserForm {
  /// Letters, digits and `@.+-_`, like the usual web-framework username rule
  pub fn validate(&self) -> Result<String, Vec<FieldError>> {
    let username = self.username.trim();
    let mut errors = Vec::new();

    if username.is_empty() {
      errors.push(FieldError::new("username", "is required"));
    } else if username.chars().count() > MAX_USERNAME_LEN {
      errors.push(FieldError::new(
        "username",
        format!("must be at most {} characters", MAX_USERNAME_LEN),
      ));
    } else if !username
      .chars()
      .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
      errors.push(FieldError::new(
        "username",
        "may contain only letters, digits and @/./+/-/_",
      ));
    }

    if errors.is_empty() {
      Ok(username.to_string())
    } else {
      Err(errors)
    }
  }
}

/// ---------------------------------------------------------------------------
/// Daily Metrics
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricForm {
  #[serde(default)]
  pub date: String,
  pub weight: Option<f64>,
  pub steps: Option<i64>,
  pub calories: Option<i64>,
}

impl MetricForm {
  pub fn validate(&self) -> Result<NewDailyMetric, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = match parse_date(&self.date) {
      Ok(d) => Some(d),
      Err(_) => {
        errors.push(FieldError::new("date", "must be a date in YYYY-MM-DD format"));
        None
      }
    };

    match self.weight {
      None => errors.push(FieldError::new("weight", "is required")),
      w => check_positive(&mut errors, "weight", w),
    }
    check_non_negative_int(&mut errors, "steps", self.steps);
    check_non_negative_int(&mut errors, "calories", self.calories);

    match (date, self.weight) {
      (Some(date), Some(weight)) if errors.is_empty() => Ok(NewDailyMetric {
        date,
        weight,
        steps: self.steps,
        calories: self.calories,
      }),
      _ => Err(errors),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout Entries
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutForm {
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub exercise: String,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub weight_kg: Option<f64>,
  pub duration_minutes: Option<f64>,
  pub distance_km: Option<f64>,
  pub notes: Option<String>,
}

impl WorkoutForm {
  pub fn validate(&self) -> Result<NewWorkoutEntry, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = match parse_date(&self.date) {
      Ok(d) => Some(d),
      Err(_) => {
        errors.push(FieldError::new("date", "must be a date in YYYY-MM-DD format"));
        None
      }
    };

    let exercise = self.exercise.trim();
    if exercise.is_empty() {
      errors.push(FieldError::new("exercise", "is required"));
    } else if exercise.chars().count() > MAX_EXERCISE_LEN {
      errors.push(FieldError::new(
        "exercise",
        format!("must be at most {} characters", MAX_EXERCISE_LEN),
      ));
    }

    check_non_negative_int(&mut errors, "sets", self.sets);
    check_non_negative_int(&mut errors, "reps", self.reps);
    check_non_negative(&mut errors, "weight_kg", self.weight_kg);
    check_non_negative(&mut errors, "duration_minutes", self.duration_minutes);
    check_non_negative(&mut errors, "distance_km", self.distance_km);

    match date {
      Some(date) if errors.is_empty() => Ok(NewWorkoutEntry {
        date,
        exercise: exercise.to_string(),
        sets: self.sets,
        reps: self.reps,
        weight_kg: self.weight_kg,
        duration_minutes: self.duration_minutes,
        distance_km: self.distance_km,
        notes: self
          .notes
          .as_deref()
          .map(str::trim)
          .filter(|n| !n.is_empty())
          .map(str::to_string),
      }),
      _ => Err(errors),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Profile
/// ---------------------------------------------------------------------------

/// Numeric profile fields must be positive when present
pub fn validate_profile(profile: &UserProfile) -> Result<(), Vec<FieldError>> {
  let mut errors = Vec::new();

  if matches!(profile.age, Some(age) if age <= 0) {
    errors.push(FieldError::new("age", "must be a positive number"));
  }
  check_positive(&mut errors, "height_cm", profile.height_cm);
  check_positive(&mut errors, "weight_kg", profile.weight_kg);

  if errors.is_empty() {
    Ok(())
  } else {
    Err(errors)
  }
}
