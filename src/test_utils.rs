//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - A stub text generator that records its calls
//! - Helper assertions

use crate::config::AppConfig;
use crate::db::AppState;
use crate::llm::{LlmError, TextGenerator, GEMINI_API_BASE};
use crate::models::WorkoutEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Insert a user and return its id
pub async fn seed_test_user(pool: &SqlitePool, username: &str) -> i64 {
  sqlx::query("INSERT INTO users (username) VALUES (?1)")
    .bind(username)
    .execute(pool)
    .await
    .expect("Failed to insert test user")
    .last_insert_rowid()
}

/// Seed `count` consecutive days of metrics starting at `start`.
/// Weight climbs by 0.5 kg a day from 80 kg; steps only on even days.
pub async fn seed_test_metrics(pool: &SqlitePool, user_id: i64, start: NaiveDate, count: usize) {
  for i in 0..count {
    let date = start + chrono::Duration::days(i as i64);
    let steps = if i % 2 == 0 { Some(8000 + i as i64 * 100) } else { None };

    sqlx::query(
      r#"
      INSERT INTO daily_metrics (user_id, date, weight, steps, calories)
      VALUES (?1, ?2, ?3, ?4, ?5)
      "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(80.0 + i as f64 * 0.5)
    .bind(steps)
    .bind(2000 + i as i64 * 10)
    .execute(pool)
    .await
    .expect("Failed to insert test metric");
  }
}

/// Seed one strength entry per day for `count` days starting at `start`
pub async fn seed_test_workouts(pool: &SqlitePool, user_id: i64, start: NaiveDate, count: usize) {
  for i in 0..count {
    let date = start + chrono::Duration::days(i as i64);
    sqlx::query(
      r#"
      INSERT INTO workout_entries (user_id, date, exercise, sets, reps, weight_kg)
      VALUES (?1, ?2, ?3, 3, 10, ?4)
      "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(if i % 2 == 0 { "Squat" } else { "Bench Press" })
    .bind(50.0 + i as f64)
    .execute(pool)
    .await
    .expect("Failed to insert test workout");
  }
}

/// App state over `pool` with the given generator
pub fn test_state(pool: SqlitePool, generator: Arc<dyn TextGenerator>) -> Arc<AppState> {
  Arc::new(AppState {
    db: pool,
    config: AppConfig {
      database_url: "sqlite::memory:".to_string(),
      bind_addr: ([127, 0, 0, 1], 0).into(),
      gemini_model: "gemini-test".to_string(),
      gemini_api_base: GEMINI_API_BASE.to_string(),
    },
    generator,
  })
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_workout_entry(
  exercise: &str,
  date: NaiveDate,
  sets: Option<i64>,
  reps: Option<i64>,
  weight_kg: Option<f64>,
) -> WorkoutEntry {
  WorkoutEntry {
    id: 0,
    user_id: 1,
    date,
    exercise: exercise.to_string(),
    sets,
    reps,
    weight_kg,
    duration_minutes: None,
    distance_km: None,
    notes: None,
  }
}

/// A small but complete plan in the model's response format
pub fn mock_plan_json() -> String {
  serde_json::json!({
    "training_plan": {
      "summary": "Upper/lower split with progressive overload.",
      "weeks": [{
        "week_number": 1,
        "focus": "Foundation & Form",
        "schedule": [
          {
            "day": "Day 1",
            "type": "Upper Body Push",
            "exercises": [
              {"name": "Bench Press", "sets": "3", "reps": "8-12", "notes": "Control the descent"}
            ],
            "cardio": "10 min LISS"
          },
          {"day": "Day 2", "type": "Rest Day", "exercises": [], "cardio": null}
        ]
      }]
    },
    "diet_plan": {
      "calories": "2200 kcal",
      "macros": {"protein": "150g", "carbs": "220g", "fats": "70g"},
      "guidelines": ["Prioritize protein", "Stay hydrated"],
      "meals": [
        {"type": "Breakfast", "options": ["Oats with berries", "Greek yogurt"]},
        {"type": "Snacks", "options": ["Almonds"]}
      ]
    }
  })
  .to_string()
}

/// ---------------------------------------------------------------------------
/// Stub Generator
/// ---------------------------------------------------------------------------

/// Canned [`TextGenerator`] that counts invocations and keeps the last input
pub struct StubGenerator {
  reply: Result<String, LlmError>,
  calls: AtomicUsize,
  last_prompt: Mutex<Option<String>>,
  last_api_key: Mutex<Option<String>>,
}

impl StubGenerator {
  pub fn replying(text: &str) -> Self {
    Self::with_reply(Ok(text.to_string()))
  }

  pub fn failing(error: LlmError) -> Self {
    Self::with_reply(Err(error))
  }

  fn with_reply(reply: Result<String, LlmError>) -> Self {
    Self {
      reply,
      calls: AtomicUsize::new(0),
      last_prompt: Mutex::new(None),
      last_api_key: Mutex::new(None),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_prompt(&self) -> Option<String> {
    self.last_prompt.lock().unwrap().clone()
  }

  pub fn last_api_key(&self) -> Option<String> {
    self.last_api_key.lock().unwrap().clone()
  }
}

#[async_trait]
impl TextGenerator for StubGenerator {
  async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
    *self.last_api_key.lock().unwrap() = Some(api_key.to_string());
    self.reply.clone()
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'daily_metrics', 'workout_entries', 'user_profiles')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_metrics_returns_correct_count() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "seed").await;

    seed_test_metrics(&pool, user_id, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 5).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_metrics WHERE user_id = ?1")
      .bind(user_id)
      .fetch_one(&pool)
      .await
      .expect("Failed to count metrics");
    assert_eq!(count, 5);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_stub_generator_records_calls() {
    let stub = StubGenerator::replying("ok");
    assert_eq!(stub.calls(), 0);

    let text = stub.generate("k", "prompt").await.unwrap();
    assert_eq!(text, "ok");
    assert_eq!(stub.calls(), 1);
    assert_eq!(stub.last_prompt().as_deref(), Some("prompt"));
  }
}
