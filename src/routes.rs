use crate::commands::{self, data, library, metrics, plan, profile, reports, users, workouts};
use crate::db::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(commands::health))
    .route("/api/exercises", get(library::list_exercises))
    .route("/api/exercises/:key", get(library::get_exercise))
    .route("/api/users", post(users::create_user))
    .route("/api/users/:user_id", get(users::get_user))
    // Daily metrics
    .route(
      "/api/users/:user_id/metrics",
      get(metrics::list_metrics).post(metrics::add_metric),
    )
    .route(
      "/api/users/:user_id/metrics/:metric_id",
      get(metrics::get_metric)
        .put(metrics::update_metric)
        .delete(metrics::delete_metric),
    )
    // Workout log
    .route(
      "/api/users/:user_id/workouts",
      get(workouts::list_workouts).post(workouts::add_workout),
    )
    .route(
      "/api/users/:user_id/workouts/:entry_id",
      axum::routing::delete(workouts::delete_workout),
    )
    // CSV
    .route(
      "/api/users/:user_id/metrics.csv",
      get(data::export_metrics).post(data::import_metrics),
    )
    .route(
      "/api/users/:user_id/workouts.csv",
      get(data::export_workouts).post(data::import_workouts),
    )
    // Reports
    .route("/api/users/:user_id/stats", get(reports::get_stats))
    .route("/api/users/:user_id/dashboard", get(reports::get_dashboard))
    // Profile and plan
    .route(
      "/api/users/:user_id/profile",
      get(profile::get_profile).put(profile::update_profile),
    )
    .route("/api/users/:user_id/plan", post(plan::generate_user_plan))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GEMINI_API_KEY_ENV;
  use crate::llm::LlmError;
  use crate::test_utils::{
    mock_plan_json, seed_test_metrics, seed_test_user, seed_test_workouts, setup_test_db,
    test_state, StubGenerator,
  };
  use axum::body::{to_bytes, Body};
  use axum::http::{header, Method, Request, StatusCode};
  use chrono::NaiveDate;
  use serde_json::{json, Value};
  use serial_test::serial;
  use tower::ServiceExt;

  async fn test_app() -> (Router, Arc<StubGenerator>) {
    let pool = setup_test_db().await;
    let stub = Arc::new(StubGenerator::replying(&mock_plan_json()));
    (router(test_state(pool, stub.clone())), stub)
  }

  async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string())),
      None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn send_text(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "text/csv")
      .body(Body::from(body.to_string()))
      .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn create_user(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, Method::POST, "/api/users", Some(json!({ "username": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
  }

  #[tokio::test]
  async fn test_health() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn test_duplicate_username_conflicts() {
    let (app, _) = test_app().await;
    create_user(&app, "runner").await;

    let (status, body) = send(&app, Method::POST, "/api/users", Some(json!({ "username": "runner" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("runner"));

    let (status, body) = send(&app, Method::POST, "/api/users", Some(json!({ "username": "bad name!" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "username");
  }

  #[tokio::test]
  async fn test_unknown_user_is_not_found() {
    let (app, _) = test_app().await;
    let (status, _) = send(&app, Method::GET, "/api/users/99/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn test_metric_crud() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "lifter").await;
    let base = format!("/api/users/{}/metrics", user_id);

    let (status, created) = send(
      &app,
      Method::POST,
      &base,
      Some(json!({ "date": "2025-03-01", "weight": 82.5, "steps": 9000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let metric_id = created["id"].as_i64().unwrap();

    // Same day again
    let (status, _) = send(&app, Method::POST, &base, Some(json!({ "date": "2025-03-01", "weight": 81.0 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let item = format!("{}/{}", base, metric_id);
    let (status, updated) = send(
      &app,
      Method::PUT,
      &item,
      Some(json!({ "date": "2025-03-01", "weight": 81.5, "calories": 2100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["weight"], 81.5);
    assert_eq!(updated["steps"], Value::Null);

    let (status, _) = send(&app, Method::DELETE, &item, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &item, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn test_metric_update_to_taken_date_conflicts() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "mover").await;
    let base = format!("/api/users/{}/metrics", user_id);

    send(&app, Method::POST, &base, Some(json!({ "date": "2025-03-01", "weight": 80.0 }))).await;
    let (_, second) = send(&app, Method::POST, &base, Some(json!({ "date": "2025-03-02", "weight": 79.5 }))).await;
    let second_id = second["id"].as_i64().unwrap();

    let (status, _) = send(
      &app,
      Method::PUT,
      &format!("{}/{}", base, second_id),
      Some(json!({ "date": "2025-03-01", "weight": 79.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, kept) = send(&app, Method::GET, &format!("{}/{}", base, second_id), None).await;
    assert_eq!(kept["date"], "2025-03-02");
  }

  #[tokio::test]
  async fn test_item_routes_report_unknown_user() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "owner").await;
    let (_, metric) = send(
      &app,
      Method::POST,
      &format!("/api/users/{}/metrics", user_id),
      Some(json!({ "date": "2025-03-01", "weight": 80.0 })),
    )
    .await;
    let metric_id = metric["id"].as_i64().unwrap();

    let metric_uri = format!("/api/users/999/metrics/{}", metric_id);
    for method in [Method::GET, Method::DELETE] {
      let (status, body) = send(&app, method, &metric_uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND);
      assert_eq!(body["error"], "User 999 not found");
    }

    let (status, body) = send(
      &app,
      Method::PUT,
      &metric_uri,
      Some(json!({ "date": "2025-03-01", "weight": 70.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User 999 not found");

    let (status, body) = send(&app, Method::DELETE, "/api/users/999/workouts/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User 999 not found");
  }

  #[tokio::test]
  async fn test_metric_validation_errors() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "v").await;

    let (status, body) = send(
      &app,
      Method::POST,
      &format!("/api/users/{}/metrics", user_id),
      Some(json!({ "date": "03/01/2025", "weight": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["details"]
      .as_array()
      .unwrap()
      .iter()
      .map(|d| d["field"].as_str().unwrap())
      .collect();
    assert_eq!(fields, vec!["date", "weight"]);
  }

  #[tokio::test]
  async fn test_metrics_csv_import_then_export() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "csv").await;
    let uri = format!("/api/users/{}/metrics.csv", user_id);

    let csv = "date,weight,steps,calories\n2025-01-02,80.5,,2000\n2025-01-01,81,9000,\n";
    let (status, body) = send_text(&app, Method::POST, &uri, csv).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"imported\":2"));

    let (status, exported) = send_text(&app, Method::GET, &uri, "").await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines[0], "date,weight,steps,calories");
    assert_eq!(lines[1], "2025-01-01,81.0,9000,");
    assert_eq!(lines[2], "2025-01-02,80.5,,2000");

    // Re-import overwrites the existing day
    let (status, _) = send_text(&app, Method::POST, &uri, "date,weight\n2025-01-01,79.0\n").await;
    assert_eq!(status, StatusCode::OK);
    let (_, metrics) = send(&app, Method::GET, &format!("/api/users/{}/metrics", user_id), None).await;
    assert_eq!(metrics.as_array().unwrap().len(), 2);
    assert_eq!(metrics[0]["weight"], 79.0);
  }

  #[tokio::test]
  async fn test_workouts_csv_import_appends() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "appender").await;
    let uri = format!("/api/users/{}/workouts.csv", user_id);

    let csv = "date,exercise,sets,reps,weight,duration,distance,notes\n\
               2025-02-01,Squat,3,5,100,,,\n\
               2025-02-01,Run,,,,30,5.0,easy\n";
    for _ in 0..2 {
      let (status, body) = send_text(&app, Method::POST, &uri, csv).await;
      assert_eq!(status, StatusCode::OK);
      assert!(body.contains("\"imported\":2"));
    }

    let (_, entries) = send(&app, Method::GET, &format!("/api/users/{}/workouts", user_id), None).await;
    assert_eq!(entries.as_array().unwrap().len(), 4);

    let (status, exported) = send_text(&app, Method::GET, &uri, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exported.lines().count(), 5);
  }

  #[tokio::test]
  async fn test_csv_import_rejects_bad_rows() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "badcsv").await;
    let uri = format!("/api/users/{}/metrics.csv", user_id);

    let csv = "date,weight\n2025-01-01,80\nnot-a-date,81\n";
    let (status, body) = send_text(&app, Method::POST, &uri, csv).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("row 3: date"));

    // Nothing from the batch was stored
    let (_, metrics) = send(&app, Method::GET, &format!("/api/users/{}/metrics", user_id), None).await;
    assert!(metrics.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_stats_window_and_bad_date() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "stats").await;
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    seed_test_metrics(&pool, user_id, start, 10).await;
    seed_test_workouts(&pool, user_id, start, 4).await;
    let app = router(test_state(pool, Arc::new(StubGenerator::replying("{}"))));

    let uri = format!("/api/users/{}/stats?days=2&as_of=2025-01-10", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["all_time"]["weight"]["count"], 10);
    // 2025-01-08 through 2025-01-10
    assert_eq!(body["recent"]["weight"]["count"], 3);
    assert_eq!(body["recent"]["weight"]["max"], 84.5);
    assert_eq!(body["workouts_all_time"]["entries"], 4);
    assert_eq!(body["workouts_recent"]["entries"], 0);

    let uri = format!("/api/users/{}/stats?as_of=10-01-2025", user_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/users/{}/stats?days=0", user_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/users/{}/stats?days=-5", user_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_stats_days_out_of_calendar_range() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "farback").await;
    seed_test_metrics(&pool, user_id, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 3).await;
    let app = router(test_state(pool, Arc::new(StubGenerator::replying("{}"))));

    let uri = format!("/api/users/{}/stats?days=9000000000000&as_of=2025-01-10", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("out of range"));

    // A long but representable window covers everything
    let uri = format!("/api/users/{}/stats?days=100000&as_of=2025-01-10", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recent"]["weight"]["count"], 3);
  }

  #[tokio::test]
  async fn test_dashboard_series() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "dash").await;
    seed_test_metrics(&pool, user_id, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 8).await;
    let app = router(test_state(pool, Arc::new(StubGenerator::replying("{}"))));

    let uri = format!("/api/users/{}/dashboard?window=3", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policy"], "strict");
    assert_eq!(body["weight"]["values"].as_array().unwrap().len(), 8);
    assert_eq!(body["weight"]["moving_averages"]["3d"][1], Value::Null);
    assert_eq!(body["weight"]["moving_averages"]["3d"][2], 80.5);
    assert_eq!(body["weight"]["moving_averages"]["7d"][6], 81.5);
    assert_eq!(body["weight"]["moving_averages"]["30d"][7], Value::Null);
    // Steps are logged every other day
    assert_eq!(body["steps"]["values"].as_array().unwrap().len(), 4);

    let uri = format!("/api/users/{}/dashboard?policy=expanding", user_id);
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["weight"]["moving_averages"]["30d"][0], 80.0);

    let uri = format!("/api/users/{}/dashboard?window=9000000000000", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let huge = body["weight"]["moving_averages"]["9000000000000d"].as_array().unwrap();
    assert_eq!(huge.len(), 8);
    assert!(huge.iter().all(Value::is_null));

    let uri = format!("/api/users/{}/dashboard?window=0", user_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/users/{}/dashboard?policy=sideways", user_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_profile_update_and_validation() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "profile").await;
    let uri = format!("/api/users/{}/profile", user_id);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["goal"], Value::Null);

    let (status, body) = send(
      &app,
      Method::PUT,
      &uri,
      Some(json!({ "gender": "female", "age": 31, "goal": "muscle_gain", "fitness_level": "intermediate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["goal"], "muscle_gain");
    assert_eq!(body["age"], 31);

    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "age": -4 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn test_exercise_library() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/exercises", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 12);

    let (status, _) = send(&app, Method::GET, "/api/exercises/not-a-move", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  /// Runs `f` on a fresh runtime so env overrides cover the whole request
  fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(f)
  }

  #[test]
  #[serial]
  fn test_plan_without_api_key_skips_model() {
    temp_env::with_var_unset(GEMINI_API_KEY_ENV, || {
      block_on(async {
        let (app, stub) = test_app().await;
        let user_id = create_user(&app, "nokey").await;

        let (status, body) = send(&app, Method::POST, &format!("/api/users/{}/plan", user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failure");
        assert_eq!(body["reason"], "MissingApiKey");
        assert_eq!(stub.calls(), 0);
      })
    });
  }

  #[test]
  #[serial]
  fn test_plan_success_uses_logged_workouts() {
    temp_env::with_var(GEMINI_API_KEY_ENV, Some("test-key"), || {
      block_on(async {
        let pool = setup_test_db().await;
        let user_id = seed_test_user(&pool, "planner").await;
        let today = chrono::Utc::now().date_naive();
        seed_test_workouts(&pool, user_id, today - chrono::Duration::days(3), 3).await;

        let stub = Arc::new(StubGenerator::replying(&mock_plan_json()));
        let app = router(test_state(pool, stub.clone()));

        let (status, body) = send(&app, Method::POST, &format!("/api/users/{}/plan", user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["diet_plan"]["macros"]["protein"], "150g");

        assert_eq!(stub.calls(), 1);
        assert_eq!(stub.last_api_key().as_deref(), Some("test-key"));
        assert!(stub.last_prompt().unwrap().contains("Squat"));
      })
    });
  }

  #[test]
  #[serial]
  fn test_plan_remote_failure_is_reported_in_body() {
    temp_env::with_var(GEMINI_API_KEY_ENV, Some("test-key"), || {
      block_on(async {
        let pool = setup_test_db().await;
        let user_id = seed_test_user(&pool, "quota").await;
        let stub = Arc::new(StubGenerator::failing(LlmError::Quota("slow down".to_string())));
        let app = router(test_state(pool, stub.clone()));

        let (status, body) = send(
          &app,
          Method::POST,
          &format!("/api/users/{}/plan", user_id),
          Some(json!({ "training_history": "Runs 3x a week" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failure");
        assert_eq!(body["reason"], "NetworkOrApiError");
        assert!(stub.last_prompt().unwrap().contains("Runs 3x a week"));
      })
    });
  }
}
