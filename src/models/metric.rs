use crate::stats::{MetricPoint, CALORIES, STEPS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyMetric {
  pub id: i64,
  pub user_id: i64,
  pub date: NaiveDate,
  pub weight: f64,
  pub steps: Option<i64>,
  pub calories: Option<i64>,
}

/// For inserting new metrics (without id, user_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDailyMetric {
  pub date: NaiveDate,
  pub weight: f64,
  pub steps: Option<i64>,
  pub calories: Option<i64>,
}

impl From<&DailyMetric> for MetricPoint {
  fn from(metric: &DailyMetric) -> Self {
    MetricPoint::new(metric.date, metric.weight)
      .with_secondary(STEPS, metric.steps.map(|s| s as f64))
      .with_secondary(CALORIES, metric.calories.map(|c| c as f64))
  }
}

impl From<&DailyMetric> for NewDailyMetric {
  fn from(metric: &DailyMetric) -> Self {
    Self {
      date: metric.date,
      weight: metric.weight,
      steps: metric.steps,
      calories: metric.calories,
    }
  }
}
