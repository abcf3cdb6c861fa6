//! Deterministic statistics layer for body metrics and workouts
//!
//! Everything here is pure: callers load rows through the storage adapter,
//! convert them to [`MetricPoint`]s and get back chart series and summaries.
//! The plan prompt and the dashboard both read from these numbers.

use crate::models::WorkoutEntry;
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Secondary field names carried on a [`MetricPoint`]
pub const STEPS: &str = "steps";
pub const CALORIES: &str = "calories";

/// Default chart windows (days)
pub const SHORT_WINDOW: usize = 7;
pub const LONG_WINDOW: usize = 30;

/// ---------------------------------------------------------------------------
/// Errors
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),
}

/// ---------------------------------------------------------------------------
/// Metric Points
/// ---------------------------------------------------------------------------

/// A dated sample: the primary value (body weight for daily metrics) plus any
/// named secondary values recorded the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
  pub date: NaiveDate,
  pub value: f64,
  #[serde(default)]
  pub secondary: BTreeMap<String, f64>,
}

/// Which number of a [`MetricPoint`] to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
  Value,
  Secondary(&'a str),
}

impl MetricPoint {
  pub fn new(date: NaiveDate, value: f64) -> Self {
    Self {
      date,
      value,
      secondary: BTreeMap::new(),
    }
  }

  pub fn with_secondary(mut self, name: &str, value: Option<f64>) -> Self {
    if let Some(v) = value {
      self.secondary.insert(name.to_string(), v);
    }
    self
  }

  pub fn get(&self, field: Field<'_>) -> Option<f64> {
    match field {
      Field::Value => Some(self.value),
      Field::Secondary(name) => self.secondary.get(name).copied(),
    }
  }
}

/// Fail unless points are in ascending date order
pub fn ensure_sorted(points: &[MetricPoint]) -> Result<(), StatsError> {
  match points.windows(2).find(|pair| pair[0].date > pair[1].date) {
    Some(pair) => Err(StatsError::InvalidArgument(format!(
      "points must be sorted by date ({} comes after {})",
      pair[0].date, pair[1].date
    ))),
    None => Ok(()),
  }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, StatsError> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|_| StatsError::InvalidArgument(format!("malformed date '{}', expected YYYY-MM-DD", raw)))
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// ---------------------------------------------------------------------------
/// Moving Averages
/// ---------------------------------------------------------------------------

/// How the first `window - 1` positions are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
  /// Average whatever samples exist so far, up to `window` of them. Never null.
  Expanding,
  /// Null until `window` samples are available.
  #[default]
  Strict,
}

impl WindowPolicy {
  pub fn as_str(&self) -> &'static str {
    match self {
      WindowPolicy::Expanding => "expanding",
      WindowPolicy::Strict => "strict",
    }
  }
}

impl FromStr for WindowPolicy {
  type Err = StatsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "expanding" => Ok(WindowPolicy::Expanding),
      "strict" => Ok(WindowPolicy::Strict),
      other => Err(StatsError::InvalidArgument(format!(
        "unknown window policy '{}', expected 'strict' or 'expanding'",
        other
      ))),
    }
  }
}

/// Convert an externally supplied window size, rejecting zero and negatives
pub fn checked_window(window: i64) -> Result<usize, StatsError> {
  if window <= 0 {
    return Err(StatsError::InvalidArgument(format!(
      "window must be at least 1, got {}",
      window
    )));
  }
  usize::try_from(window).map_err(|_| StatsError::InvalidArgument(format!("window {} too large", window)))
}

/// Trailing moving average over an ordered series.
///
/// Output has the same length as the input; every defined entry is rounded to
/// 2 decimal places.
pub fn moving_average(
  series: &[f64],
  window: usize,
  policy: WindowPolicy,
) -> Result<Vec<Option<f64>>, StatsError> {
  if window == 0 {
    return Err(StatsError::InvalidArgument("window must be at least 1, got 0".to_string()));
  }

  let averages = (0..series.len())
    .map(|i| {
      if policy == WindowPolicy::Strict && i + 1 < window {
        return None;
      }
      let start = (i + 1).saturating_sub(window);
      let slice = &series[start..=i];
      Some(round2(slice.iter().sum::<f64>() / slice.len() as f64))
    })
    .collect();

  Ok(averages)
}

/// ---------------------------------------------------------------------------
/// Summary Statistics
/// ---------------------------------------------------------------------------

/// Count / mean / max / min of a series. All optional fields are absent for an
/// empty series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
  pub count: usize,
  pub mean: Option<f64>,
  pub max: Option<f64>,
  pub min: Option<f64>,
}

pub fn summary_stats(series: &[f64]) -> SummaryStats {
  if series.is_empty() {
    return SummaryStats::default();
  }

  let count = series.len();
  let sum: f64 = series.iter().sum();
  let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
  let min = series.iter().copied().fold(f64::INFINITY, f64::min);

  SummaryStats {
    count,
    mean: Some(round2(sum / count as f64)),
    max: Some(max),
    min: Some(min),
  }
}

/// First day of the trailing window of `days` days ending at `as_of`.
/// `days` must be positive and the start must be a representable date.
pub fn window_start(as_of: NaiveDate, days: i64) -> Result<NaiveDate, StatsError> {
  if days <= 0 {
    return Err(StatsError::InvalidArgument(format!("days must be positive, got {}", days)));
  }
  TimeDelta::try_days(days)
    .and_then(|span| as_of.checked_sub_signed(span))
    .ok_or_else(|| StatsError::InvalidArgument(format!("days {} is out of range", days)))
}

/// Points dated within `days` days of `as_of`, inclusive on both ends
pub fn points_in_window(
  points: &[MetricPoint],
  as_of: NaiveDate,
  days: i64,
) -> Result<Vec<&MetricPoint>, StatsError> {
  let since = window_start(as_of, days)?;
  Ok(
    points
      .iter()
      .filter(|p| p.date >= since && p.date <= as_of)
      .collect(),
  )
}

/// Summary of one field across all points that carry it
pub fn field_stats(points: &[&MetricPoint], field: Field<'_>) -> SummaryStats {
  let values: Vec<f64> = points.iter().filter_map(|p| p.get(field)).collect();
  summary_stats(&values)
}

/// Summary restricted to the trailing `days` days ending at `as_of`
pub fn windowed_stats(
  points: &[MetricPoint],
  field: Field<'_>,
  as_of: NaiveDate,
  days: i64,
) -> Result<SummaryStats, StatsError> {
  Ok(field_stats(&points_in_window(points, as_of, days)?, field))
}

/// Weight / steps / calories summaries side by side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
  pub weight: SummaryStats,
  pub steps: SummaryStats,
  pub calories: SummaryStats,
}

impl MetricsSummary {
  pub fn compute(points: &[&MetricPoint]) -> Self {
    Self {
      weight: field_stats(points, Field::Value),
      steps: field_stats(points, Field::Secondary(STEPS)),
      calories: field_stats(points, Field::Secondary(CALORIES)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Chart Series
/// ---------------------------------------------------------------------------

/// One field shaped for charting: x axis, raw values and named moving averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
  pub dates: Vec<NaiveDate>,
  pub values: Vec<f64>,
  pub moving_averages: BTreeMap<String, Vec<Option<f64>>>,
}

/// Build a chart series for `field`, skipping days that do not carry it.
/// Moving averages are keyed `"{window}d"`.
pub fn chart_series(
  points: &[MetricPoint],
  field: Field<'_>,
  windows: &[usize],
  policy: WindowPolicy,
) -> Result<ChartSeries, StatsError> {
  ensure_sorted(points)?;

  let (dates, values): (Vec<NaiveDate>, Vec<f64>) = points
    .iter()
    .filter_map(|p| p.get(field).map(|v| (p.date, v)))
    .unzip();

  let mut moving_averages = BTreeMap::new();
  for &window in windows {
    moving_averages.insert(format!("{}d", window), moving_average(&values, window, policy)?);
  }

  Ok(ChartSeries {
    dates,
    values,
    moving_averages,
  })
}

/// ---------------------------------------------------------------------------
/// Workout Totals
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTotals {
  /// Number of logged entries
  pub entries: usize,
  /// Distinct training days
  pub active_days: usize,
  pub total_sets: i64,
  /// sum(sets * reps * weight) over entries that carry all three
  pub total_volume_kg: f64,
  pub total_duration_minutes: f64,
  pub total_distance_km: f64,
}

impl WorkoutTotals {
  pub fn compute(entries: &[&WorkoutEntry]) -> Self {
    let mut days: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
    days.sort();
    days.dedup();

    let total_volume_kg = entries
      .iter()
      .filter_map(|e| match (e.sets, e.reps, e.weight_kg) {
        (Some(sets), Some(reps), Some(weight)) => Some(sets as f64 * reps as f64 * weight),
        _ => None,
      })
      .sum::<f64>();

    Self {
      entries: entries.len(),
      active_days: days.len(),
      total_sets: entries.iter().filter_map(|e| e.sets).sum(),
      total_volume_kg: round2(total_volume_kg),
      total_duration_minutes: round2(entries.iter().filter_map(|e| e.duration_minutes).sum()),
      total_distance_km: round2(entries.iter().filter_map(|e| e.distance_km).sum()),
    }
  }
}

/// Entries dated within `days` days of `as_of`, inclusive
pub fn entries_in_window(
  entries: &[WorkoutEntry],
  as_of: NaiveDate,
  days: i64,
) -> Result<Vec<&WorkoutEntry>, StatsError> {
  let since = window_start(as_of, days)?;
  Ok(
    entries
      .iter()
      .filter(|e| e.date >= since && e.date <= as_of)
      .collect(),
  )
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
