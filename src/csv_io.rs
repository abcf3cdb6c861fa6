//! CSV import/export for daily metrics and workout entries
//!
//! Import validates the whole file before anything is written: one bad row
//! rejects the upload and every bad row is reported with its line number.

use crate::forms::{FieldError, MetricForm, WorkoutForm};
use crate::models::{NewDailyMetric, NewWorkoutEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const METRIC_HEADERS: [&str; 4] = ["date", "weight", "steps", "calories"];
pub const WORKOUT_HEADERS: [&str; 8] = [
  "date", "exercise", "sets", "reps", "weight", "duration", "distance", "notes",
];

#[derive(Error, Debug)]
pub enum CsvError {
  #[error("CSV is missing required column '{0}'")]
  MissingColumn(String),

  #[error("CSV contains invalid rows")]
  InvalidRows(Vec<FieldError>),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("CSV output is not valid UTF-8")]
  Encoding,
}

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct MetricRecord {
  date: String,
  weight: Option<f64>,
  #[serde(default)]
  steps: Option<i64>,
  #[serde(default)]
  calories: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkoutRecord {
  date: String,
  exercise: String,
  #[serde(default)]
  sets: Option<i64>,
  #[serde(default)]
  reps: Option<i64>,
  #[serde(default)]
  weight: Option<f64>,
  #[serde(default)]
  duration: Option<f64>,
  #[serde(default)]
  distance: Option<f64>,
  #[serde(default)]
  notes: Option<String>,
}

impl From<MetricRecord> for MetricForm {
  fn from(record: MetricRecord) -> Self {
    Self {
      date: record.date,
      weight: record.weight,
      steps: record.steps,
      calories: record.calories,
    }
  }
}

impl From<WorkoutRecord> for WorkoutForm {
  fn from(record: WorkoutRecord) -> Self {
    Self {
      date: record.date,
      exercise: record.exercise,
      sets: record.sets,
      reps: record.reps,
      weight_kg: record.weight,
      duration_minutes: record.duration,
      distance_km: record.distance,
      notes: record.notes,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Import
/// ---------------------------------------------------------------------------

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
  csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(data)
}

fn require_columns(reader: &mut csv::Reader<&[u8]>, required: &[&str]) -> Result<(), CsvError> {
  let headers = reader.headers()?.clone();
  for column in required {
    if !headers.iter().any(|h| h == *column) {
      return Err(CsvError::MissingColumn(column.to_string()));
    }
  }
  Ok(())
}

/// Deserialize and validate every row; `validate` turns a record into its
/// insert value or a list of field errors.
fn parse_rows<R, T, F>(data: &[u8], required: &[&str], validate: F) -> Result<Vec<T>, CsvError>
where
  R: for<'de> Deserialize<'de>,
  F: Fn(R) -> Result<T, Vec<FieldError>>,
{
  let mut rdr = reader(data);
  require_columns(&mut rdr, required)?;

  let mut parsed = Vec::new();
  let mut errors = Vec::new();

  for (index, result) in rdr.deserialize::<R>().enumerate() {
    // Line 1 is the header
    let row = format!("row {}", index + 2);
    match result {
      Ok(record) => match validate(record) {
        Ok(value) => parsed.push(value),
        Err(field_errors) => errors.extend(
          field_errors
            .into_iter()
            .map(|e| FieldError::new(format!("{}: {}", row, e.field), e.message)),
        ),
      },
      Err(e) => errors.push(FieldError::new(row, e.to_string())),
    }
  }

  if errors.is_empty() {
    Ok(parsed)
  } else {
    Err(CsvError::InvalidRows(errors))
  }
}

pub fn parse_metrics_csv(data: &[u8]) -> Result<Vec<NewDailyMetric>, CsvError> {
  parse_rows(data, &["date", "weight"], |record: MetricRecord| {
    MetricForm::from(record).validate()
  })
}

pub fn parse_workouts_csv(data: &[u8]) -> Result<Vec<NewWorkoutEntry>, CsvError> {
  parse_rows(data, &["date", "exercise"], |record: WorkoutRecord| {
    WorkoutForm::from(record).validate()
  })
}

/// ---------------------------------------------------------------------------
/// Export
/// ---------------------------------------------------------------------------

fn write_rows<T: Serialize>(headers: &[&str], rows: impl Iterator<Item = T>) -> Result<String, CsvError> {
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(Vec::new());

  wtr.write_record(headers)?;
  for row in rows {
    wtr.serialize(row)?;
  }

  let bytes = wtr
    .into_inner()
    .map_err(|e| CsvError::Csv(csv::Error::from(e.into_error())))?;
  String::from_utf8(bytes).map_err(|_| CsvError::Encoding)
}

pub fn metrics_to_csv(metrics: &[NewDailyMetric]) -> Result<String, CsvError> {
  write_rows(
    &METRIC_HEADERS,
    metrics.iter().map(|m| MetricRecord {
      date: m.date.format("%Y-%m-%d").to_string(),
      weight: Some(m.weight),
      steps: m.steps,
      calories: m.calories,
    }),
  )
}

pub fn workouts_to_csv(entries: &[NewWorkoutEntry]) -> Result<String, CsvError> {
  write_rows(
    &WORKOUT_HEADERS,
    entries.iter().map(|e| WorkoutRecord {
      date: e.date.format("%Y-%m-%d").to_string(),
      exercise: e.exercise.clone(),
      sets: e.sets,
      reps: e.reps,
      weight: e.weight_kg,
      duration: e.duration_minutes,
      distance: e.distance_km,
      notes: e.notes.clone(),
    }),
  )
}
