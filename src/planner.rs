//! Four-week training + diet plan generation
//!
//! Builds a prompt from the user's profile (and optionally their recent
//! training), sends it to the remote model exactly once, and turns whatever
//! comes back into a [`PlanResult`]. Remote failures are values, not errors:
//! callers always get something they can show the user.

use crate::llm::{strip_code_fences, LlmError, TextGenerator};
use crate::models::{Goal, UserProfile, WorkoutEntry};
use crate::stats::entries_in_window;
use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Response contract requested from the model, embedded verbatim in the prompt
const PLAN_SCHEMA: &str = include_str!("prompts/plan_schema.txt");

const DEFAULT_TRAINING_HISTORY: &str = "
* **Workout Frequency:** Based on your fitness level, we recommend starting with 3-4 times per week.
* **Workout Types:** A balanced mix of strength training and cardio.
";

/// How far back the generated training history looks (days)
pub const HISTORY_DAYS: i64 = 30;
const HISTORY_SAMPLE_DAYS: usize = 5;
const HISTORY_TOP_EXERCISES: usize = 5;

const CONFIG_HINT: &str = "Please check your .env file and API key.";
const NETWORK_HINT: &str = "Please check your internet connection and API quota.";

/// ---------------------------------------------------------------------------
/// Prompt
/// ---------------------------------------------------------------------------

pub fn goal_description(goal: Goal) -> &'static str {
  match goal {
    Goal::MuscleGain => {
      "Build lean muscle mass with a focus on hypertrophy, aiming to gain 1-2 kg of muscle."
    }
    Goal::FatLoss => {
      "Lose body fat while preserving as much muscle as possible, aiming to lose 2-3 kg of fat."
    }
    Goal::Endurance | Goal::GeneralFitness => "Improve overall fitness and health.",
  }
}

pub fn build_prompt(profile: &UserProfile, training_history: Option<&str>) -> String {
  let history = training_history
    .filter(|h| !h.trim().is_empty())
    .unwrap_or(DEFAULT_TRAINING_HISTORY);

  format!(
    r#"
You are an expert AI personal trainer and nutritionist named FitTrack AI. Your task is to create a comprehensive, personalized, and actionable 4-week training and diet plan based on the user's detailed profile.

### User Profile
* **Gender:** {gender}
* **Age:** {age}
* **Height:** {height} cm
* **Weight:** {weight} kg
* **Fitness Level:** {level}
* **Primary Goal:** {goal}

### Recent Training History
{history}

### Your Task
Generate a detailed 4-week plan in strict JSON format. Do not include any markdown formatting (like ```json) or explanatory text outside the JSON object. The JSON structure must be exactly as follows:

{schema}"#,
    gender = profile.gender_label(),
    age = profile.effective_age(),
    height = profile.effective_height_cm(),
    weight = profile.effective_weight_kg(),
    level = profile.effective_fitness_level().label(),
    goal = goal_description(profile.effective_goal()),
    history = history,
    schema = PLAN_SCHEMA,
  )
}

/// Markdown summary of the user's recent training, or `None` when nothing was
/// logged in the last [`HISTORY_DAYS`] days.
pub fn summarize_training_history(entries: &[WorkoutEntry], as_of: NaiveDate) -> Option<String> {
  let recent = entries_in_window(entries, as_of, HISTORY_DAYS).ok()?;
  if recent.is_empty() {
    return None;
  }

  let mut by_day: BTreeMap<NaiveDate, Vec<&WorkoutEntry>> = BTreeMap::new();
  let mut by_exercise: BTreeMap<&str, usize> = BTreeMap::new();
  for entry in &recent {
    by_day.entry(entry.date).or_default().push(entry);
    *by_exercise.entry(entry.exercise.as_str()).or_default() += 1;
  }

  let per_week = by_day.len() as f64 / (HISTORY_DAYS as f64 / 7.0);

  let mut exercises: Vec<(&str, usize)> = by_exercise.into_iter().collect();
  exercises.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
  let types: Vec<&str> = exercises
    .iter()
    .take(HISTORY_TOP_EXERCISES)
    .map(|(name, _)| *name)
    .collect();

  let mut summary = format!(
    "\n* **Workout Frequency:** Averages {:.1} sessions per week over the last {} days.\n* **Workout Types:** {}\n* **Sample Workouts:**\n",
    per_week,
    HISTORY_DAYS,
    types.join(", ")
  );

  let skip = by_day.len().saturating_sub(HISTORY_SAMPLE_DAYS);
  for (date, day_entries) in by_day.iter().skip(skip) {
    let described: Vec<String> = day_entries.iter().map(|e| describe_entry(e)).collect();
    summary.push_str(&format!(
      "    * **{}:** {}\n",
      date.format("%Y-%m-%d"),
      described.join("; ")
    ));
  }

  Some(summary)
}

fn describe_entry(entry: &WorkoutEntry) -> String {
  let mut parts = vec![entry.exercise.clone()];
  if let (Some(sets), Some(reps)) = (entry.sets, entry.reps) {
    parts.push(format!("{}x{}", sets, reps));
  }
  if let Some(weight) = entry.weight_kg {
    parts.push(format!("@ {} kg", weight));
  }
  if let Some(minutes) = entry.duration_minutes {
    parts.push(format!("{} min", minutes));
  }
  if let Some(km) = entry.distance_km {
    parts.push(format!("{} km", km));
  }
  parts.join(" ")
}

/// ---------------------------------------------------------------------------
/// Plan Types (the model's response contract)
/// ---------------------------------------------------------------------------

/// Strings in the contract sometimes come back as numbers or null
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(String::new()),
    Some(Value::String(s)) => Ok(s),
    Some(Value::Number(n)) => Ok(n.to_string()),
    Some(Value::Bool(b)) => Ok(b.to_string()),
    Some(other) => Err(D::Error::custom(format!("expected a string, found {}", other))),
  }
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<String>, D::Error> {
  let value = lenient_string(deserializer)?;
  if value.is_empty() || value.eq_ignore_ascii_case("null") {
    Ok(None)
  } else {
    Ok(Some(value))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
  #[serde(default, deserialize_with = "lenient_string")]
  pub summary: String,
  #[serde(default)]
  pub weeks: Vec<PlanWeek>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanWeek {
  #[serde(default)]
  pub week_number: u32,
  #[serde(default, deserialize_with = "lenient_string")]
  pub focus: String,
  #[serde(default)]
  pub schedule: Vec<PlanDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
  #[serde(default, deserialize_with = "lenient_string")]
  pub day: String,
  #[serde(rename = "type", default, deserialize_with = "lenient_string")]
  pub day_type: String,
  #[serde(default)]
  pub exercises: Vec<PlanExercise>,
  #[serde(default, deserialize_with = "lenient_optional_string")]
  pub cardio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
  #[serde(default, deserialize_with = "lenient_string")]
  pub name: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub sets: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub reps: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
  #[serde(default, deserialize_with = "lenient_string")]
  pub calories: String,
  #[serde(default)]
  pub macros: Macros,
  #[serde(default)]
  pub guidelines: Vec<String>,
  #[serde(default)]
  pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
  #[serde(default, deserialize_with = "lenient_string")]
  pub protein: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub carbs: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub fats: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
  #[serde(rename = "type", default, deserialize_with = "lenient_string")]
  pub meal_type: String,
  #[serde(default)]
  pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanEnvelope {
  training_plan: TrainingPlan,
  diet_plan: DietPlan,
}

/// ---------------------------------------------------------------------------
/// Plan Result
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
  MissingApiKey,
  NetworkOrApiError,
  MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanResult {
  Success {
    training_plan: TrainingPlan,
    diet_plan: DietPlan,
  },
  Failure {
    reason: FailureReason,
    message: String,
    /// The model's text as received, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
  },
}

impl PlanResult {
  fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
    let details = match reason {
      FailureReason::MissingApiKey => Some(CONFIG_HINT.to_string()),
      FailureReason::NetworkOrApiError => Some(NETWORK_HINT.to_string()),
      FailureReason::MalformedResponse => None,
    };
    PlanResult::Failure {
      reason,
      message: message.into(),
      raw_text: None,
      details,
    }
  }

  fn malformed(message: impl Into<String>, raw_text: &str) -> Self {
    PlanResult::Failure {
      reason: FailureReason::MalformedResponse,
      message: message.into(),
      raw_text: Some(raw_text.to_string()),
      details: None,
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, PlanResult::Success { .. })
  }
}

/// Turn the model's raw text into a plan.
///
/// Both `training_plan` and `diet_plan` must be present as objects; anything
/// else is reported as a malformed response carrying the raw text.
pub fn parse_plan_response(raw_text: &str) -> PlanResult {
  let cleaned = strip_code_fences(raw_text);

  let value: Value = match serde_json::from_str(&cleaned) {
    Ok(v) => v,
    Err(e) => {
      return PlanResult::malformed(format!("Failed to parse AI response as JSON: {}", e), raw_text)
    }
  };

  for key in ["training_plan", "diet_plan"] {
    if !value.get(key).is_some_and(Value::is_object) {
      return PlanResult::malformed(format!("AI response is missing required key '{}'", key), raw_text);
    }
  }

  match serde_json::from_value::<PlanEnvelope>(value) {
    Ok(plan) => PlanResult::Success {
      training_plan: plan.training_plan,
      diet_plan: plan.diet_plan,
    },
    Err(e) => PlanResult::malformed(format!("AI response does not match the plan structure: {}", e), raw_text),
  }
}

/// Generate a plan with a single call to the remote model.
///
/// A missing or blank `api_key` short-circuits before any request is made.
pub async fn generate_plan(
  generator: &dyn TextGenerator,
  api_key: Option<&str>,
  profile: &UserProfile,
  training_history: Option<&str>,
) -> PlanResult {
  let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
    warn!("Plan requested without GEMINI_API_KEY configured");
    return PlanResult::failure(
      FailureReason::MissingApiKey,
      "Configuration Error: GEMINI_API_KEY not found. Please set your Gemini API key.",
    );
  };

  let prompt = build_prompt(profile, training_history);
  info!(
    goal = profile.effective_goal().as_str(),
    level = profile.effective_fitness_level().as_str(),
    "Requesting training plan"
  );

  let raw_text = match generator.generate(api_key, &prompt).await {
    Ok(text) => text,
    Err(LlmError::MissingApiKey) => {
      return PlanResult::failure(FailureReason::MissingApiKey, "Configuration Error: API key rejected as missing")
    }
    Err(e) => {
      warn!(category = e.category(), error = %e, "Plan generation failed");
      return PlanResult::failure(
        FailureReason::NetworkOrApiError,
        format!("Error generating plan ({}): {}", e.category(), e),
      );
    }
  };

  let result = parse_plan_response(&raw_text);
  if !result.is_success() {
    warn!(response_chars = raw_text.len(), "Model returned an unusable plan");
  }
  result
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
