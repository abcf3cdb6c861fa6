use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ---------------------------------------------------------------------------
/// Profile Choices
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
  Other,
  Unspecified,
}

impl Gender {
  pub fn as_str(&self) -> &'static str {
    match self {
      Gender::Male => "male",
      Gender::Female => "female",
      Gender::Other => "other",
      Gender::Unspecified => "unspecified",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Gender::Male => "Male",
      Gender::Female => "Female",
      Gender::Other => "Other",
      Gender::Unspecified => "Not specified",
    }
  }
}

impl FromStr for Gender {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" => Ok(Gender::Male),
      "female" => Ok(Gender::Female),
      "other" => Ok(Gender::Other),
      "unspecified" => Ok(Gender::Unspecified),
      _ => Err(format!("unknown gender '{}'", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl FitnessLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      FitnessLevel::Beginner => "beginner",
      FitnessLevel::Intermediate => "intermediate",
      FitnessLevel::Advanced => "advanced",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      FitnessLevel::Beginner => "Beginner",
      FitnessLevel::Intermediate => "Intermediate",
      FitnessLevel::Advanced => "Advanced",
    }
  }
}

impl FromStr for FitnessLevel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beginner" => Ok(FitnessLevel::Beginner),
      "intermediate" => Ok(FitnessLevel::Intermediate),
      "advanced" => Ok(FitnessLevel::Advanced),
      _ => Err(format!("unknown fitness level '{}'", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  FatLoss,
  MuscleGain,
  Endurance,
  #[default]
  GeneralFitness,
}

impl Goal {
  pub fn as_str(&self) -> &'static str {
    match self {
      Goal::FatLoss => "fat_loss",
      Goal::MuscleGain => "muscle_gain",
      Goal::Endurance => "endurance",
      Goal::GeneralFitness => "general_fitness",
    }
  }
}

impl FromStr for Goal {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "fat_loss" => Ok(Goal::FatLoss),
      "muscle_gain" => Ok(Goal::MuscleGain),
      "endurance" => Ok(Goal::Endurance),
      "general_fitness" => Ok(Goal::GeneralFitness),
      _ => Err(format!("unknown goal '{}'", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// User Profile
/// ---------------------------------------------------------------------------

pub const DEFAULT_AGE: i64 = 25;
pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Static physical / goal attributes used to personalise plan generation.
/// Every field is optional; the `effective_*` accessors apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  #[serde(default)]
  pub gender: Option<Gender>,
  #[serde(default)]
  pub age: Option<i64>,
  #[serde(default)]
  pub height_cm: Option<f64>,
  #[serde(default)]
  pub weight_kg: Option<f64>,
  #[serde(default)]
  pub fitness_level: Option<FitnessLevel>,
  #[serde(default)]
  pub goal: Option<Goal>,
}

impl UserProfile {
  pub fn gender_label(&self) -> &'static str {
    self.gender.unwrap_or(Gender::Unspecified).label()
  }

  pub fn effective_age(&self) -> i64 {
    self.age.unwrap_or(DEFAULT_AGE)
  }

  pub fn effective_height_cm(&self) -> f64 {
    self.height_cm.unwrap_or(DEFAULT_HEIGHT_CM)
  }

  pub fn effective_weight_kg(&self) -> f64 {
    self.weight_kg.unwrap_or(DEFAULT_WEIGHT_KG)
  }

  pub fn effective_fitness_level(&self) -> FitnessLevel {
    self.fitness_level.unwrap_or_default()
  }

  pub fn effective_goal(&self) -> Goal {
    self.goal.unwrap_or_default()
  }
}

/// Row shape of `user_profiles`; choices are stored as their `as_str` text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
  pub gender: Option<String>,
  pub age: Option<i64>,
  pub height_cm: Option<f64>,
  pub weight_kg: Option<f64>,
  pub fitness_level: Option<String>,
  pub primary_goal: Option<String>,
}

impl From<ProfileRow> for UserProfile {
  fn from(row: ProfileRow) -> Self {
    Self {
      gender: row.gender.and_then(|g| g.parse().ok()),
      age: row.age,
      height_cm: row.height_cm,
      weight_kg: row.weight_kg,
      fitness_level: row.fitness_level.and_then(|f| f.parse().ok()),
      goal: row.primary_goal.and_then(|g| g.parse().ok()),
    }
  }
}
