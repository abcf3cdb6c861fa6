use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub created_at: Option<DateTime<Utc>>,
}
