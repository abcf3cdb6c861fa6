use crate::config::AppConfig;
use crate::llm::TextGenerator;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use tracing::info;

pub type DbPool = SqlitePool;

/// Application state handed explicitly to every request handler
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  pub generator: Arc<dyn TextGenerator>,
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
  info!(url = %database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
