pub mod commands;
pub mod config;
pub mod csv_io;
pub mod db;
pub mod error;
pub mod exercises;
pub mod forms;
pub mod llm;
pub mod logging;
pub mod models;
pub mod planner;
pub mod routes;
pub mod stats;

#[cfg(test)]
pub mod test_utils;

use config::AppConfig;
use db::AppState;
use llm::GeminiClient;
use std::sync::Arc;
use tracing::info;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  logging::init();

  let config = AppConfig::from_env()?;
  let pool = db::initialize_db(&config.database_url).await?;
  let generator = GeminiClient::new(config.gemini_api_base.clone(), config.gemini_model.clone());

  info!(model = generator.model(), "Plan generator ready");
  if config::gemini_api_key().is_none() {
    info!("GEMINI_API_KEY not set; plan generation will report a configuration error");
  }

  let bind_addr = config.bind_addr;
  let state = Arc::new(AppState {
    db: pool,
    config,
    generator: Arc::new(generator),
  });

  let listener = tokio::net::TcpListener::bind(bind_addr).await?;
  info!(addr = %bind_addr, "FitTrack listening");

  axum::serve(listener, routes::router(state)).await?;
  Ok(())
}
