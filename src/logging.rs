//! Structured logging setup

use std::env;
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  /// One JSON object per line
  Json,
  /// Human readable, multi-field
  Pretty,
  /// Single line, no target
  Compact,
}

impl LogFormat {
  pub fn from_env() -> Self {
    match env::var("LOG_FORMAT").as_deref() {
      Ok("json") => LogFormat::Json,
      Ok("compact") => LogFormat::Compact,
      _ => LogFormat::Pretty,
    }
  }
}

fn build_filter() -> EnvFilter {
  let base = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

  let mut filter = EnvFilter::new(base);
  for directive in ["hyper=warn", "reqwest=warn", "sqlx=warn", "tower_http=info"] {
    if let Ok(d) = directive.parse() {
      filter = filter.add_directive(d);
    }
  }
  filter
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init() {
  let registry = tracing_subscriber::registry().with(build_filter());

  let result = match LogFormat::from_env() {
    LogFormat::Json => registry
      .with(fmt::layer().json().with_target(true).with_writer(io::stdout))
      .try_init(),
    LogFormat::Pretty => registry
      .with(fmt::layer().with_target(true).with_writer(io::stdout))
      .try_init(),
    LogFormat::Compact => registry
      .with(fmt::layer().compact().with_target(false).with_writer(io::stdout))
      .try_init(),
  };

  if let Err(e) = result {
    eprintln!("Logging already initialized: {}", e);
  }
}
