//! LLM integration for plan generation
//!
//! This module handles communication with the Gemini API. The remote model is
//! treated as an opaque text-in / text-out function behind [`TextGenerator`],
//! so plan generation can be driven by a stub in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, Serialize)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Quota exceeded: {0}")]
  Quota(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

impl LlmError {
  /// Short category name surfaced to callers alongside the message
  pub fn category(&self) -> &'static str {
    match self {
      LlmError::MissingApiKey => "MissingApiKey",
      LlmError::Request(_) => "RequestError",
      LlmError::Api(_) => "ApiError",
      LlmError::Quota(_) => "QuotaExceeded",
      LlmError::Parse(_) => "ParseError",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Transport Seam
/// ---------------------------------------------------------------------------

/// A remote text-generation model: one prompt in, one text response out
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, LlmError>;
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiRequest {
  contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
  candidates: Option<Vec<Candidate>>,
  error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<GeminiContent>,
  #[serde(rename = "finishReason")]
  #[allow(dead_code)]
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_base: String,
  model: String,
}

impl GeminiClient {
  pub fn new(api_base: impl Into<String>, model: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_base: api_base.into(),
      model: model.into(),
    }
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  /// `{base}/models/{model}:generateContent?key=...`
  fn endpoint(&self, api_key: &str) -> Result<Url, LlmError> {
    let raw = format!(
      "{}/models/{}:generateContent",
      self.api_base.trim_end_matches('/'),
      self.model
    );
    Url::parse_with_params(&raw, &[("key", api_key)])
      .map_err(|e| LlmError::Request(format!("invalid endpoint {}: {}", raw, e)))
  }

  fn map_api_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
      .map(|r| r.error.message)
      .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
      LlmError::Quota(message)
    } else {
      LlmError::Api(message)
    }
  }
}

#[async_trait]
impl TextGenerator for GeminiClient {
  async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
    let request = GeminiRequest {
      contents: vec![GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart {
          text: Some(prompt.to_string()),
        }],
      }],
    };

    debug!(model = %self.model, prompt_chars = prompt.len(), "Sending request to Gemini");

    let response = self
      .client
      .post(self.endpoint(api_key)?)
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.without_url().to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.without_url().to_string()))?;

    if !status.is_success() {
      error!(status = %status, "Gemini API error");
      return Err(Self::map_api_error(status, &body));
    }

    let gemini_response: GeminiResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    if let Some(err) = gemini_response.error {
      return Err(LlmError::Api(err.message));
    }

    // Text of the first part of the first candidate
    gemini_response
      .candidates
      .as_ref()
      .and_then(|c| c.first())
      .and_then(|c| c.content.as_ref())
      .and_then(|c| c.parts.iter().find_map(|p| p.text.clone()))
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))
  }
}

/// Remove literal ```json / ``` fence markers and surrounding whitespace
pub fn strip_code_fences(text: &str) -> String {
  let mut cleaned = text.to_string();

  // Opening fences swallow the whitespace that follows them
  while let Some(start) = cleaned.find("```json") {
    let after = &cleaned[start + 7..];
    let skipped = after.len() - after.trim_start().len();
    cleaned.replace_range(start..start + 7 + skipped, "");
  }

  // Remaining bare fences swallow the whitespace before them
  while let Some(start) = cleaned.find("```") {
    let before = cleaned[..start].trim_end().len();
    cleaned.replace_range(before..start + 3, "");
  }

  cleaned.trim().to_string()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
