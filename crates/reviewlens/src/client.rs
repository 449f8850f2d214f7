//! HTTP client for the review analysis backend
//!
//! Every call is bounded by the configured timeout and resolves to exactly
//! one of: a normalized [`AnalysisBatch`], a validation error raised before
//! anything is sent, a transport error, or the backend's own error message.

use chrono::Local;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Result, ReviewError};
use crate::normalize::{check_upstream_error, parse_batch_response, parse_single_response};
use crate::record::AnalysisBatch;

/// Health checks use a shorter bound than analysis calls
const HEALTH_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
  text: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  language: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
  pub status: String,
  #[serde(default)]
  pub timestamp: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
}

pub struct AnalysisClient {
  client: Client,
  settings: Settings,
}

impl AnalysisClient {
  pub fn new(settings: Settings) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, settings })
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.settings.server_url.trim_end_matches('/'), path)
  }

  /// Send `request` and read the whole body within `limit_secs`.
  async fn exchange(&self, request: RequestBuilder, limit_secs: u64) -> Result<String> {
    let call = async {
      let response = request.send().await?;
      let status = response.status();
      let body = response.text().await?;
      Ok::<_, reqwest::Error>((status, body))
    };

    let (status, body) = match timeout(Duration::from_secs(limit_secs), call).await {
      Err(_) => return Err(ReviewError::timeout(limit_secs)),
      Ok(Err(e)) if e.is_timeout() => return Err(ReviewError::timeout(limit_secs)),
      Ok(Err(e)) => return Err(e.into()),
      Ok(Ok(exchange)) => exchange,
    };

    if status.is_success() {
      return Ok(body);
    }

    Err(error_from_status(status, &body))
  }

  /// Check that the backend is reachable
  pub async fn health_check(&self) -> Result<HealthStatus> {
    let request = self.client.get(self.url("/api/health"));
    let body = self.exchange(request, HEALTH_TIMEOUT_SECS).await?;
    Ok(serde_json::from_str(&body)?)
  }

  /// Analyze a single typed review. `rating` is attached to the resulting record.
  pub async fn analyze_text(
    &self,
    text: &str,
    language: Option<&str>,
    rating: Option<f64>,
  ) -> Result<AnalysisBatch> {
    let text = text.trim();
    if text.is_empty() {
      return Err(ReviewError::validation("Please enter a review to analyze"));
    }

    info!("Submitting single review for analysis ({} chars)", text.chars().count());
    let request = self.client.post(self.url("/api/analyze")).json(&AnalyzeRequest { text, language });
    let body = self.exchange(request, self.settings.timeout_secs).await?;

    parse_single_response(&body, rating, Local::now().date_naive())
  }

  /// Upload a review file for batch analysis.
  pub async fn upload_file(&self, path: &Path) -> Result<AnalysisBatch> {
    let file_name = self.check_upload(path).await?;
    let bytes = tokio::fs::read(path)
      .await
      .map_err(|e| ReviewError::validation(format!("Could not read {}: {e}", path.display())))?;

    info!("Uploading {} ({} bytes) for analysis", file_name, bytes.len());
    let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));
    let request = self.client.post(self.url("/api/upload")).multipart(form);
    let body = self.exchange(request, self.settings.timeout_secs).await?;

    let batch = parse_batch_response(&body, Local::now().date_naive())?;
    debug!("Upload of {} produced {} records", file_name, batch.len());
    Ok(match batch.source {
      Some(_) => batch,
      None => batch.with_source(file_name),
    })
  }

  /// Pre-flight checks so obviously bad uploads never leave the machine.
  async fn check_upload(&self, path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
      .await
      .map_err(|_| ReviewError::validation(format!("No file selected: {} does not exist", path.display())))?;

    if !metadata.is_file() {
      return Err(ReviewError::validation(format!("{} is not a file", path.display())));
    }

    if !self.settings.is_allowed_extension(path) {
      return Err(ReviewError::validation(format!(
        "File type not allowed. Please upload {} files.",
        self
          .settings
          .allowed_extensions
          .iter()
          .map(|ext| ext.to_uppercase())
          .collect::<Vec<_>>()
          .join(" or ")
      )));
    }

    if metadata.len() > self.settings.max_upload_bytes {
      return Err(ReviewError::validation(format!(
        "File is too large ({} bytes, limit {} bytes)",
        metadata.len(),
        self.settings.max_upload_bytes
      )));
    }

    if metadata.len() == 0 {
      return Err(ReviewError::validation(format!("{} is empty", path.display())));
    }

    Ok(path.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default())
  }
}

/// Non-success statuses carry either the backend's `{"error": ...}` payload or
/// something we cannot read (proxy pages, crashes).
fn error_from_status(status: StatusCode, body: &str) -> ReviewError {
  let upstream = serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|value| check_upstream_error(&value).err());
  match upstream {
    Some(error) => {
      warn!("Analysis service returned {}", status);
      error
    }
    None => ReviewError::malformed(format!("HTTP {status}")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_from_status_prefers_payload() {
    let err = error_from_status(StatusCode::BAD_REQUEST, r#"{"error": "No text provided"}"#);
    assert_eq!(err.to_string(), "No text provided");

    let err =
      error_from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": {"detail": "model offline"}}"#);
    assert!(matches!(err, ReviewError::Upstream { .. }));
    assert!(err.to_string().contains("model offline"));

    let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
    assert!(err.to_string().contains("HTTP 502 Bad Gateway"));
  }

  #[test]
  fn test_url_joins_without_double_slash() {
    let settings = Settings { server_url: "http://localhost:3000/".to_string(), ..Settings::default() };
    let client = AnalysisClient::new(settings).unwrap();
    assert_eq!(client.url("/api/health"), "http://localhost:3000/api/health");
  }
}
