//! Resolution of the analysis backend's response shapes into canonical records.
//!
//! The backend has grown several producers over time (plain sentiment scoring,
//! translated chunks, LLM "advanced analysis"), and each names its fields a
//! little differently. Everything below the [`RawResult`] boundary works with
//! [`ReviewRecord`] only.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};
use crate::record::{AnalysisBatch, BatchSummary, ReviewRecord, SentimentLabel};

/// Topic entries arrive either as bare names or as scored objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTopic {
  Name(String),
  Scored {
    #[serde(alias = "name", alias = "theme", alias = "phrase")]
    topic: String,
    #[serde(default, alias = "score")]
    relevance: Option<f64>,
  },
}

impl RawTopic {
  pub fn name(&self) -> &str {
    match self {
      RawTopic::Name(name) => name,
      RawTopic::Scored { topic, .. } => topic,
    }
  }
}

/// Numbers from CSV columns are sometimes forwarded as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
  Number(f64),
  Text(String),
}

impl RawNumber {
  pub fn value(&self) -> Option<f64> {
    let value = match self {
      RawNumber::Number(n) => Some(*n),
      RawNumber::Text(s) => s.trim().parse::<f64>().ok(),
    };
    value.filter(|n| n.is_finite())
  }
}

/// Keep a field only when it has the expected shape; anything else reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`] for lists, dropping only the entries of the wrong shape.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::Array(items) => {
      Ok(Some(items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect()))
    }
    _ => Ok(None),
  }
}

/// Nested analysis object (`analysis` or `advanced_analysis`). Its fields come
/// from free-form LLM output, so none of them may reject the response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysis {
  #[serde(default, deserialize_with = "lenient")]
  pub sentiment: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub score: Option<RawNumber>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub topics: Option<Vec<RawTopic>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub key_phrases: Option<Vec<RawTopic>>,
}

/// One per-item result as produced by any of the backend's analyzers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResult {
  #[serde(default, deserialize_with = "lenient")]
  pub original_text: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub text: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub processed_text: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub sentiment: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub sentiment_score: Option<RawNumber>,
  #[serde(default, deserialize_with = "lenient")]
  pub score: Option<RawNumber>,
  #[serde(default, deserialize_with = "lenient")]
  pub rating: Option<RawNumber>,
  #[serde(default, deserialize_with = "lenient")]
  pub date: Option<String>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub topics: Option<Vec<RawTopic>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub key_phrases: Option<Vec<RawTopic>>,
  #[serde(default, deserialize_with = "lenient")]
  pub detected_language: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub language: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub was_translated: Option<bool>,
  #[serde(default, deserialize_with = "lenient")]
  pub analysis: Option<RawAnalysis>,
  #[serde(default, deserialize_with = "lenient")]
  pub advanced_analysis: Option<RawAnalysis>,
}

/// AI-derived fields, found either on the summary itself or nested in `ollama_insights`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInsights {
  #[serde(default, deserialize_with = "lenient")]
  pub overall_sentiment: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub sentiment_confidence: Option<RawNumber>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub key_themes: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub frequent_phrases: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub praise_points: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub complaints: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub key_insights: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient")]
  pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSummary {
  #[serde(flatten)]
  pub insights: RawInsights,
  #[serde(default, deserialize_with = "lenient")]
  pub ollama_insights: Option<RawInsights>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub common_topics: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub languages_detected: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient")]
  pub translations_performed: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
  #[serde(default, deserialize_with = "lenient")]
  pub filename: Option<String>,
  #[serde(default)]
  pub analysis_results: Vec<RawResult>,
  #[serde(default, deserialize_with = "lenient")]
  pub summary: Option<RawSummary>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub languages_detected: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient")]
  pub translations_performed: Option<usize>,
}

/// Batch responses are either the backend envelope or a bare array of items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBatchResponse {
  Items(Vec<RawResult>),
  Envelope(RawEnvelope),
}

/// Resolve one raw result into a canonical record. Pure: `today` stands in for
/// a missing date.
pub fn normalize_result(raw: &RawResult, index: usize, today: NaiveDate) -> ReviewRecord {
  build_record(raw, ReviewRecord::batch_id(index), today)
}

fn build_record(raw: &RawResult, id: String, today: NaiveDate) -> ReviewRecord {
  let original_text = first_text(&[raw.original_text.as_deref(), raw.text.as_deref()]);
  let was_translated = raw.was_translated.unwrap_or(false);

  let processed_text = raw
    .processed_text
    .as_ref()
    .filter(|processed| was_translated || processed.as_str() != original_text)
    .cloned();

  ReviewRecord {
    id,
    processed_text,
    sentiment_label: resolve_label(raw),
    sentiment_score: resolve_score(raw),
    rating: raw.rating.as_ref().and_then(RawNumber::value),
    date: resolve_date(raw.date.as_deref(), today),
    topics: resolve_topics(raw),
    key_phrases: resolve_key_phrases(raw),
    detected_language: raw
      .detected_language
      .clone()
      .or_else(|| raw.language.clone())
      .filter(|l| !l.trim().is_empty()),
    was_translated,
    original_text,
  }
}

fn first_text(candidates: &[Option<&str>]) -> String {
  candidates.iter().flatten().next().map(|s| s.to_string()).unwrap_or_default()
}

fn resolve_label(raw: &RawResult) -> SentimentLabel {
  raw
    .sentiment
    .as_deref()
    .or_else(|| raw.analysis.as_ref().and_then(|a| a.sentiment.as_deref()))
    .map(SentimentLabel::parse)
    .unwrap_or_default()
}

fn resolve_score(raw: &RawResult) -> f64 {
  let nested = raw.analysis.as_ref().and_then(|a| a.score.as_ref());

  [raw.sentiment_score.as_ref(), raw.score.as_ref(), nested]
    .into_iter()
    .flatten()
    .find_map(RawNumber::value)
    .map(|score| score.clamp(0.0, 1.0))
    .unwrap_or(ReviewRecord::DEFAULT_SCORE)
}

fn resolve_date(date: Option<&str>, today: NaiveDate) -> String {
  match date.map(str::trim) {
    Some(date) if !date.is_empty() => date.to_string(),
    _ => today.format("%Y-%m-%d").to_string(),
  }
}

fn resolve_topics(raw: &RawResult) -> Vec<String> {
  let nested = |analysis: &Option<RawAnalysis>| analysis.as_ref().and_then(|a| a.topics.clone());

  raw
    .topics
    .clone()
    .or_else(|| nested(&raw.advanced_analysis))
    .or_else(|| nested(&raw.analysis))
    .unwrap_or_default()
    .iter()
    .map(|topic| topic.name().trim().to_string())
    .filter(|topic| !topic.is_empty())
    .collect()
}

fn resolve_key_phrases(raw: &RawResult) -> Vec<String> {
  let nested =
    |analysis: &Option<RawAnalysis>| analysis.as_ref().and_then(|a| a.key_phrases.clone());

  raw
    .key_phrases
    .clone()
    .or_else(|| nested(&raw.advanced_analysis))
    .or_else(|| nested(&raw.analysis))
    .unwrap_or_default()
    .iter()
    .map(|phrase| phrase.name().trim().to_string())
    .filter(|phrase| !phrase.is_empty())
    .collect()
}

fn normalize_summary(raw: &RawSummary, envelope: Option<&RawEnvelope>) -> BatchSummary {
  let nested = raw.ollama_insights.as_ref();

  macro_rules! insight {
    ($field:ident) => {
      raw.insights.$field.clone().or_else(|| nested.and_then(|n| n.$field.clone()))
    };
  }

  BatchSummary {
    overall_sentiment: insight!(overall_sentiment),
    sentiment_confidence: insight!(sentiment_confidence).and_then(|n| n.value()),
    key_themes: insight!(key_themes).unwrap_or_default(),
    frequent_phrases: insight!(frequent_phrases).unwrap_or_default(),
    praise_points: insight!(praise_points).unwrap_or_default(),
    complaints: insight!(complaints).unwrap_or_default(),
    // The top-level list repeats the backend's own computed lines; only the AI lines are kept.
    key_insights: nested.and_then(|n| n.key_insights.clone()).unwrap_or_default(),
    recommendation: insight!(recommendation),
    common_topics: raw.common_topics.clone().unwrap_or_default(),
    languages_detected: raw
      .languages_detected
      .clone()
      .or_else(|| envelope.and_then(|e| e.languages_detected.clone()))
      .unwrap_or_default(),
    translations_performed: raw
      .translations_performed
      .or_else(|| envelope.and_then(|e| e.translations_performed)),
  }
}

/// Turn a parsed batch response into an [`AnalysisBatch`].
pub fn normalize_batch(response: &RawBatchResponse, today: NaiveDate) -> AnalysisBatch {
  match response {
    RawBatchResponse::Items(items) => AnalysisBatch::new(normalize_items(items, today), None),
    RawBatchResponse::Envelope(envelope) => {
      let summary = match &envelope.summary {
        Some(summary) => Some(normalize_summary(summary, Some(envelope))),
        None if envelope.languages_detected.is_some()
          || envelope.translations_performed.is_some() =>
        {
          Some(normalize_summary(&RawSummary::default(), Some(envelope)))
        }
        None => None,
      };

      let batch = AnalysisBatch::new(normalize_items(&envelope.analysis_results, today), summary);
      match &envelope.filename {
        Some(filename) => batch.with_source(filename.clone()),
        None => batch,
      }
    }
  }
}

fn normalize_items(items: &[RawResult], today: NaiveDate) -> Vec<ReviewRecord> {
  items.iter().enumerate().map(|(index, raw)| normalize_result(raw, index, today)).collect()
}

/// Reject `{"error": ...}` payloads before shape resolution. Any non-null
/// `error` counts, whatever its type.
pub(crate) fn check_upstream_error(value: &serde_json::Value) -> Result<()> {
  match value.get("error") {
    None | Some(serde_json::Value::Null) => Ok(()),
    Some(error) => {
      let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
      warn!("Analysis service reported an error: {}", message);
      Err(ReviewError::upstream(message))
    }
  }
}

/// Parse the body of a batch (file upload) analysis response.
pub fn parse_batch_response(body: &str, today: NaiveDate) -> Result<AnalysisBatch> {
  let value: serde_json::Value = serde_json::from_str(body)?;
  check_upstream_error(&value)?;

  let response: RawBatchResponse = serde_json::from_value(value)?;
  let batch = normalize_batch(&response, today);
  debug!("Normalized batch response with {} records", batch.len());
  Ok(batch)
}

/// Parse the body of a single-review analysis response into a one-record batch.
pub fn parse_single_response(
  body: &str,
  rating: Option<f64>,
  today: NaiveDate,
) -> Result<AnalysisBatch> {
  let value: serde_json::Value = serde_json::from_str(body)?;
  check_upstream_error(&value)?;

  let raw: RawResult = serde_json::from_value(value)?;
  let mut record = build_record(&raw, ReviewRecord::MANUAL_ID.to_string(), today);
  if record.rating.is_none() {
    record.rating = rating.filter(|r| r.is_finite());
  }

  Ok(AnalysisBatch::new(vec![record], None))
}
