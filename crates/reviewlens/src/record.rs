//! Canonical review records and the batch that holds them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
  Positive,
  #[default]
  Neutral,
  Negative,
}

impl SentimentLabel {
  /// Fixed enumeration order, also used to break ties
  pub const ALL: [SentimentLabel; 3] =
    [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative];

  /// Case-insensitive exact match against the three labels; anything else is neutral.
  pub fn parse(raw: &str) -> Self {
    match raw.trim().to_lowercase().as_str() {
      "positive" => SentimentLabel::Positive,
      "negative" => SentimentLabel::Negative,
      _ => SentimentLabel::Neutral,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SentimentLabel::Positive => "positive",
      SentimentLabel::Neutral => "neutral",
      SentimentLabel::Negative => "negative",
    }
  }

  pub fn emoji(&self) -> &'static str {
    match self {
      SentimentLabel::Positive => "😊",
      SentimentLabel::Neutral => "😐",
      SentimentLabel::Negative => "😞",
    }
  }
}

impl fmt::Display for SentimentLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
  pub id: String,
  pub original_text: String,
  pub processed_text: Option<String>,
  pub sentiment_label: SentimentLabel,
  pub sentiment_score: f64,
  pub rating: Option<f64>,
  /// `YYYY-MM-DD`
  pub date: String,
  pub topics: Vec<String>,
  pub key_phrases: Vec<String>,
  pub detected_language: Option<String>,
  pub was_translated: bool,
}

impl ReviewRecord {
  pub const DEFAULT_SCORE: f64 = 0.5;
  pub const MANUAL_ID: &'static str = "manual-review-1";

  /// Synthesized id for the record at `index` (0-based) within a batch
  pub fn batch_id(index: usize) -> String {
    format!("review-{}", index + 1)
  }

  /// Text shown in tables: the translation when one happened, else the original
  pub fn display_text(&self) -> &str {
    match &self.processed_text {
      Some(text) if self.was_translated => text,
      _ => &self.original_text,
    }
  }
}

/// AI-derived metadata delivered alongside a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
  pub overall_sentiment: Option<String>,
  pub sentiment_confidence: Option<f64>,
  pub key_themes: Vec<String>,
  pub frequent_phrases: Vec<String>,
  pub praise_points: Vec<String>,
  pub complaints: Vec<String>,
  pub key_insights: Vec<String>,
  pub recommendation: Option<String>,
  pub common_topics: Vec<String>,
  pub languages_detected: Vec<String>,
  pub translations_performed: Option<usize>,
}

/// Everything one upload or one manual submission produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBatch {
  pub records: Vec<ReviewRecord>,
  pub summary: Option<BatchSummary>,
  /// Uploaded file name, when the batch came from a file
  pub source: Option<String>,
}

impl AnalysisBatch {
  pub fn new(records: Vec<ReviewRecord>, summary: Option<BatchSummary>) -> Self {
    Self { records, summary, source: None }
  }

  pub fn with_source(mut self, source: impl Into<String>) -> Self {
    self.source = Some(source.into());
    self
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn key_themes(&self) -> &[String] {
    self.summary.as_ref().map(|s| s.key_themes.as_slice()).unwrap_or(&[])
  }

  pub fn frequent_phrases(&self) -> &[String] {
    self.summary.as_ref().map(|s| s.frequent_phrases.as_slice()).unwrap_or(&[])
  }

  /// Languages reported by the backend, else collected from the records
  pub fn languages(&self) -> Vec<String> {
    if let Some(summary) = &self.summary {
      if !summary.languages_detected.is_empty() {
        return summary.languages_detected.clone();
      }
    }

    let mut languages: Vec<String> = Vec::new();
    for language in self.records.iter().filter_map(|r| r.detected_language.as_ref()) {
      if !languages.contains(language) {
        languages.push(language.clone());
      }
    }
    languages
  }

  pub fn translations_performed(&self) -> usize {
    self
      .summary
      .as_ref()
      .and_then(|s| s.translations_performed)
      .unwrap_or_else(|| self.records.iter().filter(|r| r.was_translated).count())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: &str, language: Option<&str>, translated: bool) -> ReviewRecord {
    ReviewRecord {
      id: id.to_string(),
      original_text: "Sehr gut".to_string(),
      processed_text: Some("Very good".to_string()),
      sentiment_label: SentimentLabel::Positive,
      sentiment_score: 0.8,
      rating: None,
      date: "2024-01-01".to_string(),
      topics: Vec::new(),
      key_phrases: Vec::new(),
      detected_language: language.map(|l| l.to_string()),
      was_translated: translated,
    }
  }

  #[test]
  fn test_label_parse_is_case_insensitive_exact_match() {
    assert_eq!(SentimentLabel::parse("POSITIVE"), SentimentLabel::Positive);
    assert_eq!(SentimentLabel::parse("Negative"), SentimentLabel::Negative);
    assert_eq!(SentimentLabel::parse("Happy"), SentimentLabel::Neutral);
    assert_eq!(SentimentLabel::parse("positively"), SentimentLabel::Neutral);
    assert_eq!(SentimentLabel::parse(""), SentimentLabel::Neutral);
  }

  #[test]
  fn test_label_defaults_to_neutral() {
    assert_eq!(SentimentLabel::default(), SentimentLabel::Neutral);
    assert_eq!(ReviewRecord::default().sentiment_label, SentimentLabel::Neutral);
  }

  #[test]
  fn test_label_serializes_lowercase() {
    let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
    assert_eq!(json, "\"negative\"");
  }

  #[test]
  fn test_batch_id_is_one_based() {
    assert_eq!(ReviewRecord::batch_id(0), "review-1");
    assert_eq!(ReviewRecord::batch_id(22), "review-23");
  }

  #[test]
  fn test_display_text_prefers_translation() {
    let translated = record("review-1", Some("de"), true);
    assert_eq!(translated.display_text(), "Very good");

    let untouched = record("review-2", Some("en"), false);
    assert_eq!(untouched.display_text(), "Sehr gut");
  }

  #[test]
  fn test_languages_fall_back_to_records_in_first_seen_order() {
    let batch = AnalysisBatch::new(
      vec![
        record("review-1", Some("de"), true),
        record("review-2", Some("en"), false),
        record("review-3", Some("de"), true),
      ],
      None,
    );

    assert_eq!(batch.languages(), vec!["de".to_string(), "en".to_string()]);
    assert_eq!(batch.translations_performed(), 2);
  }
}
