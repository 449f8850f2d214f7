//! Summary statistics over an analysis batch.

use serde::Serialize;
use tracing::debug;

use crate::record::{AnalysisBatch, SentimentLabel};
use crate::topics::TopicIndex;

/// Number of AI-supplied insights appended after the computed ones
const AI_INSIGHT_LIMIT: usize = 3;

/// Number of topics listed in the "Top topics" insight line
const INSIGHT_TOPIC_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
  pub positive: usize,
  pub neutral: usize,
  pub negative: usize,
}

impl SentimentCounts {
  pub fn get(&self, label: SentimentLabel) -> usize {
    match label {
      SentimentLabel::Positive => self.positive,
      SentimentLabel::Neutral => self.neutral,
      SentimentLabel::Negative => self.negative,
    }
  }

  fn increment(&mut self, label: SentimentLabel) {
    match label {
      SentimentLabel::Positive => self.positive += 1,
      SentimentLabel::Neutral => self.neutral += 1,
      SentimentLabel::Negative => self.negative += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.positive + self.neutral + self.negative
  }

  /// Label with the highest count; ties go to the earlier label in [`SentimentLabel::ALL`]
  pub fn dominant(&self) -> SentimentLabel {
    let mut best = SentimentLabel::ALL[0];
    for label in SentimentLabel::ALL {
      if self.get(label) > self.get(best) {
        best = label;
      }
    }
    best
  }

  /// Share of `label` in percent, rounded to one decimal
  pub fn percentage(&self, label: SentimentLabel) -> f64 {
    let total = self.total();
    if total == 0 {
      return 0.0;
    }
    (self.get(label) as f64 / total as f64 * 1000.0).round() / 10.0
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
  pub total_count: usize,
  /// `None` means "not applicable"
  pub average_rating: Option<f64>,
  pub sentiment_counts: SentimentCounts,
  pub dominant_sentiment: SentimentLabel,
  pub average_sentiment_score: f64,
}

/// Compute the overview numbers for `batch`.
///
/// Returns `None` for an empty batch so callers can keep whatever they were
/// showing before.
pub fn aggregate(batch: &AnalysisBatch) -> Option<Aggregates> {
  if batch.is_empty() {
    debug!("Skipping aggregation: batch has no records");
    return None;
  }

  let total_count = batch.len();
  let mut sentiment_counts = SentimentCounts::default();
  let mut score_sum = 0.0;
  let mut rating_sum = 0.0;
  let mut rating_count = 0usize;

  for record in &batch.records {
    sentiment_counts.increment(record.sentiment_label);
    score_sum += record.sentiment_score;
    if let Some(rating) = record.rating {
      rating_sum += rating;
      rating_count += 1;
    }
  }

  let average_rating =
    if rating_count == 0 || rating_sum == 0.0 { None } else { Some(rating_sum / rating_count as f64) };

  Some(Aggregates {
    total_count,
    average_rating,
    sentiment_counts,
    dominant_sentiment: sentiment_counts.dominant(),
    average_sentiment_score: score_sum / total_count as f64,
  })
}

/// Human-readable insight lines for the overview panel.
///
/// Computed lines come first, followed by up to three AI-supplied insights.
pub fn key_insights(batch: &AnalysisBatch, aggregates: &Aggregates, topics: &TopicIndex) -> Vec<String> {
  let counts = &aggregates.sentiment_counts;
  let mut insights = vec![
    format!(
      "Analyzed {} reviews with an average sentiment score of {:.2}",
      aggregates.total_count, aggregates.average_sentiment_score
    ),
    format!(
      "Sentiment breakdown: {:.1}% positive, {:.1}% neutral, {:.1}% negative",
      counts.percentage(SentimentLabel::Positive),
      counts.percentage(SentimentLabel::Neutral),
      counts.percentage(SentimentLabel::Negative)
    ),
  ];

  let languages = batch.languages();
  if languages.len() > 1 {
    insights.push(format!("Languages detected: {}", languages.join(", ")));
  }

  let translations = batch.translations_performed();
  if translations > 0 {
    insights.push(format!("Performed {translations} translations to English"));
  }

  let top_topics: Vec<&str> =
    topics.top(INSIGHT_TOPIC_LIMIT).iter().map(|entry| entry.topic.as_str()).collect();
  if top_topics.is_empty() {
    insights.push("No specific topics identified".to_string());
  } else {
    insights.push(format!("Top topics: {}", top_topics.join(", ")));
  }

  if let Some(summary) = &batch.summary {
    insights.extend(summary.key_insights.iter().take(AI_INSIGHT_LIMIT).cloned());
  }

  insights
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{BatchSummary, ReviewRecord};

  fn record(index: usize, label: SentimentLabel, score: f64, rating: Option<f64>) -> ReviewRecord {
    ReviewRecord {
      id: ReviewRecord::batch_id(index),
      original_text: format!("review {index}"),
      processed_text: None,
      sentiment_label: label,
      sentiment_score: score,
      rating,
      date: "2024-01-01".to_string(),
      topics: Vec::new(),
      key_phrases: Vec::new(),
      detected_language: Some("en".to_string()),
      was_translated: false,
    }
  }

  #[test]
  fn test_positive_positive_negative_scenario() {
    let batch = AnalysisBatch::new(
      vec![
        record(0, SentimentLabel::Positive, 0.9, None),
        record(1, SentimentLabel::Positive, 0.7, None),
        record(2, SentimentLabel::Negative, 0.2, None),
      ],
      None,
    );

    let aggregates = aggregate(&batch).unwrap();
    assert_eq!(aggregates.total_count, 3);
    assert_eq!(aggregates.dominant_sentiment, SentimentLabel::Positive);
    assert!((aggregates.average_sentiment_score - 0.6).abs() < 1e-9);
    assert_eq!(aggregates.sentiment_counts, SentimentCounts { positive: 2, neutral: 0, negative: 1 });
    assert_eq!(aggregates.sentiment_counts.total(), aggregates.total_count);
    assert_eq!(aggregates.average_rating, None);
  }

  #[test]
  fn test_empty_batch_signals_no_data() {
    assert!(aggregate(&AnalysisBatch::default()).is_none());
  }

  #[test]
  fn test_average_rating_ignores_missing_ratings() {
    let batch = AnalysisBatch::new(
      vec![
        record(0, SentimentLabel::Neutral, 0.5, Some(4.0)),
        record(1, SentimentLabel::Neutral, 0.5, None),
        record(2, SentimentLabel::Neutral, 0.5, Some(2.0)),
      ],
      None,
    );

    assert_eq!(aggregate(&batch).unwrap().average_rating, Some(3.0));
  }

  #[test]
  fn test_zero_rating_sum_is_not_applicable() {
    let batch = AnalysisBatch::new(vec![record(0, SentimentLabel::Neutral, 0.5, Some(0.0))], None);
    assert_eq!(aggregate(&batch).unwrap().average_rating, None);
  }

  #[test]
  fn test_dominant_tie_breaks_in_enumeration_order() {
    let counts = SentimentCounts { positive: 1, neutral: 1, negative: 1 };
    assert_eq!(counts.dominant(), SentimentLabel::Positive);

    let counts = SentimentCounts { positive: 0, neutral: 2, negative: 2 };
    assert_eq!(counts.dominant(), SentimentLabel::Neutral);

    let counts = SentimentCounts { positive: 0, neutral: 1, negative: 2 };
    assert_eq!(counts.dominant(), SentimentLabel::Negative);
  }

  #[test]
  fn test_percentages_round_to_one_decimal() {
    let counts = SentimentCounts { positive: 2, neutral: 0, negative: 1 };
    assert_eq!(counts.percentage(SentimentLabel::Positive), 66.7);
    assert_eq!(counts.percentage(SentimentLabel::Negative), 33.3);
    assert_eq!(SentimentCounts::default().percentage(SentimentLabel::Neutral), 0.0);
  }

  #[test]
  fn test_key_insights_append_ai_lines() {
    let mut first = record(0, SentimentLabel::Positive, 0.8, None);
    first.topics = vec!["Price".to_string()];
    let mut second = record(1, SentimentLabel::Negative, 0.2, None);
    second.detected_language = Some("fr".to_string());
    second.was_translated = true;

    let summary = BatchSummary {
      key_insights: vec!["a".into(), "b".into(), "c".into(), "d".into()],
      ..Default::default()
    };
    let batch = AnalysisBatch::new(vec![first, second], Some(summary));
    let aggregates = aggregate(&batch).unwrap();
    let topics = TopicIndex::from_batch(&batch);

    let insights = key_insights(&batch, &aggregates, &topics);
    assert_eq!(insights[0], "Analyzed 2 reviews with an average sentiment score of 0.50");
    assert_eq!(insights[1], "Sentiment breakdown: 50.0% positive, 0.0% neutral, 50.0% negative");
    assert!(insights.contains(&"Languages detected: en, fr".to_string()));
    assert!(insights.contains(&"Performed 1 translations to English".to_string()));
    assert!(insights.contains(&"Top topics: Price".to_string()));
    assert_eq!(&insights[insights.len() - 3..], &["a", "b", "c"]);
  }
}
