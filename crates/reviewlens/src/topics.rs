//! Frequency-ranked topic index used by the topic cloud and the "most frequent" list.

use serde::Serialize;
use std::collections::HashMap;

use crate::record::{AnalysisBatch, ReviewRecord};

/// Entries shown in the topic cloud
pub const CLOUD_LIMIT: usize = 30;

/// Entries shown in the "most frequent topics" list
pub const FREQUENT_LIMIT: usize = 10;

pub const THEME_WEIGHT: u32 = 10;
pub const PHRASE_WEIGHT: u32 = 8;

pub const MIN_FONT_SIZE: f64 = 12.0;
pub const MAX_FONT_SIZE: f64 = 36.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicWeight {
  /// First-seen casing, for display
  pub topic: String,
  pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudEntry {
  pub topic: String,
  pub weight: u32,
  pub font_size: f64,
}

/// Ranked `(topic, weight)` pairs, heaviest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopicIndex {
  entries: Vec<TopicWeight>,
}

/// Index key for a topic string
pub fn topic_key(topic: &str) -> String {
  topic.trim().to_lowercase()
}

#[derive(Default)]
struct Builder {
  entries: Vec<TopicWeight>,
  positions: HashMap<String, usize>,
}

impl Builder {
  fn seed(&mut self, topic: &str, weight: u32) {
    let key = topic_key(topic);
    if key.is_empty() || self.positions.contains_key(&key) {
      return;
    }
    self.positions.insert(key, self.entries.len());
    self.entries.push(TopicWeight { topic: topic.trim().to_string(), weight });
  }

  fn bump(&mut self, topic: &str) {
    let key = topic_key(topic);
    if key.is_empty() {
      return;
    }
    match self.positions.get(&key) {
      Some(&position) => self.entries[position].weight += 1,
      None => self.seed(topic, 1),
    }
  }
}

impl TopicIndex {
  /// Build the index from record topics plus optional AI-supplied themes and phrases.
  ///
  /// Themes are seeded first at [`THEME_WEIGHT`], then phrases not already
  /// present at [`PHRASE_WEIGHT`]; every record topic then adds one.
  pub fn build(records: &[ReviewRecord], key_themes: &[String], frequent_phrases: &[String]) -> Self {
    let mut builder = Builder::default();

    for theme in key_themes {
      builder.seed(theme, THEME_WEIGHT);
    }
    for phrase in frequent_phrases {
      builder.seed(phrase, PHRASE_WEIGHT);
    }
    for topic in records.iter().flat_map(|record| record.topics.iter()) {
      builder.bump(topic);
    }

    let mut entries = builder.entries;
    // sort_by is stable, so equal weights keep insertion order
    entries.sort_by(|a, b| b.weight.cmp(&a.weight));
    Self { entries }
  }

  pub fn from_batch(batch: &AnalysisBatch) -> Self {
    Self::build(&batch.records, batch.key_themes(), batch.frequent_phrases())
  }

  pub fn entries(&self) -> &[TopicWeight] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn top(&self, limit: usize) -> &[TopicWeight] {
    &self.entries[..limit.min(self.entries.len())]
  }

  pub fn most_frequent(&self) -> &[TopicWeight] {
    self.top(FREQUENT_LIMIT)
  }

  /// The cloud view: top [`CLOUD_LIMIT`] entries with font sizes.
  pub fn cloud(&self) -> Vec<CloudEntry> {
    scale_fonts(self.top(CLOUD_LIMIT))
  }
}

/// Map weights linearly from `[min, max]` of `entries` onto font sizes.
pub fn scale_fonts(entries: &[TopicWeight]) -> Vec<CloudEntry> {
  let min = entries.iter().map(|e| e.weight).min().unwrap_or(0);
  let max = entries.iter().map(|e| e.weight).max().unwrap_or(0);
  let span = if max == min { 1.0 } else { f64::from(max - min) };

  entries
    .iter()
    .map(|entry| CloudEntry {
      topic: entry.topic.clone(),
      weight: entry.weight,
      font_size: MIN_FONT_SIZE + f64::from(entry.weight - min) / span * (MAX_FONT_SIZE - MIN_FONT_SIZE),
    })
    .collect()
}
