//! Text and topic predicates over the record collection.
//!
//! Filters return positions into the batch rather than copies, so the
//! session can page through a filtered view without cloning records.

use serde::Serialize;

use crate::record::ReviewRecord;
use crate::topics::topic_key;

/// The filter currently applied to the table view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Filter {
  #[default]
  All,
  /// Case-insensitive substring of the text or of any topic
  Query(String),
  /// Case-insensitive exact match against a topic (topic cloud click)
  Topic(String),
}

impl Filter {
  /// A blank query means "no filter".
  pub fn query(query: &str) -> Self {
    if query.trim().is_empty() {
      Filter::All
    } else {
      Filter::Query(query.to_string())
    }
  }

  pub fn topic(topic: &str) -> Self {
    if topic.trim().is_empty() {
      Filter::All
    } else {
      Filter::Topic(topic.to_string())
    }
  }

  pub fn is_active(&self) -> bool {
    !matches!(self, Filter::All)
  }

  pub fn matches(&self, record: &ReviewRecord) -> bool {
    match self {
      Filter::All => true,
      Filter::Query(query) => matches_query(record, &query.trim().to_lowercase()),
      Filter::Topic(topic) => matches_topic(record, &topic_key(topic)),
    }
  }

  /// Positions of matching records, in batch order.
  pub fn apply(&self, records: &[ReviewRecord]) -> Vec<usize> {
    records
      .iter()
      .enumerate()
      .filter(|(_, record)| self.matches(record))
      .map(|(position, _)| position)
      .collect()
  }
}

fn matches_query(record: &ReviewRecord, needle: &str) -> bool {
  needle.is_empty()
    || record.original_text.to_lowercase().contains(needle)
    || record.topics.iter().any(|topic| topic.to_lowercase().contains(needle))
}

fn matches_topic(record: &ReviewRecord, key: &str) -> bool {
  record.topics.iter().any(|topic| topic_key(topic) == key)
}

/// Free-text search; an empty query returns every record unchanged.
pub fn search<'a>(records: &'a [ReviewRecord], query: &str) -> Vec<&'a ReviewRecord> {
  select(records, &Filter::query(query))
}

/// Topic-click filter: exact, case-insensitive topic equality.
pub fn by_topic<'a>(records: &'a [ReviewRecord], topic: &str) -> Vec<&'a ReviewRecord> {
  select(records, &Filter::topic(topic))
}

fn select<'a>(records: &'a [ReviewRecord], filter: &Filter) -> Vec<&'a ReviewRecord> {
  records.iter().filter(|record| filter.matches(record)).collect()
}
