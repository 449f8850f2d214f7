//! CSV export of the full, unfiltered batch.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Result, ReviewError};
use crate::record::ReviewRecord;

pub const HEADER: [&str; 11] = [
  "ID",
  "Original Text",
  "Processed Text",
  "Sentiment",
  "Sentiment Score",
  "Rating",
  "Date",
  "Topics",
  "Key Phrases",
  "Detected Language",
  "Was Translated",
];

pub const LIST_SEPARATOR: &str = "; ";

/// Quote-wrap a text field, doubling any inner quotes.
pub fn quote(field: &str) -> String {
  format!("\"{}\"", field.replace('"', "\"\""))
}

fn number(value: Option<f64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(record: &ReviewRecord) -> String {
  [
    quote(&record.id),
    quote(&record.original_text),
    quote(record.processed_text.as_deref().unwrap_or_default()),
    quote(record.sentiment_label.as_str()),
    number(Some(record.sentiment_score)),
    number(record.rating),
    quote(&record.date),
    quote(&record.topics.join(LIST_SEPARATOR)),
    quote(&record.key_phrases.join(LIST_SEPARATOR)),
    quote(record.detected_language.as_deref().unwrap_or_default()),
    record.was_translated.to_string(),
  ]
  .join(",")
}

/// Serialize every record, in batch order, under a fixed header row.
pub fn export_csv(records: &[ReviewRecord]) -> Result<String> {
  if records.is_empty() {
    return Err(ReviewError::validation("No data to export"));
  }

  let mut document = HEADER.join(",");
  document.push('\n');
  for record in records {
    document.push_str(&row(record));
    document.push('\n');
  }
  Ok(document)
}

/// Export to `path` as UTF-8.
pub fn write_csv(records: &[ReviewRecord], path: &Path) -> Result<()> {
  let document = export_csv(records)?;
  fs::write(path, document).map_err(|e| {
    ReviewError::validation(format!("Could not write {}: {e}", path.display()))
  })?;
  info!("Exported {} reviews to {}", records.len(), path.display());
  Ok(())
}
