//! Terminal rendering of the session views

use colored::*;

use crate::filter::Filter;
use crate::record::{AnalysisBatch, ReviewRecord, SentimentLabel};
use crate::session::{Overview, PageView, Session};
use crate::topics::{CloudEntry, TopicWeight};

const BAR_WIDTH: usize = 20;
const TEXT_WIDTH: usize = 72;

/// Shorten `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
  let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
  if flat.chars().count() <= max {
    return flat;
  }
  let kept: String = flat.chars().take(max.saturating_sub(1)).collect();
  format!("{}…", kept.trim_end())
}

fn label(label: SentimentLabel) -> ColoredString {
  let text = format!("{} {}", label.emoji(), label.as_str());
  match label {
    SentimentLabel::Positive => text.green(),
    SentimentLabel::Neutral => text.yellow(),
    SentimentLabel::Negative => text.red(),
  }
}

fn bar(percentage: f64) -> String {
  let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
  "█".repeat(filled.min(BAR_WIDTH))
}

pub fn render_overview(overview: &Overview, batch: &AnalysisBatch) -> String {
  let aggregates = &overview.aggregates;
  let counts = &aggregates.sentiment_counts;
  let mut lines = Vec::new();

  let title = match &batch.source {
    Some(source) => format!("=== Overview: {} ===", source.yellow()),
    None => "=== Overview ===".to_string(),
  };
  lines.push(title.blue().bold().to_string());

  let rating = match aggregates.average_rating {
    Some(rating) => format!("{rating:.1} / 5"),
    None => "N/A".to_string(),
  };
  lines.push(format!("Total reviews:      {}", aggregates.total_count.to_string().bold()));
  lines.push(format!("Average rating:     {rating}"));
  lines.push(format!("Dominant sentiment: {}", label(aggregates.dominant_sentiment)));
  lines.push(format!("Average score:      {:.2}", aggregates.average_sentiment_score));
  lines.push(String::new());

  for sentiment in SentimentLabel::ALL {
    let percentage = counts.percentage(sentiment);
    lines.push(format!(
      "  {:<14} {:>4} ({:>5.1}%) {}",
      label(sentiment),
      counts.get(sentiment),
      percentage,
      bar(percentage).dimmed()
    ));
  }

  if !overview.insights.is_empty() {
    lines.push(String::new());
    lines.push("Key insights".bold().to_string());
    for insight in &overview.insights {
      lines.push(format!("  • {insight}"));
    }
  }

  if let Some(summary) = &batch.summary {
    if let Some(recommendation) = &summary.recommendation {
      lines.push(String::new());
      lines.push(format!("{} {}", "Recommendation:".bold(), recommendation));
    }
    push_list(&mut lines, "Praise", &summary.praise_points);
    push_list(&mut lines, "Complaints", &summary.complaints);
  }

  lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &[String]) {
  if items.is_empty() {
    return;
  }
  lines.push(String::new());
  lines.push(title.bold().to_string());
  for item in items {
    lines.push(format!("  - {item}"));
  }
}

/// The cloud as one wrapped block; bigger font sizes get louder styling.
pub fn render_cloud(cloud: &[CloudEntry]) -> String {
  if cloud.is_empty() {
    return "No topics identified.".dimmed().to_string();
  }

  let words: Vec<String> = cloud
    .iter()
    .map(|entry| match entry.font_size {
      size if size >= 28.0 => entry.topic.to_uppercase().cyan().bold().to_string(),
      size if size >= 20.0 => entry.topic.cyan().bold().to_string(),
      _ => entry.topic.cyan().to_string(),
    })
    .collect();

  words.join("  ")
}

pub fn render_most_frequent(entries: &[TopicWeight]) -> String {
  entries
    .iter()
    .enumerate()
    .map(|(rank, entry)| format!("{:>3}. {} ({})", rank + 1, entry.topic, entry.weight))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn render_topics(session: &Session) -> String {
  let mut lines = vec!["=== Topics ===".blue().bold().to_string(), render_cloud(&session.topic_cloud())];
  if !session.most_frequent().is_empty() {
    lines.push(String::new());
    lines.push("Most frequent".bold().to_string());
    lines.push(render_most_frequent(session.most_frequent()));
  }
  lines.join("\n")
}

fn render_row(position: usize, record: &ReviewRecord) -> String {
  let mut header = format!(
    "{:>4}. {} {:.2}  {}",
    position,
    label(record.sentiment_label),
    record.sentiment_score,
    record.date.dimmed()
  );
  if let Some(rating) = record.rating {
    header.push_str(&format!("  {} {rating}", "★".yellow()));
  }
  if record.was_translated {
    if let Some(language) = &record.detected_language {
      header.push_str(&format!("  {}", format!("[translated from {language}]").dimmed()));
    }
  }

  let mut lines = vec![header, format!("      {}", truncate(record.display_text(), TEXT_WIDTH))];
  if !record.topics.is_empty() {
    lines.push(format!("      {}", record.topics.join(", ").cyan()));
  }
  lines.join("\n")
}

fn describe_filter(filter: &Filter) -> Option<String> {
  match filter {
    Filter::All => None,
    Filter::Query(query) => Some(format!("matching \"{query}\"")),
    Filter::Topic(topic) => Some(format!("with topic \"{topic}\"")),
  }
}

pub fn render_page(page: &PageView<'_>, filter: &Filter) -> String {
  let title = match describe_filter(filter) {
    Some(description) => format!("=== Reviews {description} ==="),
    None => "=== Reviews ===".to_string(),
  };
  let mut lines = vec![title.blue().bold().to_string()];

  if page.is_empty() {
    let empty = if filter.is_active() {
      "No reviews match the current filter."
    } else {
      "No reviews to display."
    };
    lines.push(empty.dimmed().to_string());
  } else {
    for (index, record) in page.rows.iter().enumerate() {
      lines.push(render_row(page.offset + index + 1, record));
    }
  }

  lines.push(
    format!("Page {} of {} ({} reviews)", page.number, page.total_pages, page.total_items)
      .dimmed()
      .to_string(),
  );
  lines.join("\n")
}

/// Full dashboard: overview, topics and the current table page
pub fn render_session(session: &Session, table_only: bool) -> String {
  let mut sections = Vec::new();
  if !table_only {
    if let Some(overview) = session.overview() {
      sections.push(render_overview(overview, session.batch()));
    }
    if session.has_data() {
      sections.push(render_topics(session));
    }
  }
  sections.push(render_page(&session.current_page(), session.filter()));
  sections.join("\n\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::BatchSummary;
  use crate::session::Command;

  fn plain() {
    colored::control::set_override(false);
  }

  fn record(index: usize, text: &str, label: SentimentLabel, topics: &[&str]) -> ReviewRecord {
    ReviewRecord {
      id: ReviewRecord::batch_id(index),
      original_text: text.to_string(),
      processed_text: None,
      sentiment_label: label,
      sentiment_score: 0.8,
      rating: Some(4.0),
      date: "2024-02-10".to_string(),
      topics: topics.iter().map(|t| t.to_string()).collect(),
      key_phrases: Vec::new(),
      detected_language: Some("en".to_string()),
      was_translated: false,
    }
  }

  fn session() -> Session {
    let summary = BatchSummary {
      recommendation: Some("Invest in faster shipping".to_string()),
      complaints: vec!["Late parcels".to_string()],
      ..BatchSummary::default()
    };
    let batch = AnalysisBatch::new(
      vec![
        record(0, "Arrived quickly and well packed", SentimentLabel::Positive, &["shipping"]),
        record(1, "Too expensive for what it is", SentimentLabel::Negative, &["price"]),
      ],
      Some(summary),
    )
    .with_source("reviews.csv");
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(batch)).unwrap();
    session
  }

  #[test]
  fn test_truncate_is_char_aware() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("ééééééééé", 5), "éééé…");
    assert_eq!(truncate("line\nbreak", 20), "line break");
  }

  #[test]
  fn test_bar_is_bounded() {
    assert_eq!(bar(0.0), "");
    assert_eq!(bar(50.0).chars().count(), 10);
    assert_eq!(bar(100.0).chars().count(), BAR_WIDTH);
  }

  #[test]
  fn test_overview_shows_counts_and_summary() {
    plain();
    let session = session();
    let text = render_overview(session.overview().unwrap(), session.batch());

    assert!(text.contains("Overview: reviews.csv"));
    assert!(text.contains("Total reviews:      2"));
    assert!(text.contains("Average rating:     4.0 / 5"));
    assert!(text.contains("50.0%"));
    assert!(text.contains("Invest in faster shipping"));
    assert!(text.contains("Late parcels"));
  }

  #[test]
  fn test_page_footer_and_rows() {
    plain();
    let session = session();
    let text = render_page(&session.current_page(), session.filter());

    assert!(text.contains("1. 😊 positive"));
    assert!(text.contains("Arrived quickly"));
    assert!(text.contains("Page 1 of 1 (2 reviews)"));
  }

  #[test]
  fn test_empty_state_mentions_filter() {
    plain();
    let mut session = session();
    session.apply(Command::SetQuery("nonexistent".to_string())).unwrap();
    let text = render_page(&session.current_page(), session.filter());

    assert!(text.contains("matching \"nonexistent\""));
    assert!(text.contains("No reviews match the current filter."));
    assert!(text.contains("Page 1 of 1 (0 reviews)"));
  }

  #[test]
  fn test_table_only_skips_overview() {
    plain();
    let session = session();
    let text = render_session(&session, true);
    assert!(!text.contains("Overview"));
    assert!(text.contains("=== Reviews ==="));
  }

  #[test]
  fn test_most_frequent_is_ranked() {
    let entries = vec![
      TopicWeight { topic: "shipping".to_string(), weight: 3 },
      TopicWeight { topic: "price".to_string(), weight: 1 },
    ];
    assert_eq!(render_most_frequent(&entries), "  1. shipping (3)\n  2. price (1)");
  }
}
