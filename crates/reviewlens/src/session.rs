//! Presentation state for one analysed batch.
//!
//! A [`Session`] owns the current batch and every view derived from it. All
//! state changes go through [`Session::apply`]; the views are read-only.

use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, key_insights, Aggregates};
use crate::error::{Result, ReviewError};
use crate::export::export_csv;
use crate::filter::Filter;
use crate::paginate::{PageCommand, Paginator, PAGE_SIZE};
use crate::record::{AnalysisBatch, ReviewRecord};
use crate::topics::{CloudEntry, TopicIndex, TopicWeight};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  /// Replace the batch with a freshly analysed one
  SubmitBatch(AnalysisBatch),
  SetQuery(String),
  SetTopic(String),
  ClearFilter,
  Navigate(PageCommand),
  RequestExport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Replaced { records: usize },
  Filtered { matches: usize },
  Moved { page: usize },
  /// The CSV document for the full batch
  Exported(String),
}

/// The overview panel: numbers plus the insight lines shown under them
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
  pub aggregates: Aggregates,
  pub insights: Vec<String>,
}

/// The visible table rows for the current page
#[derive(Debug, PartialEq)]
pub struct PageView<'a> {
  pub rows: Vec<&'a ReviewRecord>,
  pub number: usize,
  pub total_pages: usize,
  pub total_items: usize,
  pub offset: usize,
}

impl PageView<'_> {
  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

#[derive(Debug)]
pub struct Session {
  batch: AnalysisBatch,
  overview: Option<Overview>,
  topics: TopicIndex,
  filter: Filter,
  visible: Vec<usize>,
  page: usize,
  paginator: Paginator,
  in_flight: bool,
  last_error: Option<String>,
}

impl Default for Session {
  fn default() -> Self {
    Self::new(PAGE_SIZE)
  }
}

impl Session {
  pub fn new(page_size: usize) -> Self {
    Self {
      batch: AnalysisBatch::default(),
      overview: None,
      topics: TopicIndex::default(),
      filter: Filter::All,
      visible: Vec::new(),
      page: 1,
      paginator: Paginator::new(page_size),
      in_flight: false,
      last_error: None,
    }
  }

  pub fn batch(&self) -> &AnalysisBatch {
    &self.batch
  }

  pub fn records(&self) -> &[ReviewRecord] {
    &self.batch.records
  }

  pub fn has_data(&self) -> bool {
    !self.batch.is_empty()
  }

  pub fn overview(&self) -> Option<&Overview> {
    self.overview.as_ref()
  }

  pub fn topics(&self) -> &TopicIndex {
    &self.topics
  }

  pub fn topic_cloud(&self) -> Vec<CloudEntry> {
    self.topics.cloud()
  }

  pub fn most_frequent(&self) -> &[TopicWeight] {
    self.topics.most_frequent()
  }

  pub fn filter(&self) -> &Filter {
    &self.filter
  }

  pub fn page_number(&self) -> usize {
    self.page
  }

  pub fn is_analyzing(&self) -> bool {
    self.in_flight
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Records matching the active filter, in batch order
  pub fn visible_records(&self) -> Vec<&ReviewRecord> {
    self.visible.iter().map(|&position| &self.batch.records[position]).collect()
  }

  pub fn current_page(&self) -> PageView<'_> {
    let page = self.paginator.page(&self.visible, self.page);
    PageView {
      rows: page.items.iter().map(|&position| &self.batch.records[position]).collect(),
      number: page.number,
      total_pages: page.total_pages,
      total_items: page.total_items,
      offset: page.offset,
    }
  }

  /// Mark an analysis as started. Only one may be outstanding.
  pub fn begin_analysis(&mut self) -> Result<()> {
    if self.in_flight {
      let err = ReviewError::validation("An analysis is already running. Please wait for it to finish.");
      self.last_error = Some(err.to_string());
      return Err(err);
    }
    self.in_flight = true;
    self.last_error = None;
    Ok(())
  }

  /// Settle the outstanding analysis. The in-flight flag is cleared whatever
  /// the result; a failure leaves the displayed batch untouched.
  pub fn finish_analysis(&mut self, result: Result<AnalysisBatch>) -> Result<Outcome> {
    self.in_flight = false;
    match result {
      Ok(batch) => self.apply(Command::SubmitBatch(batch)),
      Err(err) => {
        warn!("Analysis failed: {}", err);
        self.last_error = Some(err.to_string());
        Err(err)
      }
    }
  }

  pub fn apply(&mut self, command: Command) -> Result<Outcome> {
    let result = match command {
      Command::SubmitBatch(batch) => Ok(self.replace_batch(batch)),
      Command::SetQuery(query) => Ok(self.set_filter(Filter::query(&query))),
      Command::SetTopic(topic) => Ok(self.set_filter(Filter::topic(&topic))),
      Command::ClearFilter => Ok(self.set_filter(Filter::All)),
      Command::Navigate(step) => {
        self.page = self.paginator.navigate(self.page, step, self.visible.len());
        Ok(Outcome::Moved { page: self.page })
      }
      Command::RequestExport => export_csv(&self.batch.records).map(Outcome::Exported),
    };

    match &result {
      Ok(_) => self.last_error = None,
      Err(err) => self.last_error = Some(err.to_string()),
    }
    result
  }

  fn replace_batch(&mut self, batch: AnalysisBatch) -> Outcome {
    let records = batch.len();
    let topics = TopicIndex::from_batch(&batch);

    match aggregate(&batch) {
      Some(aggregates) => {
        let insights = key_insights(&batch, &aggregates, &topics);
        self.overview = Some(Overview { aggregates, insights });
      }
      None => warn!("Analysis returned no reviews; keeping the previous overview"),
    }

    info!("Loaded batch of {} reviews ({} topics)", records, topics.len());
    self.batch = batch;
    self.topics = topics;
    self.filter = Filter::All;
    self.refresh_visible();
    Outcome::Replaced { records }
  }

  fn set_filter(&mut self, filter: Filter) -> Outcome {
    self.filter = filter;
    self.refresh_visible();
    debug!("Filter {:?} matches {} of {} reviews", self.filter, self.visible.len(), self.batch.len());
    Outcome::Filtered { matches: self.visible.len() }
  }

  /// Any change to the visible set starts again from page one.
  fn refresh_visible(&mut self) {
    self.visible = self.filter.apply(&self.batch.records);
    self.page = 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::SentimentLabel;

  fn record(index: usize, label: SentimentLabel, score: f64, topics: &[&str]) -> ReviewRecord {
    ReviewRecord {
      id: ReviewRecord::batch_id(index),
      original_text: format!("Review number {}", index + 1),
      processed_text: None,
      sentiment_label: label,
      sentiment_score: score,
      rating: None,
      date: "2024-05-01".to_string(),
      topics: topics.iter().map(|t| t.to_string()).collect(),
      key_phrases: Vec::new(),
      detected_language: None,
      was_translated: false,
    }
  }

  fn batch_of(len: usize) -> AnalysisBatch {
    let records = (0..len)
      .map(|i| {
        let topics: &[&str] = if i % 2 == 0 { &["delivery"] } else { &["price"] };
        record(i, SentimentLabel::Positive, 0.8, topics)
      })
      .collect();
    AnalysisBatch::new(records, None)
  }

  fn three_reviews() -> AnalysisBatch {
    AnalysisBatch::new(
      vec![
        record(0, SentimentLabel::Positive, 0.9, &["service"]),
        record(1, SentimentLabel::Positive, 0.7, &["service", "food"]),
        record(2, SentimentLabel::Negative, 0.2, &["price"]),
      ],
      None,
    )
  }

  #[test]
  fn test_new_session_is_empty() {
    let session = Session::new(10);
    assert!(!session.has_data());
    assert!(session.overview().is_none());
    let page = session.current_page();
    assert!(page.is_empty());
    assert_eq!((page.number, page.total_pages), (1, 1));
  }

  #[test]
  fn test_submit_batch_builds_every_view() {
    let mut session = Session::new(10);
    let outcome = session.apply(Command::SubmitBatch(three_reviews())).unwrap();
    assert_eq!(outcome, Outcome::Replaced { records: 3 });

    let overview = session.overview().unwrap();
    assert_eq!(overview.aggregates.total_count, 3);
    assert_eq!(overview.aggregates.dominant_sentiment, SentimentLabel::Positive);
    assert!((overview.aggregates.average_sentiment_score - 0.6).abs() < 1e-9);
    assert!(overview.aggregates.average_rating.is_none());
    assert!(overview.insights[0].starts_with("Analyzed 3 reviews"));

    assert_eq!(session.most_frequent()[0].topic, "service");
    assert_eq!(session.current_page().rows.len(), 3);
  }

  #[test]
  fn test_navigation_over_twenty_three_records() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(batch_of(23))).unwrap();

    session.apply(Command::Navigate(PageCommand::Last)).unwrap();
    let page = session.current_page();
    assert_eq!(page.number, 3);
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0].id, "review-21");

    let outcome = session.apply(Command::Navigate(PageCommand::Next)).unwrap();
    assert_eq!(outcome, Outcome::Moved { page: 3 });
  }

  #[test]
  fn test_filter_changes_reset_to_first_page() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(batch_of(23))).unwrap();
    session.apply(Command::Navigate(PageCommand::Goto(2))).unwrap();
    assert_eq!(session.page_number(), 2);

    let outcome = session.apply(Command::SetTopic("Delivery".to_string())).unwrap();
    assert_eq!(outcome, Outcome::Filtered { matches: 12 });
    assert_eq!(session.page_number(), 1);
    assert_eq!(session.current_page().total_pages, 2);

    session.apply(Command::Navigate(PageCommand::Next)).unwrap();
    session.apply(Command::ClearFilter).unwrap();
    assert_eq!(session.page_number(), 1);
    assert_eq!(session.visible_records().len(), 23);
  }

  #[test]
  fn test_query_with_no_matches_shows_empty_page() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(three_reviews())).unwrap();
    session.apply(Command::SetQuery("nothing like this".to_string())).unwrap();

    let page = session.current_page();
    assert!(page.is_empty());
    assert_eq!(page.total_pages, 1);
  }

  #[test]
  fn test_empty_batch_keeps_previous_overview() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(three_reviews())).unwrap();
    session.apply(Command::SubmitBatch(AnalysisBatch::default())).unwrap();

    assert!(!session.has_data());
    assert_eq!(session.overview().unwrap().aggregates.total_count, 3);
    assert!(session.current_page().is_empty());
  }

  #[test]
  fn test_export_covers_full_batch_regardless_of_filter() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(three_reviews())).unwrap();
    session.apply(Command::SetTopic("price".to_string())).unwrap();

    match session.apply(Command::RequestExport).unwrap() {
      Outcome::Exported(document) => assert_eq!(document.lines().count(), 4),
      other => panic!("unexpected outcome {other:?}"),
    }
  }

  #[test]
  fn test_export_without_data_is_rejected() {
    let mut session = Session::new(10);
    let err = session.apply(Command::RequestExport).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(session.last_error(), Some("No data to export"));
  }

  #[test]
  fn test_only_one_analysis_in_flight() {
    let mut session = Session::new(10);
    session.begin_analysis().unwrap();
    assert!(session.is_analyzing());
    assert!(session.begin_analysis().unwrap_err().is_validation());

    session.finish_analysis(Ok(three_reviews())).unwrap();
    assert!(!session.is_analyzing());
    assert!(session.begin_analysis().is_ok());
  }

  #[test]
  fn test_failed_analysis_keeps_displayed_batch() {
    let mut session = Session::new(10);
    session.apply(Command::SubmitBatch(three_reviews())).unwrap();

    session.begin_analysis().unwrap();
    let err = session.finish_analysis(Err(ReviewError::timeout(300))).unwrap_err();

    assert!(err.is_timeout());
    assert!(!session.is_analyzing());
    assert_eq!(session.records().len(), 3);
    assert!(session.last_error().unwrap().contains("300 seconds"));
  }
}
