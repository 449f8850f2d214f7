use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::display::render_session;
use crate::cli::explore;
use crate::client::AnalysisClient;
use crate::config::Settings;
use crate::error::ReviewError;
use crate::export::write_csv;
use crate::normalize::parse_batch_response;
use crate::paginate::PageCommand;
use crate::record::AnalysisBatch;
use crate::session::{Command, Outcome, Session};

/// Options shared by every command that ends in a rendered batch
#[derive(Args, Debug, Clone, Default)]
pub struct ViewOptions {
  /// Only show reviews whose text or topics contain this text
  #[arg(short, long, conflicts_with = "topic")]
  pub query: Option<String>,
  /// Only show reviews tagged with this topic
  #[arg(short, long)]
  pub topic: Option<String>,
  /// Table page to show
  #[arg(short, long, default_value_t = 1)]
  pub page: usize,
  /// Write the full batch as CSV ("-" for stdout)
  #[arg(short, long)]
  pub export: Option<PathBuf>,
  /// Save the analysed batch as JSON for a later `show`
  #[arg(long)]
  pub save: Option<PathBuf>,
  /// Only print the review table
  #[arg(long)]
  pub table_only: bool,
  /// Keep reading commands from stdin after the first view
  #[arg(long)]
  pub explore: bool,
}

fn is_stdout(path: &Path) -> bool {
  path == Path::new("-")
}

/// Export the full batch to `path` ("-" for stdout). Returns the row count.
pub fn write_export(session: &mut Session, path: &Path) -> crate::error::Result<usize> {
  if !is_stdout(path) {
    write_csv(session.records(), path)?;
    return Ok(session.records().len());
  }

  match session.apply(Command::RequestExport)? {
    Outcome::Exported(document) => print!("{document}"),
    other => return Err(ReviewError::validation(format!("Unexpected export outcome {other:?}"))),
  }
  Ok(session.records().len())
}

fn save_batch(batch: &AnalysisBatch, path: &Path) -> Result<()> {
  let json = serde_json::to_string_pretty(batch)?;
  fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
  println!("{} Saved {} reviews to {}", "✓".green(), batch.len(), path.display().to_string().cyan());
  Ok(())
}

/// Load a batch saved with `--save`, or a raw response body from the backend
pub fn load_batch(path: &Path) -> Result<AnalysisBatch> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

  if let Ok(batch) = serde_json::from_str::<AnalysisBatch>(&content) {
    debug!("Loaded saved batch from {}", path.display());
    return Ok(batch);
  }

  let batch = parse_batch_response(&content, Local::now().date_naive())?;
  let name = path.file_name().map(|name| name.to_string_lossy().to_string());
  Ok(match (batch.source.is_some(), name) {
    (false, Some(name)) => batch.with_source(name),
    _ => batch,
  })
}

/// Apply the view options to a loaded session and render the result
pub fn present(session: &mut Session, view: &ViewOptions) -> Result<()> {
  if let Some(query) = &view.query {
    session.apply(Command::SetQuery(query.clone()))?;
  }
  if let Some(topic) = &view.topic {
    session.apply(Command::SetTopic(topic.clone()))?;
  }
  session.apply(Command::Navigate(PageCommand::Goto(view.page)))?;

  if let Some(path) = &view.save {
    save_batch(session.batch(), path)?;
  }

  if let Some(path) = &view.export {
    let exported = write_export(session, path)?;
    if is_stdout(path) {
      return Ok(());
    }
    println!("{} Exported {} reviews to {}", "✓".green(), exported, path.display().to_string().cyan());
  }

  println!("{}", render_session(session, view.table_only));

  if view.explore {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    explore::run(session, stdin.lock(), &mut stdout)?;
    stdout.flush()?;
  }

  Ok(())
}

async fn run_analysis(
  session: &mut Session,
  analysis: impl std::future::Future<Output = crate::error::Result<AnalysisBatch>>,
) -> Result<()> {
  session.begin_analysis()?;
  eprintln!("{}", "Analyzing reviews, this can take a few minutes...".dimmed());
  match session.finish_analysis(analysis.await)? {
    Outcome::Replaced { records: 0 } => println!("{}", "The analysis returned no reviews.".yellow()),
    Outcome::Replaced { records } => println!("{} Analyzed {} reviews", "✓".green(), records),
    _ => {}
  }
  Ok(())
}

/// Upload a CSV or TXT file of reviews and show the results
pub async fn analyze_file(settings: Settings, file: &Path, view: &ViewOptions) -> Result<()> {
  let mut session = Session::new(settings.page_size);
  let client = AnalysisClient::new(settings)?;
  run_analysis(&mut session, client.upload_file(file)).await?;
  present(&mut session, view)
}

/// Analyze one typed review
pub async fn analyze_review(
  settings: Settings,
  text: &str,
  rating: Option<f64>,
  language: Option<&str>,
  view: &ViewOptions,
) -> Result<()> {
  if let Some(rating) = rating {
    if !(1.0..=5.0).contains(&rating) {
      return Err(ReviewError::validation("Rating must be between 1 and 5").into());
    }
  }

  let mut session = Session::new(settings.page_size);
  let client = AnalysisClient::new(settings)?;
  run_analysis(&mut session, client.analyze_text(text, language, rating)).await?;
  present(&mut session, view)
}

/// Render a previously saved batch or backend response without any network calls
pub fn show_saved(settings: &Settings, path: &Path, view: &ViewOptions) -> Result<()> {
  let batch = load_batch(path)?;
  let mut session = Session::new(settings.page_size);
  session.apply(Command::SubmitBatch(batch))?;
  present(&mut session, view)
}

pub async fn health(settings: Settings) -> Result<()> {
  let url = settings.server_url.clone();
  let client = AnalysisClient::new(settings)?;
  let status = client.health_check().await?;

  println!("{} Analysis service at {} is {}", "✓".green(), url.cyan(), status.status.bold());
  if let Some(version) = status.version {
    println!("  version:   {version}");
  }
  if let Some(timestamp) = status.timestamp {
    println!("  timestamp: {timestamp}");
  }
  Ok(())
}
