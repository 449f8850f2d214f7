use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use reviewlens::cli::commands::{self, ViewOptions};
use reviewlens::config::{Settings, SERVER_URL_ENV, TIMEOUT_ENV};

#[derive(Parser)]
#[command(name = "reviewlens")]
#[command(about = "Reviewlens - sentiment and topic dashboards for customer reviews")]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Config file (defaults to ./reviewlens.yaml or the user config directory)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Base URL of the analysis service
  #[arg(long, global = true, env = SERVER_URL_ENV)]
  server_url: Option<String>,

  /// Seconds to wait for an analysis before giving up
  #[arg(long, global = true, env = TIMEOUT_ENV)]
  timeout_secs: Option<u64>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Command {
  /// Upload a CSV or TXT file of reviews for analysis
  Analyze {
    /// File with one review per line or row
    file: PathBuf,
    #[command(flatten)]
    view: ViewOptions,
  },
  /// Analyze a single review typed on the command line
  Review {
    /// The review text
    text: String,
    /// Star rating to attach (1-5)
    #[arg(short, long)]
    rating: Option<f64>,
    /// Language hint for the analysis service
    #[arg(short, long)]
    language: Option<String>,
    #[command(flatten)]
    view: ViewOptions,
  },
  /// Render a saved batch or a stored analysis response
  Show {
    /// JSON written by --save, or a raw upload response
    response: PathBuf,
    #[command(flatten)]
    view: ViewOptions,
  },
  /// Check that the analysis service is up
  Health,
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("reviewlens=debug,warn")
    } else {
      EnvFilter::new("warn")
    }
  });

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

fn settings(cli: &Cli) -> Result<Settings> {
  let mut settings = Settings::load(cli.config.as_deref())?;
  if let Some(url) = &cli.server_url {
    settings.server_url = url.clone();
  }
  if let Some(secs) = cli.timeout_secs {
    settings.timeout_secs = secs;
  }
  settings.validate()?;
  Ok(settings)
}

async fn handle(cli: Cli) -> Result<()> {
  let settings = settings(&cli)?;

  match cli.command {
    Command::Analyze { file, view } => commands::analyze_file(settings, &file, &view).await,
    Command::Review { text, rating, language, view } => {
      commands::analyze_review(settings, &text, rating, language.as_deref(), &view).await
    }
    Command::Show { response, view } => commands::show_saved(&settings, &response, &view),
    Command::Health => commands::health(settings).await,
  }
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if let Err(e) = handle(cli).await {
    eprintln!("{} {e:#}", "✗".red());
    std::process::exit(1);
  }
}
