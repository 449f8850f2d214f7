//! Line-oriented exploration of a loaded batch
//!
//! Each input line is one command against the [`Session`]. Errors are
//! reported in place and the loop keeps going.

use colored::*;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::commands::write_export;
use crate::cli::display::{render_overview, render_page, render_session, render_topics};
use crate::error::{Result, ReviewError};
use crate::paginate::PageCommand;
use crate::session::{Command, Session};

const HELP: &str = "\
Commands:
  search <text>   filter by text or topic substring (empty clears)
  topic <name>    filter by exact topic
  clear           remove the filter
  next | prev     move one page
  first | last    jump to either end
  page <n>        jump to page n
  show            redraw the whole dashboard
  overview        show the overview panel
  topics          show the topic cloud
  export <path>   write the full batch as CSV
  help            show this help
  quit            leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ExploreCommand {
  Apply(Command),
  Dashboard,
  Overview,
  Topics,
  Export(PathBuf),
  Help,
  Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command_line(line: &str) -> Result<Option<ExploreCommand>> {
  let line = line.trim();
  if line.is_empty() {
    return Ok(None);
  }

  let (verb, rest) = match line.split_once(char::is_whitespace) {
    Some((verb, rest)) => (verb, rest.trim()),
    None => (line, ""),
  };

  let command = match verb.to_lowercase().as_str() {
    "search" | "s" => ExploreCommand::Apply(Command::SetQuery(rest.to_string())),
    "topic" | "t" if !rest.is_empty() => ExploreCommand::Apply(Command::SetTopic(rest.to_string())),
    "topic" | "t" => return Err(ReviewError::validation("Usage: topic <name>")),
    "clear" => ExploreCommand::Apply(Command::ClearFilter),
    "next" | "n" => ExploreCommand::Apply(Command::Navigate(PageCommand::Next)),
    "prev" | "previous" | "p" => ExploreCommand::Apply(Command::Navigate(PageCommand::Previous)),
    "first" => ExploreCommand::Apply(Command::Navigate(PageCommand::First)),
    "last" => ExploreCommand::Apply(Command::Navigate(PageCommand::Last)),
    "page" => {
      let number = rest
        .parse()
        .map_err(|_| ReviewError::validation(format!("'{rest}' is not a page number")))?;
      ExploreCommand::Apply(Command::Navigate(PageCommand::Goto(number)))
    }
    "show" | "list" => ExploreCommand::Dashboard,
    "overview" => ExploreCommand::Overview,
    "topics" => ExploreCommand::Topics,
    "export" if !rest.is_empty() => ExploreCommand::Export(PathBuf::from(rest)),
    "export" => return Err(ReviewError::validation("Usage: export <path>")),
    "help" | "?" => ExploreCommand::Help,
    "quit" | "exit" | "q" => ExploreCommand::Quit,
    other => return Err(ReviewError::validation(format!("Unknown command '{other}'. Type 'help' for a list."))),
  };

  Ok(Some(command))
}

fn execute(session: &mut Session, command: ExploreCommand) -> Result<String> {
  match command {
    ExploreCommand::Apply(command) => {
      session.apply(command)?;
      Ok(render_page(&session.current_page(), session.filter()))
    }
    ExploreCommand::Dashboard => Ok(render_session(session, false)),
    ExploreCommand::Overview => Ok(match session.overview() {
      Some(overview) => render_overview(overview, session.batch()),
      None => "No data analyzed yet.".to_string(),
    }),
    ExploreCommand::Topics => Ok(render_topics(session)),
    ExploreCommand::Export(path) => {
      let exported = write_export(session, &path)?;
      Ok(format!("{} Exported {} reviews to {}", "✓".green(), exported, path.display()))
    }
    ExploreCommand::Help => Ok(HELP.to_string()),
    ExploreCommand::Quit => Ok(String::new()),
  }
}

/// Run the loop until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(session: &mut Session, input: R, out: &mut W) -> std::io::Result<()> {
  writeln!(out, "{}", "Type 'help' for commands, 'quit' to leave.".dimmed())?;

  for line in input.lines() {
    let line = line?;
    let reply = match parse_command_line(&line) {
      Ok(None) => continue,
      Ok(Some(ExploreCommand::Quit)) => break,
      Ok(Some(command)) => execute(session, command),
      Err(err) => Err(err),
    };

    match reply {
      Ok(text) => writeln!(out, "{text}")?,
      Err(err) => writeln!(out, "{} {}", "✗".red(), err)?,
    }
    out.flush()?;
  }

  Ok(())
}
