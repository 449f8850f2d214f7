//! Terminal front end: subcommand handlers, rendering and the explore loop

pub mod commands;
pub mod display;
pub mod explore;
