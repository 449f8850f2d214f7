//! reviewlens - sentiment and topic dashboards for analysed customer reviews
//!
//! Review text is sent to an analysis service; the answers come back in a few
//! loosely specified JSON shapes. This crate normalizes them into
//! [`record::ReviewRecord`]s and derives everything a reader needs from there:
//! the overview numbers, a ranked topic index, text and topic filters,
//! fixed-size pages and a CSV export.
//!
//! All derived views are pure functions of the current batch. The
//! [`session::Session`] ties them together behind a single command entry point.

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod paginate;
pub mod record;
pub mod session;
pub mod topics;

pub use error::{Result, ReviewError, TransportError};
pub use record::{AnalysisBatch, BatchSummary, ReviewRecord, SentimentLabel};
pub use session::{Command, Outcome, Session};
