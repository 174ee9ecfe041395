//! # refaudit
//!
//! Audits a pasted reference list against Crossref and PubMed: each line is
//! resolved to a registered record (or marked not found) and resolved records
//! are checked for retraction notices.
//!
//! ## Architecture
//!
//! - [`parser`]: reference splitting and field extraction (DOI, authors, year, title guess)
//! - [`matching`]: text normalization and the title/author/year matcher
//! - [`sources`]: registry clients behind the [`Source`] trait
//! - [`pipeline`]: the [`Resolver`] cascade and the retraction checker
//! - [`report`]: Markdown and JSON reports
//! - [`models`]: records, notices and verdicts
//! - [`config`]: configuration management
//! - [`ui`]: terminal output for the CLI
//! - [`utils`]: the shared HTTP client

pub mod config;
pub mod matching;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{MatchVerdict, MatchOutcome};
pub use pipeline::{Resolver, ResolverOptions};
pub use sources::{Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
