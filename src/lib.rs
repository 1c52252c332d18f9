//! # commitdiff
//!
//! Turns a staged git diff into a structured commit message by relaying it
//! to an LLM chat-completion service.
//!
//! The crate has two halves:
//!
//! - the relay ([`server`]), which validates diffs, applies per-caller rate
//!   limits, calls the upstream model, and normalizes its output into
//!   `{title, summary}`;
//! - the command-line client ([`cli`]), which reads the staged diff, calls a
//!   relay, prints the result, and optionally commits.
//!
//! ## Quick Start
//!
//! ```rust
//! use commitdiff::generation::normalize::normalize_content;
//!
//! let message = normalize_content(r#"{"message": "fix: guard empty input"}"#).unwrap();
//! assert_eq!(message.title, "fix: guard empty input");
//! assert_eq!(message.summary, "No summary available");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod generation;
pub mod git;
pub mod llm;
pub mod rate_limit;
pub mod server;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::generation::{CommitMessage, EntryPolicy, GenerateError, GenerationService};

/// The current version of commitdiff.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
