//! slrp: a command-line pipeline transformer.
//!
//! Reads input (stdin, a file, or a command's captured stdout), applies a
//! chain of user-supplied expression strings as successive transformations,
//! and prints the final value. Segments run in an embedded expression
//! language, never through host code evaluation.
//!
//! # Architecture
//!
//! - **[`expr`]** — The embedded expression language: lexer, parser,
//!   tree-walking evaluator over `serde_json::Value`, and the [`expr::Env`]
//!   holding registered functions and the utility-namespace alias.
//! - **[`classify`]** — Decides each segment's kind (identity, context
//!   template, context access, bare access, function) by precedence.
//! - **[`chain`]** — Folds the segment list over the running value; whole
//!   value or line-wise with exclusion-sentinel handling.
//! - **[`input`]** — Value source: format sniffing, structured parsing,
//!   malformed-JSON recovery, inline-exec capture.
//! - **[`config`]** — Embedded defaults + user overlay merge; builds and
//!   validates the evaluation environment.
//! - **[`present`]** — Plain/pretty/colorized rendering and in-place
//!   writes.
//! - **[`completion`]** — Bash completion script generation.

/// Chain runner and the exclusion sentinel.
pub mod chain;
/// Segment classification by precedence.
pub mod classify;
/// Bash completion script generation.
pub mod completion;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Fatal error taxonomy for a run.
pub mod error;
/// The embedded expression language.
pub mod expr;
/// Value source: formats, parsing, recovery.
pub mod input;
/// Output rendering and in-place writes.
pub mod present;

pub use chain::{EXCLUDE, run, run_linewise};
pub use classify::{SegmentKind, classify};
pub use config::Config;
pub use error::{Error, InputError};
pub use expr::Env;

use serde_json::Value;

/// Run a chain over a value with a default (empty) environment.
///
/// This is the main entry point for tests and simple embedding. CLI usage
/// builds the environment from configuration instead.
pub fn transform<S: AsRef<str>>(segments: &[S], initial: Value) -> Result<Value, Error> {
    chain::run(segments, initial, &Env::new())
}
