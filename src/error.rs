use thiserror::Error;

use crate::expr::ExprError;

/// Fatal errors for a run. Each prints once to stderr and exits non-zero;
/// nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A segment failed to parse or evaluate. Identifies the segment by
    /// index and literal text; the rest of the chain is abandoned.
    #[error("segment {index} (`{segment}`): {source}")]
    Chain {
        index: usize,
        segment: String,
        #[source]
        source: ExprError,
    },

    /// Configuration problems are reported before any evaluation starts.
    #[error("config: {0}")]
    Config(String),

    #[error("input: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures turning raw input into an initial value.
#[derive(Debug, Error)]
pub enum InputError {
    /// The original JSON error, surfaced after every recovery strategy
    /// also failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("exec `{command}` failed: {message}")]
    Exec { command: String, message: String },
}
