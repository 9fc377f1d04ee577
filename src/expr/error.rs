use thiserror::Error;

/// Everything that can go wrong while parsing or evaluating one segment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExprError {
    #[error("parse error at byte {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("unknown identifier `{0}`")]
    UnknownIdent(String),

    #[error("no method `{method}` on {kind}")]
    UnknownMethod { method: String, kind: &'static str },

    #[error("no property `{property}` on {kind}")]
    UnknownProperty { property: String, kind: &'static str },

    #[error("`{0}` is not a function")]
    NotAFunction(String),

    #[error("expected {expected}, got {got}")]
    Type { expected: &'static str, got: &'static str },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("no key `{0}` in object")]
    MissingKey(String),

    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity { method: String, expected: usize, got: usize },

    #[error("invalid JSON passed to parse: {0}")]
    BadJson(String),
}
