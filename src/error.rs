use thiserror::Error;

/// Errors raised by the subtitle core. Application glue wraps these in
/// `anyhow` with file context.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("max chars per cue must be at least 1, got {0}")]
    InvalidMaxChars(usize),

    #[error("invalid subtitle timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("malformed srt at line {line}: {reason}")]
    MalformedSrt { line: usize, reason: String },

    #[error("unsupported storage uri: {0}")]
    UnsupportedUri(String),
}

pub type Result<T> = std::result::Result<T, Error>;
