//! Error types for calsh.

use thiserror::Error;

use crate::context::Level;

/// Why a path token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("No path given")]
    Empty,

    #[error("Empty segment in '{token}'")]
    EmptySegment { token: String },

    #[error("'{segment}' is not a valid {level}")]
    Malformed { segment: String, level: Level },

    #[error("{level} '{value}' is out of range ({min:02}-{max:02})")]
    OutOfRange {
        level: Level,
        value: String,
        min: u32,
        max: u32,
    },

    #[error("You are already at the bottom level (cannot descend into '{segment}')")]
    AlreadyAtBottom { segment: String },

    #[error("'{token}' needs a year to be set; read as a relative path it fails: {cause}")]
    YearUnset { token: String, cause: Box<PathError> },
}

/// Coarse classification callers use to pick a message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Range,
    Depth,
    Ambiguous,
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::Empty | PathError::EmptySegment { .. } | PathError::Malformed { .. } => {
                ErrorKind::Syntax
            }
            PathError::OutOfRange { .. } => ErrorKind::Range,
            PathError::AlreadyAtBottom { .. } => ErrorKind::Depth,
            PathError::YearUnset { .. } => ErrorKind::Ambiguous,
        }
    }
}

/// Errors from the calendar side: dates, config and providers.
#[derive(Error, Debug)]
pub enum CalshError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("'{0}' is not a calendar date")]
    InvalidDate(String),

    #[error("A year is required to address events")]
    NoYear,

    #[error("Invalid time span '{input}': {reason}")]
    InvalidTimeSpan { input: String, reason: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{name}' not found in PATH. Install it with:\n  cargo install {binary}")]
    ProviderNotInstalled { name: String, binary: String },

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calsh operations.
pub type CalshResult<T> = Result<T, CalshError>;
