//! Error kinds raised while decoding a dump or rendering its tree

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Every failure is fatal for the run; orphaned entries are not errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The stream ended in the middle of a record
    #[error("truncated record at offset {offset}: needed {needed} bytes, got {available}")]
    TruncatedRecord {
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// Name bytes are not valid UTF-16LE
    #[error("malformed name in record at offset {offset}: {reason}")]
    MalformedName { offset: u64, reason: String },

    /// No entry carries the root record identifier
    #[error("no root entry with id {root_id} in dump")]
    MissingRoot { root_id: u64 },

    /// Record ids are not strictly ascending
    #[error("records not sorted by id: record #{index} has id {current} after id {previous}")]
    UnsortedInput {
        index: usize,
        previous: u64,
        current: u64,
    },

    /// Date format string chrono cannot render
    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    /// FILETIME value does not fit in the calendar range
    #[error("timestamp out of range: {0} ticks")]
    TimestampOutOfRange(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    /// True for errors caused by the dump contents rather than the environment
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            ParseError::Io(_) | ParseError::Json(_) | ParseError::InvalidDateFormat(_)
        )
    }
}
