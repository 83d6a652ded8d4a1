//! Event log error types
//!
//! Every log error is FATAL: a log that cannot be read completely and
//! consistently aborts extraction, so no partial dataset is ever produced.
//!
//! Error codes:
//! - TC_LOG_UNREADABLE
//! - TC_LOG_MALFORMED
//! - TC_LOG_MISSING_COLUMN
//! - TC_LOG_BAD_TIMESTAMP
//! - TC_LOG_EMPTY
//! - TC_LOG_UNSUPPORTED_FORMAT

use std::fmt;
use std::io;

/// Severity levels for log errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Extraction must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Log error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorCode {
    /// File could not be opened or read
    Unreadable,
    /// Content is not valid JSON / CSV
    Malformed,
    /// A required column (case id, activity, timestamp) is absent
    MissingColumn,
    /// A timestamp could not be parsed
    BadTimestamp,
    /// The log contains no events
    Empty,
    /// File extension does not name a supported format
    UnsupportedFormat,
}

impl LogErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            LogErrorCode::Unreadable => "TC_LOG_UNREADABLE",
            LogErrorCode::Malformed => "TC_LOG_MALFORMED",
            LogErrorCode::MissingColumn => "TC_LOG_MISSING_COLUMN",
            LogErrorCode::BadTimestamp => "TC_LOG_BAD_TIMESTAMP",
            LogErrorCode::Empty => "TC_LOG_EMPTY",
            LogErrorCode::UnsupportedFormat => "TC_LOG_UNSUPPORTED_FORMAT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for LogErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Event log error with context
#[derive(Debug)]
pub struct LogError {
    code: LogErrorCode,
    message: String,
    /// 1-based record number in the source, when known
    record: Option<usize>,
    source: Option<io::Error>,
}

impl LogError {
    fn new(code: LogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            record: None,
            source: None,
        }
    }

    /// File could not be read
    pub fn unreadable(path: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(
                LogErrorCode::Unreadable,
                format!("Failed to read event log '{}'", path.into()),
            )
        }
    }

    /// Content could not be parsed
    pub fn malformed(record: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            record,
            ..Self::new(LogErrorCode::Malformed, reason)
        }
    }

    /// Required column absent or empty in a record
    pub fn missing_column(record: usize, column: &str) -> Self {
        Self {
            record: Some(record),
            ..Self::new(
                LogErrorCode::MissingColumn,
                format!("Required column '{}' is missing", column),
            )
        }
    }

    /// Timestamp could not be parsed
    pub fn bad_timestamp(record: usize, raw: &str) -> Self {
        Self {
            record: Some(record),
            ..Self::new(
                LogErrorCode::BadTimestamp,
                format!("Unparseable timestamp '{}'", raw),
            )
        }
    }

    /// No events in the log
    pub fn empty() -> Self {
        Self::new(LogErrorCode::Empty, "Event log contains no events")
    }

    /// Unknown file format
    pub fn unsupported_format(path: impl Into<String>) -> Self {
        Self::new(
            LogErrorCode::UnsupportedFormat,
            format!(
                "Cannot infer log format of '{}' (expected .csv, .json, .jsonl or .ndjson)",
                path.into()
            ),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> LogErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending record number if known
    pub fn record(&self) -> Option<usize> {
        self.record
    }

    /// Log errors always abort extraction
    pub fn is_fatal(&self) -> bool {
        self.code.severity() == Severity::Fatal
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        if let Some(record) = self.record {
            write!(f, " (record {})", record)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for event log operations
pub type LogResult<T> = Result<T, LogError>;
